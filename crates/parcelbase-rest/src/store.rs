//! REST data API client.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use parcelbase_core::{CoreError, Result};
use parcelbase_storage::{DataStore, Filter, SelectQuery};

use crate::{auth_headers, transport_error};

/// Single-object response mode of the REST API.
const OBJECT_ACCEPT: &str = "application/vnd.pgrst.object+json";

/// [`DataStore`] over the backend's REST data API.
pub struct RestStore {
    client: reqwest::Client,
    /// Base URL without trailing slash, e.g. `https://project.backend.example.com`.
    base_url: String,
}

impl RestStore {
    /// Build a client for the project at `base_url` authenticating with
    /// `api_key`. `request_timeout` caps every HTTP request outright,
    /// independent of the per-fetch deadlines layered above.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` when the key is not header-safe or the
    /// client cannot be constructed.
    pub fn new(base_url: &str, api_key: &str, request_timeout: Duration) -> Result<Self> {
        url::Url::parse(base_url)
            .map_err(|e| CoreError::configuration(format!("invalid backend url: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .default_headers(auth_headers(api_key)?)
            .build()
            .map_err(|e| CoreError::configuration(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    async fn read_rows(&self, request: reqwest::RequestBuilder, table: &str) -> Result<Vec<Value>> {
        let response = request.send().await.map_err(|e| transport_error(&e))?;
        let response = check_status(response, table).await?;
        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| CoreError::storage(format!("malformed response body: {e}")))
    }
}

/// Translate a query into the API's parameter syntax.
fn query_params(query: &SelectQuery) -> Vec<(String, String)> {
    let mut params = filter_params(&query.filters);
    if let Some(order) = &query.order {
        let direction = if order.ascending { "asc" } else { "desc" };
        params.push(("order".to_string(), format!("{}.{direction}", order.field)));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|filter| match filter {
            Filter::Eq { field, value } => (field.clone(), format!("eq.{}", scalar(value))),
            Filter::Like { field, pattern } => (field.clone(), format!("ilike.*{pattern}*")),
            Filter::In { field, values } => {
                let list = values.iter().map(scalar).collect::<Vec<_>>().join(",");
                (field.clone(), format!("in.({list})"))
            }
            Filter::IsNull { field } => (field.clone(), "is.null".to_string()),
        })
        .collect()
}

/// Render a JSON scalar the way the API expects it in a filter value.
fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

async fn check_status(response: reqwest::Response, entity: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(match status.as_u16() {
        401 | 403 => CoreError::permission_denied(if body.is_empty() {
            status.to_string()
        } else {
            body
        }),
        404 | 406 => CoreError::not_found(entity, "requested row"),
        _ => CoreError::storage(format!("{status}: {body}")),
    })
}

#[async_trait]
impl DataStore for RestStore {
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Value>> {
        tracing::debug!(table = %query.table, filters = query.filters.len(), "select");
        let request = self
            .client
            .get(self.table_url(&query.table))
            .query(&query_params(query));
        self.read_rows(request, &query.table).await
    }

    async fn select_one(&self, query: &SelectQuery) -> Result<Value> {
        let request = self
            .client
            .get(self.table_url(&query.table))
            .query(&query_params(query))
            .header(reqwest::header::ACCEPT, OBJECT_ACCEPT);
        let response = request.send().await.map_err(|e| transport_error(&e))?;
        let response = check_status(response, &query.table).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| CoreError::storage(format!("malformed response body: {e}")))
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value> {
        let request = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .header(reqwest::header::ACCEPT, OBJECT_ACCEPT)
            .json(&row);
        let response = request.send().await.map_err(|e| transport_error(&e))?;
        let response = check_status(response, table).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| CoreError::storage(format!("malformed response body: {e}")))
    }

    async fn update(&self, table: &str, filters: &[Filter], changes: Value) -> Result<Vec<Value>> {
        let request = self
            .client
            .patch(self.table_url(table))
            .query(&filter_params(filters))
            .header("Prefer", "return=representation")
            .json(&changes);
        self.read_rows(request, table).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64> {
        let request = self
            .client
            .delete(self.table_url(table))
            .query(&filter_params(filters))
            .header("Prefer", "return=representation");
        let removed = self.read_rows(request, table).await?;
        Ok(removed.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcelbase_storage::OrderBy;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn store_for(server: &MockServer) -> RestStore {
        RestStore::new(&server.uri(), "test-key", Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_select_translates_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/packages"))
            .and(query_param("status", "eq.arrived"))
            .and(query_param("order", "created_at.desc"))
            .and(query_param("limit", "50"))
            .and(header("apikey", "test-key"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "a"}])))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        let query = SelectQuery::table("packages")
            .filter(Filter::eq("status", "arrived"))
            .order(OrderBy::desc("created_at"))
            .limit(50);
        let rows = store.select(&query).await.unwrap();
        assert_eq!(rows, vec![json!({"id": "a"})]);
    }

    #[tokio::test]
    async fn test_like_and_in_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/packages"))
            .and(query_param("tracking_number", "ilike.*JP1*"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/package_processing"))
            .and(query_param("package_id", "in.(a,b)"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        store
            .select(&SelectQuery::table("packages").filter(Filter::like("tracking_number", "JP1")))
            .await
            .unwrap();
        store
            .select(&SelectQuery::table("package_processing").filter(Filter::is_in(
                "package_id",
                vec![json!("a"), json!("b")],
            )))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_permission_denied_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/packages"))
            .respond_with(ResponseTemplate::new(403).set_body_string("row level security"))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        let err = store
            .select(&SelectQuery::table("packages"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::PermissionDenied { .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_select_one_not_found_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .respond_with(ResponseTemplate::new(406).set_body_string("PGRST116"))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        let err = store
            .select_one(&SelectQuery::table("profiles").filter(Filter::eq("id", "missing")))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_server_error_is_storage() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/packages"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        let err = store
            .select(&SelectQuery::table("packages"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Storage { .. }));
    }

    #[tokio::test]
    async fn test_client_timeout_maps_to_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/packages"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let store = RestStore::new(&server.uri(), "test-key", Duration::from_millis(50)).unwrap();
        let err = store
            .select(&SelectQuery::table("packages"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Timeout { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_insert_returns_representation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/packages"))
            .and(header("prefer", "return=representation"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"id": "new", "status": "shipped"})),
            )
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        let stored = store
            .insert("packages", json!({"tracking_number": "JP1"}))
            .await
            .unwrap();
        assert_eq!(stored["id"], "new");
    }

    #[tokio::test]
    async fn test_update_and_delete_use_filter_params() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/packages"))
            .and(query_param("id", "eq.abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "abc"}])))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/packages"))
            .and(query_param("id", "eq.abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "abc"}])))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        let updated = store
            .update(
                "packages",
                &[Filter::eq("id", "abc")],
                json!({"status": "arrived"}),
            )
            .await
            .unwrap();
        assert_eq!(updated.len(), 1);

        let removed = store
            .delete("packages", &[Filter::eq("id", "abc")])
            .await
            .unwrap();
        assert_eq!(removed, 1);
    }
}
