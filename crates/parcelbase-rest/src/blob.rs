//! REST object storage client.

use std::time::Duration;

use async_trait::async_trait;

use parcelbase_core::{CoreError, Result};
use parcelbase_storage::{BlobStore, StoredObject};

use crate::{auth_headers, transport_error};

/// [`BlobStore`] over the backend's object storage API.
///
/// All objects live in one application-owned bucket.
pub struct RestBlobStore {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
}

impl RestBlobStore {
    /// Build a storage client for the project at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` when the key is not header-safe or the
    /// client cannot be constructed.
    pub fn new(
        base_url: &str,
        api_key: &str,
        bucket: &str,
        request_timeout: Duration,
    ) -> Result<Self> {
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
            bucket: bucket.to_string(),
        })
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{path}", self.base_url, self.bucket)
    }
}

async fn check_status(response: reqwest::Response, path: &str) -> Result<reqwest::Response> {
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
        404 => CoreError::not_found("objects", path),
        _ => CoreError::storage(format!("{status}: {body}")),
    })
}

#[async_trait]
impl BlobStore for RestBlobStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject> {
        let size = bytes.len() as u64;
        tracing::debug!(path, size, content_type, "uploading object");
        let response = self
            .client
            .post(self.object_url(path))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        check_status(response, path).await?;
        Ok(StoredObject {
            path: path.to_string(),
            size,
        })
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(self.object_url(path))
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        let response = check_status(response, path).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CoreError::storage(format!("truncated response body: {e}")))?;
        Ok(bytes.to_vec())
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{path}",
            self.base_url, self.bucket
        )
    }
}
