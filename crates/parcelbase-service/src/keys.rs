//! Cache-key scheme and invalidation rules.
//!
//! Keys are deterministic serializations of (entity type, filter set):
//!
//! - `packages:{canonical filter JSON}` — one entry per distinct list view
//! - `package:{id}` — package detail
//! - `documents:{package_id}` — documents of one package
//! - `users` — the staff list
//! - `connection_status` — the connectivity probe
//!
//! Invalidation is explicit: a mutation calls the matching [`Invalidations`]
//! method before the UI trusts subsequent reads. A single-entity change
//! always clears the `^packages:` pattern too, because a detail edit can
//! change how the package sorts or filters in any list view.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use parcelbase_cache::CacheStore;
use parcelbase_core::{PackageStatus, Priority, SenderType};
use parcelbase_storage::Filter;

/// Key of the staff list.
pub const USERS_KEY: &str = "users";

/// Key of the connectivity probe result.
pub const CONNECTION_KEY: &str = "connection_status";

/// Pattern covering every package list view.
pub const PACKAGES_PATTERN: &str = "^packages:";

/// Filter set of a package list view.
///
/// Serialization is canonical — field order is fixed and absent filters are
/// omitted — so equal filter sets always produce equal cache keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PackageStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_type: Option<SenderType>,

    /// Substring match on the tracking number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl PackageFilters {
    /// Translate into store-level filters.
    #[must_use]
    pub fn to_query_filters(&self) -> Vec<Filter> {
        let mut filters = Vec::new();
        if let Some(status) = self.status {
            filters.push(Filter::eq("status", status.to_string()));
        }
        if let Some(priority) = self.priority {
            filters.push(Filter::eq("priority_level", priority.to_string()));
        }
        if let Some(sender_type) = self.sender_type {
            filters.push(Filter::eq("sender_type", sender_type.to_string()));
        }
        if let Some(search) = &self.search {
            filters.push(Filter::like("tracking_number", search.clone()));
        }
        filters
    }
}

/// Cache key for a package list view.
#[must_use]
pub fn packages(filters: &PackageFilters) -> String {
    let filters = serde_json::to_string(filters).unwrap_or_else(|_| "{}".to_string());
    format!("packages:{filters}")
}

/// Cache key for one package's detail.
#[must_use]
pub fn package_by_id(id: &Uuid) -> String {
    format!("package:{id}")
}

/// Cache key for one package's documents.
#[must_use]
pub fn documents(package_id: &Uuid) -> String {
    format!("documents:{package_id}")
}

/// The explicit invalidation rules, bound to the shared cache.
///
/// Cheap to clone; services hold their own copy.
#[derive(Clone)]
pub struct Invalidations {
    cache: Arc<CacheStore>,
}

impl Invalidations {
    #[must_use]
    pub fn new(cache: Arc<CacheStore>) -> Self {
        Self { cache }
    }

    /// A package was created or deleted: every list view is stale.
    pub async fn packages(&self) {
        if let Err(error) = self.cache.invalidate_pattern(PACKAGES_PATTERN).await {
            tracing::error!(error = %error, "package list invalidation failed");
        }
    }

    /// One package changed: its detail entry and every list view are stale.
    pub async fn package(&self, id: &Uuid) {
        self.cache.invalidate(&package_by_id(id)).await;
        self.packages().await;
    }

    /// One package's documents changed.
    pub async fn documents(&self, package_id: &Uuid) {
        self.cache.invalidate(&documents(package_id)).await;
    }

    /// The staff list changed.
    pub async fn users(&self) {
        self.cache.invalidate(USERS_KEY).await;
    }

    /// Cross-cutting change (settings import/export): drop everything.
    pub async fn all(&self) {
        self.cache.clear().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_empty_filters_key() {
        assert_eq!(packages(&PackageFilters::default()), "packages:{}");
    }

    #[test]
    fn test_filter_key_is_deterministic() {
        let filters = PackageFilters {
            status: Some(PackageStatus::Arrived),
            priority: Some(Priority::High),
            ..Default::default()
        };
        let key = packages(&filters);
        assert_eq!(key, r#"packages:{"status":"arrived","priority":"high"}"#);
        assert_eq!(key, packages(&filters.clone()));
    }

    #[test]
    fn test_point_keys() {
        let id = Uuid::nil();
        assert_eq!(
            package_by_id(&id),
            "package:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(
            documents(&id),
            "documents:00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_to_query_filters() {
        let filters = PackageFilters {
            status: Some(PackageStatus::Shipped),
            search: Some("JP1".to_string()),
            ..Default::default()
        };
        let query_filters = filters.to_query_filters();
        assert_eq!(query_filters.len(), 2);
        assert_eq!(query_filters[0], Filter::eq("status", "shipped"));
        assert_eq!(query_filters[1], Filter::like("tracking_number", "JP1"));
    }

    #[tokio::test]
    async fn test_package_invalidation_covers_point_and_lists() {
        let cache = Arc::new(CacheStore::new());
        let ttl = Duration::from_secs(60);
        let id = Uuid::new_v4();

        cache.put(&package_by_id(&id), json!({}), ttl).await;
        cache.put("packages:{}", json!([]), ttl).await;
        cache
            .put(r#"packages:{"status":"arrived"}"#, json!([]), ttl)
            .await;
        cache.put(USERS_KEY, json!([]), ttl).await;

        let invalidations = Invalidations::new(cache.clone());
        invalidations.package(&id).await;

        assert!(cache.get(&package_by_id(&id)).await.is_none());
        assert!(cache.get("packages:{}").await.is_none());
        assert!(cache.get(r#"packages:{"status":"arrived"}"#).await.is_none());
        // Unrelated entries survive.
        assert!(cache.get(USERS_KEY).await.is_some());
    }

    #[tokio::test]
    async fn test_documents_invalidation_is_scoped() {
        let cache = Arc::new(CacheStore::new());
        let ttl = Duration::from_secs(60);
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();

        cache.put(&documents(&p1), json!([]), ttl).await;
        cache.put(&documents(&p2), json!([]), ttl).await;

        let invalidations = Invalidations::new(cache.clone());
        invalidations.documents(&p1).await;

        assert!(cache.get(&documents(&p1)).await.is_none());
        assert!(cache.get(&documents(&p2)).await.is_some());
    }

    #[tokio::test]
    async fn test_all_clears_everything() {
        let cache = Arc::new(CacheStore::new());
        cache.put("packages:{}", json!([]), Duration::from_secs(60)).await;
        cache.put(USERS_KEY, json!([]), Duration::from_secs(60)).await;

        Invalidations::new(cache.clone()).all().await;
        assert!(cache.is_empty().await);
    }
}
