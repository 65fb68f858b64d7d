//! Backend connectivity probe.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use parcelbase_cache::{CacheStore, with_timeout};
use parcelbase_storage::{DataStore, SelectQuery};

use crate::ServiceOptions;
use crate::keys::CONNECTION_KEY;

/// How long a probe result stays trustworthy. Short: connectivity is the one
/// thing that changes out from under the user.
const CONNECTION_TTL: Duration = Duration::from_secs(30);

/// Cheap health probe used by the dashboard banner.
pub struct ConnectionService {
    store: Arc<dyn DataStore>,
    cache: Arc<CacheStore>,
    options: ServiceOptions,
}

impl ConnectionService {
    #[must_use]
    pub fn new(
        store: Arc<dyn DataStore>,
        cache: Arc<CacheStore>,
        options: ServiceOptions,
    ) -> Self {
        Self {
            store,
            cache,
            options,
        }
    }

    /// Whether the backend answers a trivial read within the probe deadline.
    ///
    /// Never errors: any failure just reads as "offline". The result is
    /// cached briefly so a dashboard full of widgets issues one probe, not
    /// one per widget.
    pub async fn check(&self) -> bool {
        if let Some(Value::Bool(reachable)) = self.cache.get(CONNECTION_KEY).await {
            return reachable;
        }

        let query = SelectQuery::table("packages").limit(1);
        let result = with_timeout(
            self.store.select(&query),
            self.options.connection_check_timeout,
            "connection check timed out",
        )
        .await;

        let reachable = match result {
            Ok(_) => true,
            Err(error) => {
                tracing::warn!(error = %error, "connection check failed");
                false
            }
        };
        self.cache
            .put(CONNECTION_KEY, Value::Bool(reachable), CONNECTION_TTL)
            .await;
        reachable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcelbase_core::CoreError;
    use parcelbase_db_memory::MemoryStore;

    fn service(store: &Arc<MemoryStore>) -> ConnectionService {
        ConnectionService::new(
            store.clone() as Arc<dyn DataStore>,
            Arc::new(CacheStore::new()),
            ServiceOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_check_succeeds_on_reachable_store() {
        let store = Arc::new(MemoryStore::new());
        assert!(service(&store).check().await);
    }

    #[tokio::test]
    async fn test_check_reports_failure_as_offline() {
        let store = Arc::new(MemoryStore::new());
        store.fail_next(CoreError::network("unreachable")).await;
        assert!(!service(&store).check().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_times_out_as_offline() {
        let store = Arc::new(MemoryStore::new());
        store.set_latency(Some(Duration::from_secs(30))).await;
        assert!(!service(&store).check().await);
    }

    #[tokio::test]
    async fn test_check_result_is_cached() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);

        assert!(service.check().await);
        let calls = store.select_calls();
        assert!(service.check().await);
        // Second probe served from cache.
        assert_eq!(store.select_calls(), calls);
    }
}
