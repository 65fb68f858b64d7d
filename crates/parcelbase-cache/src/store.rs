//! In-memory TTL cache with point and pattern invalidation.

use std::collections::HashMap;
use std::time::Duration;

use regex::Regex;
use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use parcelbase_core::Result;

/// One cached payload.
///
/// An entry is valid iff `now - stored_at <= ttl`; expired entries are
/// indistinguishable from absent ones to readers and are removed lazily on
/// the next read that finds them stale.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    stored_at: OffsetDateTime,
    ttl: time::Duration,
}

impl CacheEntry {
    fn is_fresh(&self, now: OffsetDateTime) -> bool {
        now - self.stored_at <= self.ttl
    }
}

/// Process-wide cache for backend query results, keyed by query shape.
///
/// The store is the sole owner of all entries. Constructed once and shared
/// via `Arc`; the async lock covers the reimplementation-with-threads case
/// where readers and writers race.
#[derive(Debug, Default)]
pub struct CacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl CacheStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached value for `key` if present and fresh.
    ///
    /// A stale entry is removed and reported as absent.
    pub async fn get(&self, key: &str) -> Option<Value> {
        let now = OffsetDateTime::now_utc();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.is_fresh(now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // Entry was stale under the read lock; re-check under the write lock
        // in case a concurrent put refreshed it.
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(key) {
            if entry.is_fresh(OffsetDateTime::now_utc()) {
                return Some(entry.value.clone());
            }
            entries.remove(key);
        }
        None
    }

    /// Store `value` under `key`, overwriting any previous entry.
    pub async fn put(&self, key: &str, value: Value, ttl: Duration) {
        let entry = CacheEntry {
            value,
            stored_at: OffsetDateTime::now_utc(),
            ttl: time::Duration::try_from(ttl).unwrap_or(time::Duration::MAX),
        };
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), entry);
    }

    /// Remove the entry for `key`, returning whether one was present.
    pub async fn invalidate(&self, key: &str) -> bool {
        let mut entries = self.entries.write().await;
        let removed = entries.remove(key).is_some();
        if removed {
            tracing::debug!(key, "cache entry invalidated");
        }
        removed
    }

    /// Remove every entry whose key matches `pattern` (a regex), returning
    /// how many were removed.
    ///
    /// Used to cover all list/filter variants of an entity with one call,
    /// e.g. `^packages:` after a package write.
    ///
    /// # Errors
    ///
    /// Returns an error if `pattern` is not a valid regex.
    pub async fn invalidate_pattern(&self, pattern: &str) -> Result<usize> {
        let regex = Regex::new(pattern)?;
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !regex.is_match(key));
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(pattern, removed, "cache entries invalidated by pattern");
        }
        Ok(removed)
    }

    /// Drop every entry. For catastrophic/cross-cutting changes such as a
    /// settings import.
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        let dropped = entries.len();
        entries.clear();
        tracing::debug!(dropped, "cache cleared");
    }

    /// Number of entries currently held, fresh or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Snapshot of cache size for logging.
    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.read().await;
        let now = OffsetDateTime::now_utc();
        let fresh = entries.values().filter(|e| e.is_fresh(now)).count();
        CacheStats {
            entries: entries.len(),
            fresh,
        }
    }

    /// Age the entry for `key` by `by`, as if it had been stored that long
    /// ago. Lets tests cross TTL boundaries without sleeping.
    #[cfg(test)]
    pub(crate) async fn backdate(&self, key: &str, by: time::Duration) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(key) {
            entry.stored_at -= by;
        }
    }
}

/// Cache size snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Total entries held.
    pub entries: usize,
    /// Entries that would still be served.
    pub fresh: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MINUTE: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_get_returns_fresh_entry() {
        let cache = CacheStore::new();
        cache.put("packages:{}", json!([{"id": "a"}]), 3 * MINUTE).await;

        let value = cache.get("packages:{}").await.unwrap();
        assert_eq!(value, json!([{"id": "a"}]));
    }

    #[tokio::test]
    async fn test_get_unknown_key_is_none() {
        let cache = CacheStore::new();
        assert!(cache.get("packages:{}").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent_and_removed() {
        let cache = CacheStore::new();
        cache.put("packages:{}", json!([]), 3 * MINUTE).await;
        cache.backdate("packages:{}", time::Duration::minutes(4)).await;

        assert!(cache.get("packages:{}").await.is_none());
        // Lazy removal happened.
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_entry_at_exact_ttl_boundary_is_fresh() {
        // Validity is `now - stored_at <= ttl`, inclusive.
        let entry = CacheEntry {
            value: json!(1),
            stored_at: OffsetDateTime::now_utc(),
            ttl: time::Duration::ZERO,
        };
        assert!(entry.is_fresh(entry.stored_at));
        assert!(!entry.is_fresh(entry.stored_at + time::Duration::seconds(1)));
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let cache = CacheStore::new();
        cache.put("users", json!(["old"]), MINUTE).await;
        cache.put("users", json!(["new"]), MINUTE).await;

        assert_eq!(cache.get("users").await.unwrap(), json!(["new"]));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_invalidate_point_key() {
        let cache = CacheStore::new();
        cache.put("package:abc", json!({}), MINUTE).await;

        assert!(cache.invalidate("package:abc").await);
        assert!(!cache.invalidate("package:abc").await);
        assert!(cache.get("package:abc").await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_after_expiry_still_forces_refetch() {
        // Invalidation is effective regardless of prior TTL state.
        let cache = CacheStore::new();
        cache.put("users", json!([]), MINUTE).await;
        cache.invalidate("users").await;
        assert!(cache.get("users").await.is_none());
    }

    #[tokio::test]
    async fn test_pattern_invalidation_scope() {
        let cache = CacheStore::new();
        cache.put("packages:{}", json!([]), MINUTE).await;
        cache.put(r#"packages:{"status":"arrived"}"#, json!([]), MINUTE).await;
        cache.put("package:abc", json!({}), MINUTE).await;
        cache.put("users", json!([]), MINUTE).await;

        let removed = cache.invalidate_pattern("^packages:").await.unwrap();
        assert_eq!(removed, 2);

        // Every `packages:` list key is gone and nothing else.
        assert!(cache.get("packages:{}").await.is_none());
        assert!(cache.get(r#"packages:{"status":"arrived"}"#).await.is_none());
        assert!(cache.get("package:abc").await.is_some());
        assert!(cache.get("users").await.is_some());
    }

    #[tokio::test]
    async fn test_pattern_invalidation_rejects_bad_regex() {
        let cache = CacheStore::new();
        assert!(cache.invalidate_pattern("[").await.is_err());
    }

    #[tokio::test]
    async fn test_clear_drops_everything() {
        let cache = CacheStore::new();
        cache.put("packages:{}", json!([]), MINUTE).await;
        cache.put("users", json!([]), MINUTE).await;

        cache.clear().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_stats_counts_fresh_separately() {
        let cache = CacheStore::new();
        cache.put("a", json!(1), MINUTE).await;
        cache.put("b", json!(2), MINUTE).await;
        cache.backdate("b", time::Duration::minutes(2)).await;

        let stats = cache.stats().await;
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.fresh, 1);
    }
}
