//! Generic data-store trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::query::{Filter, SelectQuery};
use parcelbase_core::Result;

/// The backend's structured-query primitive.
///
/// Rows are untyped JSON objects; the backend owns the schema. All methods
/// are fallible with the shared [`parcelbase_core::CoreError`] taxonomy so
/// callers can tell transient failures from permission or not-found outcomes.
///
/// Implementations must be cheap to share behind an `Arc` and safe to call
/// concurrently.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Fetch every row matching `query`.
    ///
    /// An empty result is `Ok(vec![])`, not an error.
    ///
    /// # Errors
    ///
    /// Returns `Timeout`/`Network` for transport failures, `PermissionDenied`
    /// when the backend rejects the read, `Storage` otherwise.
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Value>>;

    /// Fetch exactly one row matching `query`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no row matches, in addition to the transport
    /// errors of [`select`](Self::select).
    async fn select_one(&self, query: &SelectQuery) -> Result<Value>;

    /// Insert `row` into `table`, returning the stored representation
    /// (with backend-assigned fields such as ids and timestamps filled in).
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` when the backend rejects the write,
    /// `Storage` for constraint violations, transport errors otherwise.
    async fn insert(&self, table: &str, row: Value) -> Result<Value>;

    /// Apply `changes` (a partial row) to every row matching `filters`.
    ///
    /// Returns the updated rows.
    ///
    /// # Errors
    ///
    /// Same as [`insert`](Self::insert).
    async fn update(&self, table: &str, filters: &[Filter], changes: Value) -> Result<Vec<Value>>;

    /// Delete every row matching `filters`, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Same as [`insert`](Self::insert).
    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64>;
}
