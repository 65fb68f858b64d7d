//! # parcelbase-cache
//!
//! Client-side resilience for backend reads: a TTL read-through cache plus
//! timeout and retry combinators.
//!
//! Every data fetch in the application composes the three layers the same
//! way — caching wraps retry wraps timeout — so a cache hit skips the network
//! entirely and retries only apply to genuinely failed attempts:
//!
//! ```ignore
//! let packages: Vec<Value> = with_cache(&cache, &key, ttl, || {
//!     with_retry(|| with_timeout(store.select(&query), timeout, "package fetch timed out"),
//!                retries, base_delay)
//! })
//! .await?;
//! ```
//!
//! The cache never invalidates itself on writes; mutations call the explicit
//! invalidation API (point key or pattern) before the UI trusts subsequent
//! reads.

pub mod fetch;
pub mod store;

pub use fetch::{FetchPolicy, with_cache, with_retry, with_timeout};
pub use store::{CacheStats, CacheStore};
