//! # parcelbase-service
//!
//! Domain data services consumed by the page layer. Each service composes
//! the shared [`CacheStore`](parcelbase_cache::CacheStore) and the backend
//! [`DataStore`](parcelbase_storage::DataStore) under the application-wide
//! composition order — caching wraps retry wraps timeout — and fires the
//! explicit cache invalidation rules after every successful mutation.

pub mod audit;
pub mod connection;
pub mod documents;
pub mod keys;
pub mod packages;
pub mod settings;
pub mod users;

pub use audit::{AuditLogFilters, AuditLogService};
pub use connection::ConnectionService;
pub use documents::DocumentService;
pub use keys::{Invalidations, PackageFilters};
pub use packages::{NewPackage, PackageChanges, PackageService, ProcessingChanges};
pub use settings::SettingsService;
pub use users::UserService;

use std::time::Duration;

use parcelbase_cache::FetchPolicy;

/// Shared fetch/caching knobs handed to every service, normally derived from
/// `parcelbase-config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceOptions {
    /// Policy for single-entity fetches and mutations.
    pub fetch: FetchPolicy,
    /// Policy for list views (retries harder; they are the landing pages).
    pub list_fetch: FetchPolicy,
    /// TTL for package list entries.
    pub packages_ttl: Duration,
    /// TTL for everything else that is cached.
    pub default_ttl: Duration,
    /// Deadline for the connection health probe.
    pub connection_check_timeout: Duration,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        let fetch = FetchPolicy::default();
        Self {
            fetch,
            list_fetch: fetch.with_retries(3),
            packages_ttl: Duration::from_secs(3 * 60),
            default_ttl: Duration::from_secs(5 * 60),
            connection_check_timeout: Duration::from_secs(5),
        }
    }
}
