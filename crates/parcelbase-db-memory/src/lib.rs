//! # parcelbase-db-memory
//!
//! In-memory implementations of the `parcelbase-storage` traits.
//!
//! Two consumers: the test suites of every other crate, and the demo/offline
//! mode of the CLI (the backend is unreachable or unconfigured, so the
//! application runs against seeded local data instead).
//!
//! [`MemoryStore`] and [`MemoryAuthService`] additionally support failure and
//! latency injection so resilience behavior (retries, timeouts, fallbacks)
//! can be exercised deterministically.

pub mod auth;
pub mod blob;
pub mod store;

pub use auth::MemoryAuthService;
pub use blob::MemoryBlobStore;
pub use store::MemoryStore;
