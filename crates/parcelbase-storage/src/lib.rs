//! # parcelbase-storage
//!
//! Interface to the external backend-as-a-service platform.
//!
//! Everything the backend does — persistence, authentication, file storage —
//! is opaque to parcelbase. This crate pins down the three surfaces the rest
//! of the workspace is allowed to touch:
//!
//! - [`DataStore`] — the structured-query primitive (select/insert/update/delete
//!   over named tables, rows as JSON)
//! - [`AuthService`] — session lifecycle plus an event subscription
//! - [`BlobStore`] — file upload/download and public URLs
//!
//! Implementations live elsewhere: `parcelbase-rest` speaks the real HTTP API,
//! `parcelbase-db-memory` backs tests and the demo/offline mode.

pub mod auth;
pub mod blob;
pub mod query;
pub mod store;

pub use auth::{AuthEvent, AuthService};
pub use blob::{BlobStore, StoredObject};
pub use query::{Filter, OrderBy, SelectQuery};
pub use store::DataStore;
