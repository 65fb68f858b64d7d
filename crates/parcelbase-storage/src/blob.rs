//! Blob-storage trait for document files.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use parcelbase_core::Result;

/// Descriptor returned by a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    /// Storage path the object was written to.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
}

/// File storage surface of the external backend.
///
/// Paths are forward-slash separated, scoped to a single bucket owned by the
/// application (e.g. `packages/<package_id>/<timestamp>_<name>`).
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` at `path`.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` when the backend rejects the write,
    /// transport errors otherwise.
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str)
    -> Result<StoredObject>;

    /// Fetch the bytes stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no object exists at `path`.
    async fn download(&self, path: &str) -> Result<Vec<u8>>;

    /// Public URL for the object at `path`.
    ///
    /// Purely syntactic; does not check that the object exists.
    fn public_url(&self, path: &str) -> String;
}
