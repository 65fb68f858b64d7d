//! In-memory blob store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use parcelbase_core::{CoreError, Result};
use parcelbase_storage::{BlobStore, StoredObject};

/// In-memory [`BlobStore`] holding object bytes in a map.
#[derive(Debug)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, (Vec<u8>, String)>>,
    base_url: String,
}

impl MemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url("memory://file")
    }

    /// Use `base_url` as the prefix of public URLs.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            base_url: base_url.into(),
        }
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Whether the store holds no objects.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject> {
        let size = bytes.len() as u64;
        let mut objects = self.objects.write().await;
        objects.insert(path.to_string(), (bytes, content_type.to_string()));
        Ok(StoredObject {
            path: path.to_string(),
            size,
        })
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>> {
        let objects = self.objects.read().await;
        objects
            .get(path)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| CoreError::not_found("objects", path))
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_and_download() {
        let blobs = MemoryBlobStore::new();
        let stored = blobs
            .upload("packages/p1/invoice.pdf", b"pdf bytes".to_vec(), "application/pdf")
            .await
            .unwrap();
        assert_eq!(stored.size, 9);

        let bytes = blobs.download("packages/p1/invoice.pdf").await.unwrap();
        assert_eq!(bytes, b"pdf bytes");
    }

    #[tokio::test]
    async fn test_download_missing_is_not_found() {
        let blobs = MemoryBlobStore::new();
        let err = blobs.download("nope").await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_public_url() {
        let blobs = MemoryBlobStore::with_base_url("https://backend.example.com/storage/v1/object/public/file");
        assert_eq!(
            blobs.public_url("packages/p1/photo.png"),
            "https://backend.example.com/storage/v1/object/public/file/packages/p1/photo.png"
        );
    }
}
