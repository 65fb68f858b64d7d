//! Document upload/listing service.
//!
//! Upload is a two-step write: bytes to blob storage, then the metadata row.
//! Validation (size, content type) happens before any network call and
//! surfaces as `Validation` errors the page renders inline.

use std::sync::Arc;

use serde_json::json;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use parcelbase_cache::{CacheStore, with_cache, with_timeout};
use parcelbase_core::{CoreError, Document, Result};
use parcelbase_storage::{BlobStore, DataStore, Filter, OrderBy, SelectQuery};

use crate::ServiceOptions;
use crate::keys::{self, Invalidations};

/// Upload size cap: 10 MiB.
const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Content types accepted for upload.
const ALLOWED_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
];

/// Fetches, uploads and deletions of package documents.
pub struct DocumentService {
    store: Arc<dyn DataStore>,
    blobs: Arc<dyn BlobStore>,
    cache: Arc<CacheStore>,
    invalidations: Invalidations,
    options: ServiceOptions,
}

impl DocumentService {
    #[must_use]
    pub fn new(
        store: Arc<dyn DataStore>,
        blobs: Arc<dyn BlobStore>,
        cache: Arc<CacheStore>,
        options: ServiceOptions,
    ) -> Self {
        let invalidations = Invalidations::new(cache.clone());
        Self {
            store,
            blobs,
            cache,
            invalidations,
            options,
        }
    }

    /// Documents of one package, newest first, cached per package.
    pub async fn list_for_package(&self, package_id: &Uuid) -> Result<Vec<Document>> {
        let key = keys::documents(package_id);
        with_cache(&self.cache, &key, self.options.default_ttl, || {
            self.options
                .fetch
                .run("document list fetch timed out", || self.fetch_list(package_id))
        })
        .await
    }

    /// Upload a file and record its metadata.
    ///
    /// `package_id` may be absent for files uploaded before the package row
    /// exists; the row is linked later.
    pub async fn upload(
        &self,
        package_id: Option<&Uuid>,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
        uploaded_by: &str,
    ) -> Result<Document> {
        validate_upload(file_name, &bytes, content_type)?;

        let path = object_path(package_id, file_name);
        let stored = with_timeout(
            self.blobs.upload(&path, bytes, content_type),
            self.options.fetch.timeout,
            "file upload timed out",
        )
        .await?;

        let row = json!({
            "package_id": package_id.map(Uuid::to_string),
            "file_name": file_name,
            "file_path": stored.path,
            "file_type": content_type,
            "file_size": stored.size,
            "document_type": "other",
            "uploaded_by": uploaded_by,
            "uploaded_at": OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
        });
        let inserted = with_timeout(
            self.store.insert("documents", row),
            self.options.fetch.timeout,
            "document record creation timed out",
        )
        .await?;
        let document: Document = serde_json::from_value(inserted)?;

        if let Some(package_id) = package_id {
            self.invalidations.documents(package_id).await;
        }
        tracing::info!(
            document_id = %document.id,
            file_name,
            size = document.file_size,
            "document uploaded"
        );
        Ok(document)
    }

    /// Fetch the stored bytes of `document`.
    pub async fn download(&self, document: &Document) -> Result<Vec<u8>> {
        with_timeout(
            self.blobs.download(&document.file_path),
            self.options.fetch.timeout,
            "file download timed out",
        )
        .await
    }

    /// Remove the metadata row of document `id`.
    ///
    /// The blob itself is retained; storage cleanup is a backend-side
    /// lifecycle rule.
    pub async fn delete(&self, id: &Uuid) -> Result<()> {
        let query = SelectQuery::table("documents").filter(Filter::eq("id", id.to_string()));
        let row = with_timeout(
            self.store.select_one(&query),
            self.options.fetch.timeout,
            "document delete timed out",
        )
        .await?;
        let document: Document = serde_json::from_value(row)?;

        with_timeout(
            self.store
                .delete("documents", &[Filter::eq("id", id.to_string())]),
            self.options.fetch.timeout,
            "document delete timed out",
        )
        .await?;

        if let Some(package_id) = &document.package_id {
            self.invalidations.documents(package_id).await;
        }
        tracing::info!(document_id = %id, "document deleted");
        Ok(())
    }

    /// Public URL of `document`'s file.
    #[must_use]
    pub fn public_url(&self, document: &Document) -> String {
        self.blobs.public_url(&document.file_path)
    }

    async fn fetch_list(&self, package_id: &Uuid) -> Result<Vec<Document>> {
        let query = SelectQuery::table("documents")
            .filter(Filter::eq("package_id", package_id.to_string()))
            .order(OrderBy::desc("uploaded_at"));
        let rows = self.store.select(&query).await?;
        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            documents.push(serde_json::from_value::<Document>(row)?);
        }
        Ok(documents)
    }
}

fn validate_upload(file_name: &str, bytes: &[u8], content_type: &str) -> Result<()> {
    if file_name.is_empty() {
        return Err(CoreError::validation("file name must not be empty"));
    }
    if bytes.is_empty() {
        return Err(CoreError::validation("file is empty"));
    }
    if bytes.len() > MAX_FILE_SIZE {
        return Err(CoreError::validation(format!(
            "file exceeds the {} MiB limit",
            MAX_FILE_SIZE / (1024 * 1024)
        )));
    }
    if !ALLOWED_TYPES.contains(&content_type) {
        return Err(CoreError::validation(format!(
            "unsupported file type: {content_type}"
        )));
    }
    Ok(())
}

/// Storage path: `packages/<package-id-or-unassigned>/<timestamp>_<name>`.
///
/// The timestamp prefix keeps repeated uploads of the same file name from
/// colliding.
fn object_path(package_id: Option<&Uuid>, file_name: &str) -> String {
    let scope = package_id
        .map(Uuid::to_string)
        .unwrap_or_else(|| "unassigned".to_string());
    let timestamp = OffsetDateTime::now_utc().unix_timestamp();
    format!("packages/{scope}/{timestamp}_{file_name}")
}
