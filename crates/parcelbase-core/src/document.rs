//! Document metadata for files attached to packages.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Metadata row for an uploaded file; the bytes live in blob storage under
/// `file_path`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,

    /// Owning package; `None` for files uploaded before the package row exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_id: Option<Uuid>,

    /// Original file name as chosen by the uploader.
    pub file_name: String,

    /// Blob storage path, unique per upload.
    pub file_path: String,

    /// MIME type, e.g. `application/pdf`.
    pub file_type: String,

    pub file_size: u64,

    #[serde(default = "default_document_type")]
    pub document_type: String,

    pub uploaded_by: String,

    #[serde(with = "time::serde::rfc3339")]
    pub uploaded_at: OffsetDateTime,
}

fn default_document_type() -> String {
    "other".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_document_round_trip() {
        let doc = Document {
            id: Uuid::new_v4(),
            package_id: Some(Uuid::new_v4()),
            file_name: "invoice.pdf".to_string(),
            file_path: "packages/abc/1717200000_invoice.pdf".to_string(),
            file_type: "application/pdf".to_string(),
            file_size: 52_431,
            document_type: "other".to_string(),
            uploaded_by: "user-1".to_string(),
            uploaded_at: datetime!(2025-06-01 09:00 UTC),
        };

        let json = serde_json::to_value(&doc).unwrap();
        let back: Document = serde_json::from_value(json).unwrap();
        assert_eq!(back.file_name, "invoice.pdf");
        assert_eq!(back.file_size, 52_431);
    }

    #[test]
    fn test_document_type_defaults() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "file_name": "photo.png",
            "file_path": "packages/abc/photo.png",
            "file_type": "image/png",
            "file_size": 1024,
            "uploaded_by": "user-1",
            "uploaded_at": "2025-06-01T09:00:00Z",
        });
        let doc: Document = serde_json::from_value(json).unwrap();
        assert_eq!(doc.document_type, "other");
        assert!(doc.package_id.is_none());
    }
}
