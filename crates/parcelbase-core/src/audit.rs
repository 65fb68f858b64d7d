//! Audit log entries recorded by the backend on every table mutation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

/// Mutation kind captured by an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOperation {
    Insert,
    Update,
    Delete,
}

impl std::fmt::Display for AuditOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Insert => write!(f, "insert"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// One row of the backend-maintained audit trail.
///
/// `old_data`/`new_data` are opaque row snapshots; their shape depends on
/// `table_name` and is rendered generically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: Uuid,

    pub table_name: String,

    pub operation: AuditOperation,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_data: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_data: Option<Value>,

    pub user_id: String,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
