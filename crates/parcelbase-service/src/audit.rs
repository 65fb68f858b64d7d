//! Audit trail reads.
//!
//! The audit trail is written server-side by the backend on every mutation;
//! this service only reads it. Not cached: staff open the audit page to see
//! the freshest state.

use std::sync::Arc;

use parcelbase_core::{AuditLog, AuditOperation, Result};
use parcelbase_storage::{DataStore, Filter, OrderBy, SelectQuery};

use crate::ServiceOptions;

/// Audit page row cap.
const MAX_AUDIT_ROWS: usize = 100;

/// Filter set of the audit log page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditLogFilters {
    /// Restrict to one table.
    pub table_name: Option<String>,
    /// Restrict to one operation kind.
    pub operation: Option<AuditOperation>,
    /// Substring match over the acting user id or the table name.
    pub search: Option<String>,
}

/// Reads over the backend-maintained audit trail.
pub struct AuditLogService {
    store: Arc<dyn DataStore>,
    options: ServiceOptions,
}

impl AuditLogService {
    #[must_use]
    pub fn new(store: Arc<dyn DataStore>, options: ServiceOptions) -> Self {
        Self { store, options }
    }

    /// Matching audit entries, newest first, capped at 100.
    ///
    /// The `search` filter matches either the acting user or the table name,
    /// so it is applied after the fetch; the store's filter model is
    /// conjunctive only.
    pub async fn list(&self, filters: &AuditLogFilters) -> Result<Vec<AuditLog>> {
        let entries = self
            .options
            .fetch
            .run("audit log fetch timed out", || self.fetch_list(filters))
            .await?;
        Ok(entries)
    }

    async fn fetch_list(&self, filters: &AuditLogFilters) -> Result<Vec<AuditLog>> {
        let mut query = SelectQuery::table("audit_logs")
            .order(OrderBy::desc("created_at"))
            .limit(MAX_AUDIT_ROWS);
        if let Some(table_name) = &filters.table_name {
            query = query.filter(Filter::eq("table_name", table_name.clone()));
        }
        if let Some(operation) = filters.operation {
            query = query.filter(Filter::eq("operation", operation.to_string()));
        }

        let rows = self.store.select(&query).await?;
        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(serde_json::from_value::<AuditLog>(row)?);
        }

        if let Some(search) = &filters.search {
            let needle = search.to_lowercase();
            entries.retain(|entry| {
                entry.user_id.to_lowercase().contains(&needle)
                    || entry.table_name.to_lowercase().contains(&needle)
            });
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcelbase_db_memory::MemoryStore;
    use serde_json::json;
    use uuid::Uuid;

    fn audit_row(table: &str, operation: &str, user: &str, created_at: &str) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "table_name": table,
            "operation": operation,
            "old_data": null,
            "new_data": {"status": "arrived"},
            "user_id": user,
            "created_at": created_at,
        })
    }

    async fn seeded_service() -> AuditLogService {
        let store = Arc::new(MemoryStore::new());
        store
            .seed(
                "audit_logs",
                vec![
                    audit_row("packages", "update", "user-1", "2025-06-02T09:00:00Z"),
                    audit_row("packages", "insert", "user-2", "2025-06-03T09:00:00Z"),
                    audit_row("profiles", "update", "user-1", "2025-06-01T09:00:00Z"),
                ],
            )
            .await;
        AuditLogService::new(store as Arc<dyn DataStore>, ServiceOptions::default())
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let service = seeded_service().await;
        let entries = service.list(&AuditLogFilters::default()).await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].user_id, "user-2");
        assert_eq!(entries[2].table_name, "profiles");
    }

    #[tokio::test]
    async fn test_table_and_operation_filters() {
        let service = seeded_service().await;
        let entries = service
            .list(&AuditLogFilters {
                table_name: Some("packages".to_string()),
                operation: Some(AuditOperation::Update),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].user_id, "user-1");
    }

    #[tokio::test]
    async fn test_search_matches_user_or_table() {
        let service = seeded_service().await;

        let by_user = service
            .list(&AuditLogFilters {
                search: Some("user-1".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_user.len(), 2);

        let by_table = service
            .list(&AuditLogFilters {
                search: Some("profile".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_table.len(), 1);
    }
}
