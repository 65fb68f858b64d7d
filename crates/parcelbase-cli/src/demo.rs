//! Seed data for demo/offline mode.

use serde_json::json;
use uuid::Uuid;

use parcelbase_db_memory::MemoryStore;

/// Fill the in-memory store with a small, presentable data set.
pub async fn seed(store: &MemoryStore) {
    let urgent = Uuid::new_v4();
    let routine = Uuid::new_v4();
    let received = Uuid::new_v4();

    store
        .seed(
            "packages",
            vec![
                json!({
                    "id": urgent,
                    "tracking_number": "JP2025060001",
                    "sender_type": "china_factory",
                    "shipping_date": "2025-06-01",
                    "expected_arrival_date": "2025-06-14",
                    "description": "Prototype enclosures",
                    "priority_level": "high",
                    "status": "customs_processing",
                    "created_at": "2025-06-01T09:00:00Z",
                    "updated_at": "2025-06-05T10:30:00Z",
                    "created_by": "demo-user-id",
                    "updated_by": "demo-user-id",
                }),
                json!({
                    "id": routine,
                    "tracking_number": "JP2025060002",
                    "sender_type": "domestic_manufacturer",
                    "shipping_date": "2025-06-03",
                    "description": "Replacement cables",
                    "priority_level": "medium",
                    "status": "in_transit_domestic",
                    "created_at": "2025-06-03T09:00:00Z",
                    "updated_at": "2025-06-04T09:00:00Z",
                    "created_by": "demo-user-id",
                    "updated_by": "demo-user-id",
                }),
                json!({
                    "id": received,
                    "tracking_number": "JP2025050042",
                    "sender_type": "china_factory",
                    "shipping_date": "2025-05-20",
                    "priority_level": "low",
                    "status": "received",
                    "created_at": "2025-05-20T09:00:00Z",
                    "updated_at": "2025-05-28T09:00:00Z",
                    "created_by": "demo-user-id",
                    "updated_by": "demo-user-id",
                }),
            ],
        )
        .await;

    store
        .seed(
            "package_processing",
            vec![json!({
                "id": Uuid::new_v4(),
                "package_id": urgent,
                "tracking_number_confirmation": "in_progress",
                "reservation_confirmation": "not_started",
                "assigned_to": "demo-user-id",
                "due_date": "2025-06-12",
                "created_at": "2025-06-01T09:05:00Z",
                "updated_at": "2025-06-05T10:30:00Z",
            })],
        )
        .await;

    store
        .seed(
            "profiles",
            vec![
                json!({
                    "id": "demo-user-id",
                    "email": "demo@example.com",
                    "full_name": "Demo User",
                    "role": "admin",
                    "is_active": true,
                    "created_at": "2025-01-01T00:00:00Z",
                    "updated_at": "2025-01-01T00:00:00Z",
                }),
                json!({
                    "id": "viewer-user-id",
                    "email": "viewer@example.com",
                    "full_name": "Read Only",
                    "role": "viewer",
                    "is_active": true,
                    "created_at": "2025-02-01T00:00:00Z",
                    "updated_at": "2025-02-01T00:00:00Z",
                }),
            ],
        )
        .await;

    store
        .seed(
            "audit_logs",
            vec![json!({
                "id": Uuid::new_v4(),
                "table_name": "packages",
                "operation": "update",
                "old_data": {"status": "in_transit_international"},
                "new_data": {"status": "customs_processing"},
                "user_id": "demo-user-id",
                "created_at": "2025-06-05T10:30:00Z",
            })],
        )
        .await;
}
