//! End-to-end behavior of the cached package fetch path against the
//! in-memory backend.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use parcelbase_cache::CacheStore;
use parcelbase_db_memory::MemoryStore;
use parcelbase_service::{Invalidations, NewPackage, PackageFilters, PackageService, ServiceOptions};
use parcelbase_storage::DataStore;
use parcelbase_core::SenderType;
use time::macros::date;

fn package_row(id: &Uuid, tracking: &str, created_at: &str) -> serde_json::Value {
    json!({
        "id": id,
        "tracking_number": tracking,
        "sender_type": "china_factory",
        "shipping_date": "2025-06-01",
        "priority_level": "medium",
        "status": "shipped",
        "created_at": created_at,
        "updated_at": created_at,
        "created_by": "user-1",
        "updated_by": "user-1",
    })
}

#[tokio::test]
async fn cached_list_refetches_only_after_invalidation() {
    let store = Arc::new(MemoryStore::new());
    store
        .seed(
            "packages",
            vec![package_row(&Uuid::new_v4(), "JP1", "2025-06-01T09:00:00Z")],
        )
        .await;
    let cache = Arc::new(CacheStore::new());
    let service = PackageService::new(
        store.clone() as Arc<dyn DataStore>,
        cache.clone(),
        ServiceOptions::default(),
    );

    // First call: cache miss, the store is hit.
    let first = service.list(&PackageFilters::default()).await.unwrap();
    assert_eq!(first.len(), 1);
    let calls_after_first = store.select_calls();
    assert!(calls_after_first > 0);

    // Second call within the TTL: served from cache, identical value.
    let second = service.list(&PackageFilters::default()).await.unwrap();
    assert_eq!(store.select_calls(), calls_after_first);
    assert_eq!(second[0].package.id, first[0].package.id);
    assert_eq!(second[0].package.tracking_number, "JP1");

    // Explicit invalidation: the next call goes back to the store.
    Invalidations::new(cache.clone()).packages().await;
    let third = service.list(&PackageFilters::default()).await.unwrap();
    assert!(store.select_calls() > calls_after_first);
    assert_eq!(third.len(), 1);
}

#[tokio::test]
async fn mutation_makes_next_read_fresh() {
    let store = Arc::new(MemoryStore::new());
    let cache = Arc::new(CacheStore::new());
    let service = PackageService::new(
        store.clone() as Arc<dyn DataStore>,
        cache.clone(),
        ServiceOptions::default(),
    );

    // Warm the (empty) list entry.
    assert!(service.list(&PackageFilters::default()).await.unwrap().is_empty());

    // A create fires the invalidation rules before returning, so the very
    // next read observes the new row without waiting out the TTL.
    service
        .create(NewPackage::new(
            "JP900",
            SenderType::ChinaFactory,
            date!(2025 - 06 - 10),
            "user-1",
        ))
        .await
        .unwrap();

    let listed = service.list(&PackageFilters::default()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].package.tracking_number, "JP900");
}
