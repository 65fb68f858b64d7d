//! Package fetch and mutation service.
//!
//! Reads follow the application-wide composition: cache wraps retry wraps
//! timeout. Mutations run under a bare timeout — a retried insert could
//! double-create — and fire the invalidation rules on success.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use time::Date;
use uuid::Uuid;

use parcelbase_cache::{CacheStore, with_cache, with_timeout};
use parcelbase_core::{
    ConfirmationStatus, CoreError, Package, PackageProcessing, PackageStatus,
    PackageWithProcessing, Priority, Result, SenderType,
};
use parcelbase_storage::{DataStore, Filter, OrderBy, SelectQuery};

use crate::keys::{self, Invalidations, PackageFilters};
use crate::ServiceOptions;

/// List views cap their row count; deeper history goes through search.
const MAX_LIST_ROWS: usize = 50;

/// Input shape for creating a package.
#[derive(Debug, Clone, Serialize)]
pub struct NewPackage {
    pub tracking_number: String,
    pub sender_type: SenderType,
    pub shipping_date: Date,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_arrival_date: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub priority_level: Priority,
    pub status: PackageStatus,
    pub created_by: String,
}

impl NewPackage {
    /// Minimal draft: medium priority, just shipped.
    #[must_use]
    pub fn new(
        tracking_number: impl Into<String>,
        sender_type: SenderType,
        shipping_date: Date,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            tracking_number: tracking_number.into(),
            sender_type,
            shipping_date,
            expected_arrival_date: None,
            description: None,
            notes: None,
            priority_level: Priority::Medium,
            status: PackageStatus::Shipped,
            created_by: created_by.into(),
        }
    }

    fn into_row(self) -> Result<Value> {
        let mut row = serde_json::to_value(&self)?;
        // The creator is also the initial editor.
        row["updated_by"] = row["created_by"].clone();
        Ok(row)
    }
}

/// Partial update of a package. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PackageChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PackageStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_level: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_arrival_date: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

/// Partial update of a processing record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessingChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number_confirmation: Option<ConfirmationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation_confirmation: Option<ConfirmationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Date>,
}

/// Fetches and mutations over packages and their processing records.
pub struct PackageService {
    store: Arc<dyn DataStore>,
    cache: Arc<CacheStore>,
    invalidations: Invalidations,
    options: ServiceOptions,
}

impl PackageService {
    #[must_use]
    pub fn new(store: Arc<dyn DataStore>, cache: Arc<CacheStore>, options: ServiceOptions) -> Self {
        let invalidations = Invalidations::new(cache.clone());
        Self {
            store,
            cache,
            invalidations,
            options,
        }
    }

    /// Package list for one filter set: newest first, joined with processing
    /// records, capped at 50 rows, cached per filter set.
    pub async fn list(&self, filters: &PackageFilters) -> Result<Vec<PackageWithProcessing>> {
        let key = keys::packages(filters);
        with_cache(&self.cache, &key, self.options.packages_ttl, || {
            self.options
                .list_fetch
                .run("package list fetch timed out", || self.fetch_list(filters))
        })
        .await
    }

    /// One package with its processing record. Not cached: detail pages are
    /// edit surfaces and must read their own writes.
    pub async fn get(&self, id: &Uuid) -> Result<PackageWithProcessing> {
        self.options
            .fetch
            .run("package detail fetch timed out", || self.fetch_one(id))
            .await
    }

    /// Record a new package.
    pub async fn create(&self, new_package: NewPackage) -> Result<Package> {
        let row = new_package.into_row()?;
        let stored = with_timeout(
            self.store.insert("packages", row),
            self.options.fetch.timeout,
            "package create timed out",
        )
        .await?;
        let package: Package = serde_json::from_value(stored)?;

        self.invalidations.packages().await;
        tracing::info!(package_id = %package.id, tracking_number = %package.tracking_number, "package created");
        Ok(package)
    }

    /// Apply `changes` to the package `id`.
    pub async fn update(&self, id: &Uuid, changes: PackageChanges) -> Result<Package> {
        let changes = serde_json::to_value(&changes)?;
        let updated = with_timeout(
            self.store
                .update("packages", &[Filter::eq("id", id.to_string())], changes),
            self.options.fetch.timeout,
            "package update timed out",
        )
        .await?;
        let row = updated
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::not_found("packages", id.to_string()))?;
        let package: Package = serde_json::from_value(row)?;

        self.invalidations.package(id).await;
        tracing::info!(package_id = %id, "package updated");
        Ok(package)
    }

    /// Advance the shipping status of package `id`.
    pub async fn update_status(
        &self,
        id: &Uuid,
        status: PackageStatus,
        updated_by: impl Into<String>,
    ) -> Result<Package> {
        self.update(
            id,
            PackageChanges {
                status: Some(status),
                updated_by: Some(updated_by.into()),
                ..Default::default()
            },
        )
        .await
    }

    /// Remove the package `id` and its processing record.
    pub async fn delete(&self, id: &Uuid) -> Result<()> {
        let id_filter = [Filter::eq("package_id", id.to_string())];
        with_timeout(
            self.store.delete("package_processing", &id_filter),
            self.options.fetch.timeout,
            "package delete timed out",
        )
        .await?;

        let removed = with_timeout(
            self.store
                .delete("packages", &[Filter::eq("id", id.to_string())]),
            self.options.fetch.timeout,
            "package delete timed out",
        )
        .await?;
        if removed == 0 {
            return Err(CoreError::not_found("packages", id.to_string()));
        }

        self.invalidations.package(id).await;
        tracing::info!(package_id = %id, "package deleted");
        Ok(())
    }

    /// Create or update the processing record of `package_id`.
    pub async fn upsert_processing(
        &self,
        package_id: &Uuid,
        changes: ProcessingChanges,
    ) -> Result<PackageProcessing> {
        let changes_row = serde_json::to_value(&changes)?;
        let updated = with_timeout(
            self.store.update(
                "package_processing",
                &[Filter::eq("package_id", package_id.to_string())],
                changes_row.clone(),
            ),
            self.options.fetch.timeout,
            "processing update timed out",
        )
        .await?;

        let row = match updated.into_iter().next() {
            Some(row) => row,
            None => {
                let mut insert_row = changes_row;
                insert_row["package_id"] = Value::String(package_id.to_string());
                with_timeout(
                    self.store.insert("package_processing", insert_row),
                    self.options.fetch.timeout,
                    "processing update timed out",
                )
                .await?
            }
        };
        let processing: PackageProcessing = serde_json::from_value(row)?;

        // List views render processing columns, so they are stale too.
        self.invalidations.package(package_id).await;
        Ok(processing)
    }

    async fn fetch_list(&self, filters: &PackageFilters) -> Result<Vec<PackageWithProcessing>> {
        let mut query = SelectQuery::table("packages")
            .order(OrderBy::desc("created_at"))
            .limit(MAX_LIST_ROWS);
        for filter in filters.to_query_filters() {
            query = query.filter(filter);
        }

        let rows = self.store.select(&query).await?;
        let mut packages = Vec::with_capacity(rows.len());
        for row in rows {
            packages.push(serde_json::from_value::<Package>(row)?);
        }
        if packages.is_empty() {
            return Ok(Vec::new());
        }

        let mut processing = self.fetch_processing_for(&packages).await?;
        Ok(packages
            .into_iter()
            .map(|package| {
                let package_processing = processing.remove(&package.id);
                PackageWithProcessing {
                    package,
                    package_processing,
                }
            })
            .collect())
    }

    async fn fetch_one(&self, id: &Uuid) -> Result<PackageWithProcessing> {
        let query = SelectQuery::table("packages").filter(Filter::eq("id", id.to_string()));
        let row = self.store.select_one(&query).await?;
        let package: Package = serde_json::from_value(row)?;

        let mut processing = self.fetch_processing_for(std::slice::from_ref(&package)).await?;
        let package_processing = processing.remove(&package.id);
        Ok(PackageWithProcessing {
            package,
            package_processing,
        })
    }

    async fn fetch_processing_for(
        &self,
        packages: &[Package],
    ) -> Result<HashMap<Uuid, PackageProcessing>> {
        let ids: Vec<Value> = packages
            .iter()
            .map(|p| Value::String(p.id.to_string()))
            .collect();
        let rows = self
            .store
            .select(&SelectQuery::table("package_processing").filter(Filter::is_in("package_id", ids)))
            .await?;

        let mut by_package = HashMap::with_capacity(rows.len());
        for row in rows {
            let record: PackageProcessing = serde_json::from_value(row)?;
            by_package.insert(record.package_id, record);
        }
        Ok(by_package)
    }
}
