//! Data export/import for the settings page.
//!
//! Import is the one cross-cutting write in the application: it can touch
//! every package row at once, so it ends with a full cache clear rather than
//! targeted invalidation.

use std::sync::Arc;

use serde_json::{Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use parcelbase_cache::{CacheStore, with_timeout};
use parcelbase_core::{CoreError, Result};
use parcelbase_storage::{DataStore, OrderBy, SelectQuery};

use crate::ServiceOptions;
use crate::keys::Invalidations;

/// Backup/restore of package data.
pub struct SettingsService {
    store: Arc<dyn DataStore>,
    invalidations: Invalidations,
    options: ServiceOptions,
}

impl SettingsService {
    #[must_use]
    pub fn new(store: Arc<dyn DataStore>, cache: Arc<CacheStore>, options: ServiceOptions) -> Self {
        Self {
            store,
            invalidations: Invalidations::new(cache),
            options,
        }
    }

    /// Snapshot of all package data as a single JSON document.
    pub async fn export_all(&self) -> Result<Value> {
        let packages_query = SelectQuery::table("packages").order(OrderBy::asc("created_at"));
        let packages = self
            .options
            .fetch
            .run("data export timed out", || self.store.select(&packages_query))
            .await?;
        let processing_query = SelectQuery::table("package_processing");
        let processing = self
            .options
            .fetch
            .run("data export timed out", || self.store.select(&processing_query))
            .await?;

        Ok(json!({
            "packages": packages,
            "package_processing": processing,
            "exported_at": OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
        }))
    }

    /// Restore rows from an export document, returning how many were
    /// written. Ends with a full cache clear: after a bulk restore nothing
    /// cached can be trusted.
    pub async fn import(&self, data: &Value) -> Result<u64> {
        let packages = data
            .get("packages")
            .and_then(Value::as_array)
            .ok_or_else(|| CoreError::validation("export document has no packages array"))?;
        let processing = data
            .get("package_processing")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut written = 0u64;
        for row in packages {
            with_timeout(
                self.store.insert("packages", row.clone()),
                self.options.fetch.timeout,
                "data import timed out",
            )
            .await?;
            written += 1;
        }
        for row in &processing {
            with_timeout(
                self.store.insert("package_processing", row.clone()),
                self.options.fetch.timeout,
                "data import timed out",
            )
            .await?;
            written += 1;
        }

        self.invalidations.all().await;
        tracing::info!(rows = written, "data import completed");
        Ok(written)
    }
}
