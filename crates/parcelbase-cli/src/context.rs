//! Wiring: configuration → backend → services.

use std::sync::Arc;

use anyhow::Context as _;

use parcelbase_cache::{CacheStore, FetchPolicy};
use parcelbase_config::AppConfig;
use parcelbase_db_memory::{MemoryAuthService, MemoryBlobStore, MemoryStore};
use parcelbase_rest::{RestBlobStore, RestStore};
use parcelbase_service::{
    AuditLogService, ConnectionService, DocumentService, PackageService, ServiceOptions,
    SettingsService, UserService,
};
use parcelbase_storage::{AuthService, BlobStore, DataStore};

/// Name of the application-owned storage bucket.
const BUCKET: &str = "file";

/// Everything a command needs, built once at startup.
pub struct AppContext {
    pub packages: PackageService,
    pub users: UserService,
    pub documents: DocumentService,
    pub audit: AuditLogService,
    pub connection: ConnectionService,
    pub settings: SettingsService,
    /// Present only in demo mode; drives the demo session.
    pub auth: Option<Arc<MemoryAuthService>>,
    pub store: Arc<dyn DataStore>,
}

impl AppContext {
    /// Build against the configured backend, or seeded in-memory data when
    /// demo mode is active.
    pub async fn build(config: &AppConfig, demo: bool) -> anyhow::Result<Self> {
        let demo = demo || config.backend.demo_mode;
        let (store, blobs, auth): (Arc<dyn DataStore>, Arc<dyn BlobStore>, _) = if demo {
            tracing::info!("demo mode: using seeded in-memory backend");
            let store = Arc::new(MemoryStore::new());
            crate::demo::seed(&store).await;
            let auth = Arc::new(MemoryAuthService::new());
            (store, Arc::new(MemoryBlobStore::new()), Some(auth))
        } else {
            anyhow::ensure!(
                config.backend.is_configured(),
                "backend url and api key are not configured; set [backend] in the config file, \
                 PARCELBASE_BACKEND__URL / PARCELBASE_BACKEND__API_KEY, or pass --demo"
            );
            let store = RestStore::new(
                &config.backend.url,
                &config.backend.api_key,
                config.fetch.request_timeout,
            )
            .context("building REST data client")?;
            let blobs = RestBlobStore::new(
                &config.backend.url,
                &config.backend.api_key,
                BUCKET,
                config.fetch.request_timeout,
            )
            .context("building REST storage client")?;
            (Arc::new(store), Arc::new(blobs), None)
        };

        let options = service_options(config);
        let cache = Arc::new(CacheStore::new());
        Ok(Self {
            packages: PackageService::new(store.clone(), cache.clone(), options),
            users: UserService::new(store.clone(), cache.clone(), options),
            documents: DocumentService::new(store.clone(), blobs, cache.clone(), options),
            audit: AuditLogService::new(store.clone(), options),
            connection: ConnectionService::new(store.clone(), cache.clone(), options),
            settings: SettingsService::new(store.clone(), cache, options),
            auth,
            store,
        })
    }
}

fn service_options(config: &AppConfig) -> ServiceOptions {
    let fetch = FetchPolicy {
        timeout: config.fetch.timeout,
        retries: config.fetch.retries,
        base_delay: config.fetch.base_delay,
    };
    ServiceOptions {
        fetch,
        list_fetch: fetch.with_retries(config.fetch.list_retries),
        packages_ttl: config.cache.packages_ttl,
        default_ttl: config.cache.default_ttl,
        connection_check_timeout: config.fetch.connection_check_timeout,
    }
}

/// The demo auth service as the trait object the session manager expects.
pub fn demo_auth(auth: &Arc<MemoryAuthService>) -> Arc<dyn AuthService> {
    auth.clone()
}
