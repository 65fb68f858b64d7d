//! Staff management service.

use std::sync::Arc;

use serde_json::json;

use parcelbase_cache::{CacheStore, with_cache, with_timeout};
use parcelbase_core::{CoreError, Profile, Result, Role};
use parcelbase_storage::{DataStore, Filter, OrderBy, SelectQuery};

use crate::ServiceOptions;
use crate::keys::{Invalidations, USERS_KEY};

/// Fetches and mutations over staff profiles.
pub struct UserService {
    store: Arc<dyn DataStore>,
    cache: Arc<CacheStore>,
    invalidations: Invalidations,
    options: ServiceOptions,
}

impl UserService {
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

    /// All staff profiles, newest first. Cached under a single key: the
    /// user admin page has no filter variants.
    pub async fn list(&self) -> Result<Vec<Profile>> {
        with_cache(&self.cache, USERS_KEY, self.options.default_ttl, || {
            self.options
                .fetch
                .run("user list fetch timed out", || self.fetch_all())
        })
        .await
    }

    /// Change a user's role.
    pub async fn set_role(&self, user_id: &str, role: Role) -> Result<Profile> {
        self.update_profile(user_id, json!({ "role": role })).await
    }

    /// Activate or deactivate an account. Deactivated users keep their row
    /// but fail the authorization gate.
    pub async fn set_active(&self, user_id: &str, active: bool) -> Result<Profile> {
        self.update_profile(user_id, json!({ "is_active": active }))
            .await
    }

    async fn fetch_all(&self) -> Result<Vec<Profile>> {
        let query = SelectQuery::table("profiles").order(OrderBy::desc("created_at"));
        let rows = self.store.select(&query).await?;
        let mut profiles = Vec::with_capacity(rows.len());
        for row in rows {
            profiles.push(serde_json::from_value::<Profile>(row)?);
        }
        Ok(profiles)
    }

    async fn update_profile(&self, user_id: &str, changes: serde_json::Value) -> Result<Profile> {
        let updated = with_timeout(
            self.store
                .update("profiles", &[Filter::eq("id", user_id)], changes),
            self.options.fetch.timeout,
            "user update timed out",
        )
        .await?;
        let row = updated
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::not_found("profiles", user_id))?;
        let profile: Profile = serde_json::from_value(row)?;

        self.invalidations.users().await;
        tracing::info!(user_id, role = %profile.role, active = profile.is_active, "profile updated");
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcelbase_db_memory::MemoryStore;

    fn profile_row(id: &str, role: &str, created_at: &str) -> serde_json::Value {
        json!({
            "id": id,
            "email": format!("{id}@example.com"),
            "role": role,
            "is_active": true,
            "created_at": created_at,
            "updated_at": created_at,
        })
    }

    fn service(store: &Arc<MemoryStore>) -> (UserService, Arc<CacheStore>) {
        let cache = Arc::new(CacheStore::new());
        let service = UserService::new(
            store.clone() as Arc<dyn DataStore>,
            cache.clone(),
            ServiceOptions::default(),
        );
        (service, cache)
    }

    #[tokio::test]
    async fn test_list_is_cached() {
        let store = Arc::new(MemoryStore::new());
        store
            .seed(
                "profiles",
                vec![
                    profile_row("user-1", "admin", "2025-06-01T09:00:00Z"),
                    profile_row("user-2", "viewer", "2025-06-02T09:00:00Z"),
                ],
            )
            .await;
        let (service, _cache) = service(&store);

        let users = service.list().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].id, "user-2");

        let calls = store.select_calls();
        service.list().await.unwrap();
        assert_eq!(store.select_calls(), calls);
    }

    #[tokio::test]
    async fn test_set_role_invalidates_user_cache() {
        let store = Arc::new(MemoryStore::new());
        store
            .seed(
                "profiles",
                vec![profile_row("user-1", "viewer", "2025-06-01T09:00:00Z")],
            )
            .await;
        let (service, _cache) = service(&store);

        // Warm the cache, mutate, and observe the refreshed read.
        assert_eq!(service.list().await.unwrap()[0].role, Role::Viewer);
        let updated = service.set_role("user-1", Role::Editor).await.unwrap();
        assert_eq!(updated.role, Role::Editor);
        assert_eq!(service.list().await.unwrap()[0].role, Role::Editor);
    }

    #[tokio::test]
    async fn test_set_active_unknown_user_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let (service, _cache) = service(&store);

        let err = service.set_active("ghost", false).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }
}
