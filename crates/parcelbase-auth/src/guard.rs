//! Role-gated route protection.
//!
//! Every protected page evaluates its [`RouteGuard`] against the current
//! [`SessionSnapshot`], and re-evaluates on every session change. The guard
//! is pure: it decides, the page layer navigates.

use parcelbase_core::Role;
use tokio::sync::watch;

use crate::session::SessionSnapshot;

/// Outcome of a guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session still settling: render a pending indicator, navigate nowhere.
    Pending,
    /// Leave the page for `target` (login or unauthorized destination).
    Redirect(String),
    /// Render the protected content.
    Allow,
}

/// Access requirements of one route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    /// Roles allowed in; empty means any authenticated, active profile.
    required_roles: Vec<Role>,
    login_redirect: String,
    unauthorized_redirect: String,
}

impl RouteGuard {
    /// Guard requiring any signed-in, active profile.
    #[must_use]
    pub fn new() -> Self {
        Self {
            required_roles: Vec::new(),
            login_redirect: "/login".to_string(),
            unauthorized_redirect: "/unauthorized".to_string(),
        }
    }

    /// Guard requiring one of `roles`.
    #[must_use]
    pub fn with_roles(roles: impl Into<Vec<Role>>) -> Self {
        Self {
            required_roles: roles.into(),
            ..Self::new()
        }
    }

    /// Override the login destination.
    #[must_use]
    pub fn redirect_to(mut self, target: impl Into<String>) -> Self {
        self.login_redirect = target.into();
        self
    }

    /// Evaluate against `snapshot`.
    ///
    /// Ordering matters and matches the session invariants:
    ///
    /// 1. `Loading` — no decision is final yet, so no redirect either.
    /// 2. No identity — the user must sign in.
    /// 3. Identity without profile — still settling, hold.
    /// 4. Inactive profile — unauthorized.
    /// 5. Role not included — unauthorized.
    /// 6. Otherwise — allow.
    #[must_use]
    pub fn evaluate(&self, snapshot: &SessionSnapshot) -> GuardDecision {
        if snapshot.is_loading() {
            return GuardDecision::Pending;
        }

        if snapshot.identity.is_none() {
            return GuardDecision::Redirect(self.login_redirect.clone());
        }

        let Some(profile) = &snapshot.profile else {
            return GuardDecision::Pending;
        };

        if !profile.is_active {
            return GuardDecision::Redirect(self.unauthorized_redirect.clone());
        }

        if !self.required_roles.is_empty() && !profile.has_role(&self.required_roles) {
            return GuardDecision::Redirect(self.unauthorized_redirect.clone());
        }

        GuardDecision::Allow
    }

    /// Watch `receiver` until the session settles, returning the first
    /// non-pending decision.
    ///
    /// This is the "redirect exactly once" path: while the session is
    /// `Loading` nothing happens, and the first settled snapshot produces
    /// the single navigation the page acts on.
    pub async fn resolve(
        &self,
        receiver: &mut watch::Receiver<SessionSnapshot>,
    ) -> GuardDecision {
        loop {
            let decision = self.evaluate(&receiver.borrow_and_update().clone());
            if decision != GuardDecision::Pending {
                return decision;
            }
            if receiver.changed().await.is_err() {
                // Session manager gone; treat as signed out.
                return GuardDecision::Redirect(self.login_redirect.clone());
            }
        }
    }
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SessionManager, SessionOptions};
    use parcelbase_core::{Identity, Profile};
    use parcelbase_db_memory::{MemoryAuthService, MemoryStore};
    use std::sync::Arc;

    fn snapshot(
        loading: bool,
        identity: Option<Identity>,
        profile: Option<Profile>,
    ) -> SessionSnapshot {
        let mut snapshot = SessionSnapshot {
            phase: crate::session::SessionPhase::Ready,
            identity,
            profile,
        };
        if loading {
            snapshot.phase = crate::session::SessionPhase::Loading;
        }
        snapshot
    }

    fn active_profile(role: Role) -> Profile {
        let identity = Identity::with_email("user-1", "tanaka@example.com");
        let mut profile = Profile::fallback_for(&identity, role);
        profile.full_name = Some("Tanaka Hanako".to_string());
        profile
    }

    #[test]
    fn test_loading_never_redirects() {
        let guard = RouteGuard::with_roles([Role::Admin]);
        // Even with identity absent, no redirect while loading.
        assert_eq!(guard.evaluate(&snapshot(true, None, None)), GuardDecision::Pending);
    }

    #[test]
    fn test_no_identity_redirects_to_login() {
        let guard = RouteGuard::new();
        assert_eq!(
            guard.evaluate(&snapshot(false, None, None)),
            GuardDecision::Redirect("/login".to_string())
        );
    }

    #[test]
    fn test_custom_login_redirect() {
        let guard = RouteGuard::new().redirect_to("/signin");
        assert_eq!(
            guard.evaluate(&snapshot(false, None, None)),
            GuardDecision::Redirect("/signin".to_string())
        );
    }

    #[test]
    fn test_identity_without_profile_holds() {
        let guard = RouteGuard::new();
        let identity = Identity::with_email("user-1", "tanaka@example.com");
        assert_eq!(
            guard.evaluate(&snapshot(false, Some(identity), None)),
            GuardDecision::Pending
        );
    }

    #[test]
    fn test_inactive_profile_is_unauthorized() {
        let guard = RouteGuard::new();
        let identity = Identity::with_email("user-1", "tanaka@example.com");
        let mut profile = active_profile(Role::Admin);
        profile.is_active = false;
        assert_eq!(
            guard.evaluate(&snapshot(false, Some(identity), Some(profile))),
            GuardDecision::Redirect("/unauthorized".to_string())
        );
    }

    #[test]
    fn test_role_mismatch_is_unauthorized() {
        let guard = RouteGuard::with_roles([Role::Admin]);
        let identity = Identity::with_email("user-1", "tanaka@example.com");
        let profile = active_profile(Role::Viewer);
        assert_eq!(
            guard.evaluate(&snapshot(false, Some(identity), Some(profile))),
            GuardDecision::Redirect("/unauthorized".to_string())
        );
    }

    #[test]
    fn test_matching_role_is_allowed() {
        let guard = RouteGuard::with_roles([Role::Admin, Role::Editor]);
        let identity = Identity::with_email("user-1", "tanaka@example.com");
        let profile = active_profile(Role::Editor);
        assert_eq!(
            guard.evaluate(&snapshot(false, Some(identity), Some(profile))),
            GuardDecision::Allow
        );
    }

    #[test]
    fn test_empty_roles_allow_any_active_profile() {
        let guard = RouteGuard::new();
        let identity = Identity::with_email("user-1", "tanaka@example.com");
        let profile = active_profile(Role::Viewer);
        assert_eq!(
            guard.evaluate(&snapshot(false, Some(identity), Some(profile))),
            GuardDecision::Allow
        );
    }

    #[tokio::test]
    async fn test_resolve_waits_through_loading_then_redirects_once() {
        let auth = Arc::new(MemoryAuthService::new());
        let store = Arc::new(MemoryStore::new());
        let manager = SessionManager::start(auth, store, SessionOptions::default());

        let guard = RouteGuard::new();
        let mut receiver = manager.subscribe();
        // No session exists: the first settled decision is the login redirect.
        let decision = guard.resolve(&mut receiver).await;
        assert_eq!(decision, GuardDecision::Redirect("/login".to_string()));
    }

    #[tokio::test]
    async fn test_resolve_allows_signed_in_admin() {
        let auth = Arc::new(MemoryAuthService::new());
        let store = Arc::new(MemoryStore::new());
        auth.seed_session(Identity::with_email("user-1", "admin@example.com"))
            .await;
        store
            .seed(
                "profiles",
                vec![serde_json::json!({
                    "id": "user-1",
                    "email": "admin@example.com",
                    "role": "admin",
                    "is_active": true,
                    "created_at": "2025-06-01T09:00:00Z",
                    "updated_at": "2025-06-01T09:00:00Z",
                })],
            )
            .await;
        let manager = SessionManager::start(auth, store, SessionOptions::default());

        let guard = RouteGuard::with_roles([Role::Admin]);
        let mut receiver = manager.subscribe();
        assert_eq!(guard.resolve(&mut receiver).await, GuardDecision::Allow);
    }
}
