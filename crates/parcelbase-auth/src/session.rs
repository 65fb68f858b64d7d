//! Session state machine.
//!
//! States: `Loading` (initial probe in flight) → `Ready` without identity
//! (signed out) ⇄ `Ready` with identity and profile (signed in). The
//! application never renders an authorization decision while `Loading`.
//!
//! All transitions — the initial probe and every auth-service event — are
//! applied from a single spawned task, so no two transitions ever race.
//! Consumers hold a watch receiver and re-evaluate on every change; a
//! consumer that goes away just drops its receiver.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::{RwLock, broadcast, watch};

use parcelbase_core::{Identity, Profile, Result, Role};
use parcelbase_storage::{AuthEvent, AuthService, DataStore, Filter, SelectQuery};

/// Whether the initial session probe has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    Ready,
}

/// Point-in-time view of the session.
///
/// Invariant: once `Ready`, an absent identity implies an absent profile.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub identity: Option<Identity>,
    pub profile: Option<Profile>,
}

impl SessionSnapshot {
    fn loading() -> Self {
        Self {
            phase: SessionPhase::Loading,
            identity: None,
            profile: None,
        }
    }

    fn signed_out() -> Self {
        Self {
            phase: SessionPhase::Ready,
            identity: None,
            profile: None,
        }
    }

    fn signed_in(identity: Identity, profile: Profile) -> Self {
        Self {
            phase: SessionPhase::Ready,
            identity: Some(identity),
            profile: Some(profile),
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.phase == SessionPhase::Loading
    }

    /// Role check: true iff a profile is present and its role is one of
    /// `roles`. An absent profile always yields false.
    #[must_use]
    pub fn has_role(&self, roles: &[Role]) -> bool {
        self.profile
            .as_ref()
            .is_some_and(|profile| profile.has_role(roles))
    }
}

/// Tunables for the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Deadline for one profile lookup. Kept short so a broken backend
    /// cannot stall sign-in.
    pub profile_timeout: Duration,

    /// Role granted when the profile cannot be resolved.
    pub fallback_role: Role,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            profile_timeout: Duration::from_millis(1500),
            fallback_role: Role::fallback(),
        }
    }
}

/// Identity used by [`SessionManager::demo_login`].
const DEMO_USER_ID: &str = "demo-user-id";
const DEMO_USER_EMAIL: &str = "demo@example.com";

/// Process-wide session/authorization state.
///
/// Constructed once per application load with [`start`](Self::start) and
/// shared via `Arc`. Holds the current snapshot in a watch channel and a
/// per-identity profile cache that lives as long as the manager.
pub struct SessionManager {
    auth: Arc<dyn AuthService>,
    store: Arc<dyn DataStore>,
    options: SessionOptions,
    state: watch::Sender<SessionSnapshot>,
    /// Successful profile lookups, keyed by identity id. Never expires;
    /// one lookup per identity per manager lifetime.
    profile_cache: RwLock<HashMap<String, Profile>>,
}

impl SessionManager {
    /// Create the manager and start its driver task.
    ///
    /// The task registers for auth events first, then runs the initial
    /// session probe, then applies events as they arrive — strictly in
    /// order. State is `Loading` until the probe resolves.
    pub fn start(
        auth: Arc<dyn AuthService>,
        store: Arc<dyn DataStore>,
        options: SessionOptions,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(SessionSnapshot::loading());
        let manager = Arc::new(Self {
            auth: auth.clone(),
            store,
            options,
            state,
            profile_cache: RwLock::new(HashMap::new()),
        });

        // Subscribe before probing so events fired mid-probe are not lost.
        let events = auth.subscribe();
        let weak = Arc::downgrade(&manager);
        tokio::spawn(async move {
            if let Some(manager) = weak.upgrade() {
                manager.run_initial_probe().await;
            }
            Self::run_event_loop(weak, events).await;
        });

        manager
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Observe session changes. Every transition is visible to every
    /// receiver; dropping the receiver stops observation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Role check against the current snapshot.
    #[must_use]
    pub fn has_role(&self, roles: &[Role]) -> bool {
        self.snapshot().has_role(roles)
    }

    /// Wait until the initial probe has completed, returning the first
    /// `Ready` snapshot.
    pub async fn wait_until_ready(&self) -> SessionSnapshot {
        let mut receiver = self.subscribe();
        loop {
            let snapshot = receiver.borrow_and_update().clone();
            if !snapshot.is_loading() {
                return snapshot;
            }
            if receiver.changed().await.is_err() {
                return snapshot;
            }
        }
    }

    /// Sign in with credentials. State updates arrive through the auth
    /// service's `SignedIn` event.
    ///
    /// # Errors
    ///
    /// Propagates the auth service's error (`PermissionDenied` for bad
    /// credentials) for the page to render.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<()> {
        self.auth.sign_in_with_password(email, password).await?;
        Ok(())
    }

    /// End the session: notify the auth service, then reset to signed-out
    /// immediately (the `SignedOut` event confirms it, idempotently).
    ///
    /// # Errors
    ///
    /// Returns transport errors from the auth service; local state is reset
    /// only on success.
    pub async fn sign_out(&self) -> Result<()> {
        self.auth.sign_out().await?;
        self.set_state(SessionSnapshot::signed_out());
        Ok(())
    }

    /// Offline bypass: populate a synthetic admin session without contacting
    /// the auth service. Only for demo environments where the backend is
    /// unreachable or unconfigured.
    pub fn demo_login(&self) {
        let identity = Identity::with_email(DEMO_USER_ID, DEMO_USER_EMAIL);
        let now = OffsetDateTime::now_utc();
        let profile = Profile {
            id: DEMO_USER_ID.to_string(),
            email: DEMO_USER_EMAIL.to_string(),
            full_name: Some("Demo User".to_string()),
            role: Role::Admin,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tracing::info!("demo login activated");
        self.set_state(SessionSnapshot::signed_in(identity, profile));
    }

    async fn run_initial_probe(&self) {
        match self.auth.current_identity().await {
            Ok(Some(identity)) => {
                tracing::debug!(user_id = %identity.id, "existing session found");
                let profile = self.resolve_profile(&identity).await;
                self.set_state(SessionSnapshot::signed_in(identity, profile));
            }
            Ok(None) => {
                tracing::debug!("no existing session");
                self.set_state(SessionSnapshot::signed_out());
            }
            Err(error) => {
                // The probe failing must not wedge the app in Loading.
                tracing::error!(error = %error, "session probe failed");
                self.set_state(SessionSnapshot::signed_out());
            }
        }
    }

    async fn run_event_loop(
        weak: std::sync::Weak<Self>,
        mut events: broadcast::Receiver<AuthEvent>,
    ) {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let Some(manager) = weak.upgrade() else { break };
                    manager.apply_event(event).await;
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "auth event stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    async fn apply_event(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(identity) | AuthEvent::TokenRefreshed(identity) => {
                let profile = self.resolve_profile(&identity).await;
                self.set_state(SessionSnapshot::signed_in(identity, profile));
            }
            AuthEvent::SignedOut => {
                self.set_state(SessionSnapshot::signed_out());
            }
        }
    }

    /// Resolve the profile for `identity`, never failing.
    ///
    /// Order: per-identity cache, then a deadline-bounded lookup of the
    /// active profile row, then the fallback profile. Only successful
    /// lookups are cached, so a backend that recovers is picked up on the
    /// next session event.
    async fn resolve_profile(&self, identity: &Identity) -> Profile {
        if let Some(profile) = self.profile_cache.read().await.get(&identity.id) {
            return profile.clone();
        }

        let lookup = self.fetch_profile(&identity.id);
        match tokio::time::timeout(self.options.profile_timeout, lookup).await {
            Ok(Ok(profile)) => {
                let mut cache = self.profile_cache.write().await;
                cache.insert(identity.id.clone(), profile.clone());
                profile
            }
            Ok(Err(error)) => {
                tracing::warn!(
                    user_id = %identity.id,
                    error = %error,
                    fallback_role = %self.options.fallback_role,
                    "profile lookup failed, using fallback profile"
                );
                Profile::fallback_for(identity, self.options.fallback_role)
            }
            Err(_) => {
                tracing::warn!(
                    user_id = %identity.id,
                    fallback_role = %self.options.fallback_role,
                    "profile lookup timed out, using fallback profile"
                );
                Profile::fallback_for(identity, self.options.fallback_role)
            }
        }
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<Profile> {
        let query = SelectQuery::table("profiles")
            .filter(Filter::eq("id", user_id))
            .filter(Filter::eq("is_active", true));
        let row = self.store.select_one(&query).await?;
        Ok(serde_json::from_value(row)?)
    }

    fn set_state(&self, snapshot: SessionSnapshot) {
        // Notify on every transition, not just value changes: consumers
        // re-evaluate their guard per event, and an event that resolves to
        // the same snapshot still completed a transition.
        self.state.send_replace(snapshot);
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}
