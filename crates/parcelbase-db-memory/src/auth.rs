//! In-memory auth service.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock, broadcast};

use parcelbase_core::{CoreError, Identity, Result};
use parcelbase_storage::{AuthEvent, AuthService};

const EVENT_BUFFER_SIZE: usize = 64;

/// In-memory [`AuthService`] with a registered credential set.
///
/// Tests drive session transitions either through the real
/// [`sign_in_with_password`](AuthService::sign_in_with_password) /
/// [`sign_out`](AuthService::sign_out) calls or by emitting raw events with
/// [`emit`](MemoryAuthService::emit) (e.g. a token refresh, which has no
/// client-initiated API).
pub struct MemoryAuthService {
    /// email -> (password, identity)
    users: RwLock<HashMap<String, (String, Identity)>>,
    current: RwLock<Option<Identity>>,
    sender: broadcast::Sender<AuthEvent>,
    /// Errors to return from upcoming probe calls. Test hook.
    queued_failures: Mutex<VecDeque<CoreError>>,
    /// Artificial latency applied to the probe. Test hook.
    probe_latency: RwLock<Option<Duration>>,
}

impl MemoryAuthService {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self {
            users: RwLock::new(HashMap::new()),
            current: RwLock::new(None),
            sender,
            queued_failures: Mutex::new(VecDeque::new()),
            probe_latency: RwLock::new(None),
        }
    }

    /// Register a user that can sign in with `password`.
    pub async fn register_user(&self, identity: Identity, password: &str) {
        let email = identity.email.clone().unwrap_or_default();
        let mut users = self.users.write().await;
        users.insert(email, (password.to_string(), identity));
    }

    /// Seed an already-established session, as if the user signed in during a
    /// previous application run.
    pub async fn seed_session(&self, identity: Identity) {
        *self.current.write().await = Some(identity);
    }

    /// Emit a raw auth event to all subscribers.
    pub fn emit(&self, event: AuthEvent) -> usize {
        self.sender.send(event).unwrap_or_default()
    }

    /// Queue an error to be returned by the next `current_identity` probe.
    pub async fn fail_next_probe(&self, error: CoreError) {
        self.queued_failures.lock().await.push_back(error);
    }

    /// Apply `latency` to every subsequent probe (`None` disables).
    pub async fn set_probe_latency(&self, latency: Option<Duration>) {
        *self.probe_latency.write().await = latency;
    }
}

impl Default for MemoryAuthService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthService for MemoryAuthService {
    async fn current_identity(&self) -> Result<Option<Identity>> {
        if let Some(latency) = *self.probe_latency.read().await {
            tokio::time::sleep(latency).await;
        }
        if let Some(error) = self.queued_failures.lock().await.pop_front() {
            return Err(error);
        }
        Ok(self.current.read().await.clone())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Identity> {
        let users = self.users.read().await;
        let Some((expected, identity)) = users.get(email) else {
            return Err(CoreError::permission_denied("invalid login credentials"));
        };
        if expected != password {
            return Err(CoreError::permission_denied("invalid login credentials"));
        }
        let identity = identity.clone();
        drop(users);

        *self.current.write().await = Some(identity.clone());
        self.emit(AuthEvent::SignedIn(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<()> {
        *self.current.write().await = None;
        self.emit(AuthEvent::SignedOut);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_probe_without_session() {
        let auth = MemoryAuthService::new();
        assert!(auth.current_identity().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sign_in_emits_event_and_sets_session() {
        let auth = MemoryAuthService::new();
        auth.register_user(
            Identity::with_email("user-1", "tanaka@example.com"),
            "secret",
        )
        .await;
        let mut events = auth.subscribe();

        let identity = auth
            .sign_in_with_password("tanaka@example.com", "secret")
            .await
            .unwrap();
        assert_eq!(identity.id, "user-1");

        let event = events.recv().await.unwrap();
        assert_eq!(event, AuthEvent::SignedIn(identity.clone()));
        assert_eq!(auth.current_identity().await.unwrap(), Some(identity));
    }

    #[tokio::test]
    async fn test_sign_in_rejects_bad_credentials() {
        let auth = MemoryAuthService::new();
        auth.register_user(
            Identity::with_email("user-1", "tanaka@example.com"),
            "secret",
        )
        .await;

        let err = auth
            .sign_in_with_password("tanaka@example.com", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::PermissionDenied { .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_sign_out_clears_session_and_emits() {
        let auth = MemoryAuthService::new();
        auth.seed_session(Identity::new("user-1")).await;
        let mut events = auth.subscribe();

        auth.sign_out().await.unwrap();
        assert_eq!(events.recv().await.unwrap(), AuthEvent::SignedOut);
        assert!(auth.current_identity().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_probe_failure_injection() {
        let auth = MemoryAuthService::new();
        auth.fail_next_probe(CoreError::network("auth service unreachable"))
            .await;
        assert!(auth.current_identity().await.is_err());
        // Queue drained.
        assert!(auth.current_identity().await.is_ok());
    }
}
