//! Auth-service trait and session events.

use async_trait::async_trait;
use tokio::sync::broadcast;

use parcelbase_core::{Identity, Result};

/// A change in the authenticated session, pushed by the auth service.
///
/// Events are delivered in the order the service emits them; the session
/// state machine consumes them from a single loop, so no two events are
/// ever applied concurrently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A user signed in; carries the new principal.
    SignedIn(Identity),
    /// The session token was refreshed for the same principal.
    TokenRefreshed(Identity),
    /// The session ended.
    SignedOut,
}

/// Session lifecycle surface of the external auth service.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Query for an existing session (the initial probe on startup).
    ///
    /// `Ok(None)` means "no session" — that is a normal outcome, not an error.
    ///
    /// # Errors
    ///
    /// Returns transport errors when the service is unreachable.
    async fn current_identity(&self) -> Result<Option<Identity>>;

    /// Authenticate with email and password.
    ///
    /// On success the service also emits [`AuthEvent::SignedIn`] to
    /// subscribers.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` for bad credentials, transport errors
    /// otherwise.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Identity>;

    /// End the current session.
    ///
    /// On success the service also emits [`AuthEvent::SignedOut`].
    ///
    /// # Errors
    ///
    /// Returns transport errors when the service is unreachable.
    async fn sign_out(&self) -> Result<()>;

    /// Subscribe to future session events.
    ///
    /// Events emitted before subscription are not replayed.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
