//! # parcelbase-auth
//!
//! The session/authorization state every page depends on.
//!
//! [`SessionManager`] holds the current authenticated identity and its
//! authorization [`Profile`](parcelbase_core::Profile), driven by the auth
//! service's event stream. Pages observe it through a watch channel and gate
//! rendering with [`RouteGuard`].
//!
//! The state machine never blocks the UI on a broken backend: a failed or
//! timed-out profile lookup yields a fallback profile at the configured
//! (lowest-privilege) role instead of an error.

pub mod guard;
pub mod session;

pub use guard::{GuardDecision, RouteGuard};
pub use session::{SessionManager, SessionOptions, SessionPhase, SessionSnapshot};
