// The managed auth service boundary: session fetch, the ordered
// session-change feed, and the credential operations.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::backend::BackendResult;
use crate::models::{Identity, Session};

/// A change to the backend session, delivered in the order the service
/// emitted it. Handling is asynchronous, so handling order is not emission
/// order — consumers must guard against stale work themselves.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A session was established (sign-in here or elsewhere).
    SignedIn(Session),
    /// The session token was renewed.
    Refreshed(Session),
    /// The session ended (sign-out here or elsewhere, or expiry).
    SignedOut,
}

/// Outcome of a sign-up. Deployments differ on whether sign-up
/// auto-authenticates, so the session is optional.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub identity: Identity,
    pub session: Option<Session>,
}

/// The hosted auth service.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Fetch the current session, if any.
    async fn get_session(&self) -> BackendResult<Option<Session>>;

    /// Subscribe to the session-change feed.
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;

    /// Authenticate with email/password. Bad credentials surface as an
    /// `ApiError` with `INVALID_EMAIL_OR_PASSWORD`, never a panic.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> BackendResult<Session>;

    /// Register a new identity.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> BackendResult<SignUpOutcome>;

    /// End the current session.
    async fn sign_out(&self) -> BackendResult<()>;

    /// Dispatch a password-reset email. Success means the request was
    /// dispatched, not that the email arrived.
    async fn send_password_reset(&self, email: &str, redirect_url: &str) -> BackendResult<()>;

    /// Set a new password for the current identity.
    async fn update_password(&self, new_password: &str) -> BackendResult<()>;

    /// Force a session renewal.
    async fn refresh_session(&self) -> BackendResult<Session>;
}
