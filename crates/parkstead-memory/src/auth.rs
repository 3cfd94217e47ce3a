// In-memory auth service: a user table, at most one live session, and a
// broadcast session-change feed. Latency and failure knobs let tests
// script an unresponsive or degraded backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::{broadcast, RwLock};

use parkstead_core::backend::auth::{AuthService, SessionEvent, SignUpOutcome};
use parkstead_core::backend::BackendResult;
use parkstead_core::error::{ApiError, ErrorCode, ParksteadError};
use parkstead_core::models::{Identity, Session};

#[derive(Debug, Clone)]
struct MemoryUser {
    id: String,
    email: String,
    password: String,
    metadata: serde_json::Map<String, serde_json::Value>,
}

/// In-memory [`AuthService`].
pub struct MemoryAuthService {
    users: RwLock<HashMap<String, MemoryUser>>,
    current: Arc<RwLock<Option<Session>>>,
    events: broadcast::Sender<SessionEvent>,
    reset_requests: RwLock<Vec<(String, String)>>,
    session_fetch_delay: RwLock<Option<Duration>>,
    fail_sign_out: AtomicBool,
    auto_sign_in_on_sign_up: AtomicBool,
}

impl MemoryAuthService {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            users: RwLock::new(HashMap::new()),
            current: Arc::new(RwLock::new(None)),
            events,
            reset_requests: RwLock::new(Vec::new()),
            session_fetch_delay: RwLock::new(None),
            fail_sign_out: AtomicBool::new(false),
            auto_sign_in_on_sign_up: AtomicBool::new(false),
        }
    }

    // ─── Seeding / scripting ────────────────────────────────────

    /// Register a user directly, returning its id.
    pub async fn seed_user(&self, email: &str, password: &str) -> String {
        self.seed_user_with_metadata(email, password, serde_json::Map::new())
            .await
    }

    /// Register a user whose session token will carry a `role` claim.
    pub async fn seed_user_with_claim(&self, email: &str, password: &str, claim: &str) -> String {
        let mut metadata = serde_json::Map::new();
        metadata.insert("role".into(), serde_json::json!(claim));
        self.seed_user_with_metadata(email, password, metadata).await
    }

    pub async fn seed_user_with_metadata(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let email = email.to_lowercase();
        self.users.write().await.insert(
            email.clone(),
            MemoryUser {
                id: id.clone(),
                email,
                password: password.to_string(),
                metadata,
            },
        );
        id
    }

    /// Establish a session for a seeded user without credentials, as if a
    /// sign-in happened elsewhere. Emits `SignedIn`.
    pub async fn open_session(&self, email: &str) -> Session {
        let users = self.users.read().await;
        let user = users
            .get(&email.to_lowercase())
            .cloned()
            .unwrap_or_else(|| panic!("open_session: no user {email}"));
        drop(users);
        let session = self.build_session(&user);
        *self.current.write().await = Some(session.clone());
        let _ = self.events.send(SessionEvent::SignedIn(session.clone()));
        session
    }

    /// Simulate a sign-out that happened elsewhere. Emits `SignedOut`.
    pub async fn close_session(&self) {
        *self.current.write().await = None;
        let _ = self.events.send(SessionEvent::SignedOut);
    }

    /// Delay applied to every `get_session` call.
    pub async fn set_session_fetch_delay(&self, delay: Option<Duration>) {
        *self.session_fetch_delay.write().await = delay;
    }

    /// Make `sign_out` fail without clearing the backend session.
    pub fn fail_sign_out(&self, fail: bool) {
        self.fail_sign_out.store(fail, Ordering::SeqCst);
    }

    /// Whether sign-up establishes a session immediately.
    pub fn auto_sign_in_on_sign_up(&self, on: bool) {
        self.auto_sign_in_on_sign_up.store(on, Ordering::SeqCst);
    }

    /// Password-reset dispatches recorded so far, as `(email, redirect)`.
    pub async fn reset_requests(&self) -> Vec<(String, String)> {
        self.reset_requests.read().await.clone()
    }

    pub async fn current_session(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    fn build_session(&self, user: &MemoryUser) -> Session {
        let token = uuid::Uuid::new_v4().to_string();
        let mut identity = Identity::new(user.id.clone(), user.email.clone(), token.clone());
        identity.metadata = user.metadata.clone();
        Session {
            identity,
            token,
            expires_at: Utc::now() + ChronoDuration::hours(1),
        }
    }
}

impl Default for MemoryAuthService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthService for MemoryAuthService {
    async fn get_session(&self) -> BackendResult<Option<Session>> {
        let delay = *self.session_fetch_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.current.read().await.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> BackendResult<Session> {
        let users = self.users.read().await;
        let user = users
            .get(&email.to_lowercase())
            .filter(|user| user.password == password)
            .cloned();
        drop(users);

        let Some(user) = user else {
            return Err(ApiError::new(ErrorCode::InvalidEmailOrPassword).into());
        };

        let session = self.build_session(&user);
        *self.current.write().await = Some(session.clone());
        let _ = self.events.send(SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> BackendResult<SignUpOutcome> {
        let email = email.to_lowercase();
        let mut users = self.users.write().await;
        if users.contains_key(&email) {
            return Err(ApiError::new(ErrorCode::UserAlreadyExists).into());
        }
        let user = MemoryUser {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.clone(),
            password: password.to_string(),
            metadata,
        };
        users.insert(email, user.clone());
        drop(users);

        let mut identity = Identity::new(user.id.clone(), user.email.clone(), String::new());
        identity.metadata = user.metadata.clone();

        let session = if self.auto_sign_in_on_sign_up.load(Ordering::SeqCst) {
            let session = self.build_session(&user);
            *self.current.write().await = Some(session.clone());
            let _ = self.events.send(SessionEvent::SignedIn(session.clone()));
            Some(session)
        } else {
            None
        };

        Ok(SignUpOutcome { identity, session })
    }

    async fn sign_out(&self) -> BackendResult<()> {
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(ParksteadError::Backend("sign-out rejected".to_string()));
        }
        *self.current.write().await = None;
        let _ = self.events.send(SessionEvent::SignedOut);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str, redirect_url: &str) -> BackendResult<()> {
        self.reset_requests
            .write()
            .await
            .push((email.to_lowercase(), redirect_url.to_string()));
        Ok(())
    }

    async fn update_password(&self, new_password: &str) -> BackendResult<()> {
        let current = self.current.read().await.clone();
        let Some(session) = current else {
            return Err(ApiError::new(ErrorCode::SessionNotFound).into());
        };
        let mut users = self.users.write().await;
        if let Some(user) = users.get_mut(&session.identity.email) {
            user.password = new_password.to_string();
        }
        Ok(())
    }

    async fn refresh_session(&self) -> BackendResult<Session> {
        let mut current = self.current.write().await;
        let Some(session) = current.as_mut() else {
            return Err(ApiError::new(ErrorCode::SessionNotFound).into());
        };
        session.expires_at = Utc::now() + ChronoDuration::hours(1);
        let refreshed = session.clone();
        drop(current);
        let _ = self.events.send(SessionEvent::Refreshed(refreshed.clone()));
        Ok(refreshed)
    }
}

impl std::fmt::Debug for MemoryAuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryAuthService").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_in_success_and_event() {
        let auth = MemoryAuthService::new();
        auth.seed_user("alice@example.com", "hunter22").await;
        let mut events = auth.subscribe();

        let session = auth
            .sign_in_with_password("Alice@Example.com", "hunter22")
            .await
            .unwrap();
        assert_eq!(session.identity.email, "alice@example.com");
        assert!(matches!(
            events.recv().await.unwrap(),
            SessionEvent::SignedIn(_)
        ));
    }

    #[tokio::test]
    async fn test_sign_in_bad_password() {
        let auth = MemoryAuthService::new();
        auth.seed_user("alice@example.com", "hunter22").await;

        let err = auth
            .sign_in_with_password("alice@example.com", "wrong")
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::InvalidEmailOrPassword));
        assert!(auth.current_session().await.is_none());
    }

    #[tokio::test]
    async fn test_sign_up_duplicate_email() {
        let auth = MemoryAuthService::new();
        auth.seed_user("bob@example.com", "pw").await;
        let err = auth
            .sign_up("bob@example.com", "pw2", serde_json::Map::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::UserAlreadyExists));
    }

    #[tokio::test]
    async fn test_failed_sign_out_keeps_backend_session() {
        let auth = MemoryAuthService::new();
        auth.seed_user("c@d.com", "pw").await;
        auth.open_session("c@d.com").await;
        auth.fail_sign_out(true);

        assert!(auth.sign_out().await.is_err());
        assert!(auth.current_session().await.is_some());
    }

    #[tokio::test]
    async fn test_refresh_without_session() {
        let auth = MemoryAuthService::new();
        let err = auth.refresh_session().await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::SessionNotFound));
    }
}
