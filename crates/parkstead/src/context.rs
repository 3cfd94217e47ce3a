// The process-wide auth state machine.
//
// `AuthContext` owns the current identity/role and is the only writer;
// everything else (moderation workflow, upload orchestrator, route guards)
// subscribes through a watch channel. Session-change events and the
// operations below all funnel through a per-transition sequence number:
// a role resolution is applied only while its number is still the latest
// issued, so a stale lookup can never overwrite a fresher one no matter
// which network call returns first.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::{broadcast, watch};
use tokio::time::timeout;

use parkstead_core::backend::auth::{AuthService, SessionEvent, SignUpOutcome};
use parkstead_core::backend::cache::RoleCache;
use parkstead_core::backend::directory::{AdminDirectory, RoleAssignments};
use parkstead_core::error::{ApiError, Result};
use parkstead_core::hooks::{AsyncHookRegistry, HookEvent};
use parkstead_core::logger::MarketLogger;
use parkstead_core::models::{Identity, Role, RoleSnapshot, Session};
use parkstead_core::options::ParksteadOptions;

use crate::resolver::RoleResolver;

// ─── State ───────────────────────────────────────────────────────

/// The reactive auth state every consumer reads.
///
/// There is no error state: failures collapse to `Unauthenticated`.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    /// Initial state while the first session fetch is in flight. Bounded
    /// by the init safety timeout; never survives it.
    Loading,
    Unauthenticated,
    Authenticated { identity: Identity, role: Role },
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated { .. })
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            AuthState::Authenticated { role, .. } => Some(*role),
            _ => None,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthState::Authenticated { identity, .. } => Some(identity),
            _ => None,
        }
    }
}

// ─── Context ─────────────────────────────────────────────────────

/// Everything the context needs, bundled so construction stays readable.
pub struct AuthContextConfig {
    pub auth: Arc<dyn AuthService>,
    pub directory: Arc<dyn AdminDirectory>,
    pub assignments: Arc<dyn RoleAssignments>,
    pub role_cache: Arc<dyn RoleCache>,
    pub options: Arc<ParksteadOptions>,
    pub logger: MarketLogger,
    pub hooks: AsyncHookRegistry,
}

/// The process-wide owner of the current identity and role.
///
/// Cheap to clone: every field is shared, so clones observe and drive the
/// same state machine. Create one per process, call [`init`](Self::init)
/// once, and tear down with [`close`](Self::close).
#[derive(Clone)]
pub struct AuthContext {
    auth: Arc<dyn AuthService>,
    assignments: Arc<dyn RoleAssignments>,
    resolver: RoleResolver,
    role_cache: Arc<dyn RoleCache>,
    options: Arc<ParksteadOptions>,
    logger: MarketLogger,
    hooks: AsyncHookRegistry,
    state_tx: Arc<watch::Sender<AuthState>>,
    /// Latest issued transition number; guarded together with state
    /// emission so check-and-send is atomic.
    latest_seq: Arc<Mutex<u64>>,
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl AuthContext {
    pub fn new(config: AuthContextConfig) -> Self {
        let resolver = RoleResolver::new(
            config.directory,
            Arc::clone(&config.assignments),
            Arc::clone(&config.options),
            config.logger.clone(),
        );
        let (state_tx, _) = watch::channel(AuthState::Loading);
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            auth: config.auth,
            assignments: config.assignments,
            resolver,
            role_cache: config.role_cache,
            options: config.options,
            logger: config.logger,
            hooks: config.hooks,
            state_tx: Arc::new(state_tx),
            latest_seq: Arc::new(Mutex::new(0)),
            shutdown_tx: Arc::new(shutdown_tx),
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> AuthState {
        self.state_tx.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state_tx.subscribe()
    }

    /// The role resolver, for callers that need a one-off resolution.
    pub fn resolver(&self) -> &RoleResolver {
        &self.resolver
    }

    /// Stop the session-event pump. Pending resolutions finish but their
    /// results are discarded once their sequence number goes stale.
    pub fn close(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    // ─── Lifecycle ──────────────────────────────────────────────

    /// Subscribe to the session feed, then fetch the current session once.
    ///
    /// Role resolution is awaited before the first `Authenticated`
    /// emission, so consumers never see authenticated content at the wrong
    /// privilege. The whole path is bounded: if the backend never answers,
    /// the init timeout forces `Loading -> Unauthenticated`.
    pub async fn init(&self) {
        self.spawn_event_pump();

        let seq = self.next_seq();
        match timeout(self.options.init_timeout(), self.auth.get_session()).await {
            Ok(Ok(Some(session))) if !session.is_expired() => {
                self.resolve_and_apply(seq, session.identity).await;
            }
            Ok(Ok(_)) => {
                self.apply_if_current(seq, AuthState::Unauthenticated);
            }
            Ok(Err(err)) => {
                self.logger.warn(&format!("session fetch failed: {err}"));
                self.apply_if_current(seq, AuthState::Unauthenticated);
            }
            Err(_) => {
                self.logger
                    .warn("auth backend did not respond during init");
                self.apply_if_current(seq, AuthState::Unauthenticated);
            }
        }
    }

    fn spawn_event_pump(&self) {
        let mut events = self.auth.subscribe();
        let mut shutdown = self.shutdown_tx.subscribe();
        let ctx = self.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    event = events.recv() => match event {
                        Ok(event) => ctx.handle_session_event(event),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            ctx.logger.warn(&format!(
                                "session feed lagged; {skipped} events dropped"
                            ));
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });
    }

    fn handle_session_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::SignedOut => {
                let seq = self.next_seq();
                self.role_cache.clear();
                self.apply_if_current(seq, AuthState::Unauthenticated);
            }
            SessionEvent::SignedIn(session) | SessionEvent::Refreshed(session) => {
                // Handling is async and may interleave with later events;
                // the sequence guard decides which resolution lands.
                let seq = self.next_seq();
                let ctx = self.clone();
                tokio::spawn(async move {
                    ctx.resolve_and_apply(seq, session.identity).await;
                });
            }
        }
    }

    // ─── Operations ─────────────────────────────────────────────

    /// Authenticate with email/password.
    ///
    /// On success the context emits `Authenticated` immediately at the
    /// cached-snapshot role (or `User` when none is cached) and upgrades in
    /// the background once resolution completes — callers must expect a
    /// second emission with the final role. On failure the state stays
    /// `Unauthenticated` and the structured error is returned, not thrown.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let payload = serde_json::json!({ "email": email });
        if self
            .hooks
            .run_before(HookEvent::BeforeSignIn, &payload)
            .await
            .is_cancelled()
        {
            return Err(ApiError::unauthorized().into());
        }

        let session = self.auth.sign_in_with_password(email, password).await?;

        let seq = self.next_seq();
        let provisional = self
            .cached_hint(&session.identity)
            .unwrap_or(Role::User);
        self.apply_if_current(
            seq,
            AuthState::Authenticated {
                identity: session.identity.clone(),
                role: provisional,
            },
        );

        let ctx = self.clone();
        let identity = session.identity.clone();
        tokio::spawn(async move {
            ctx.resolve_and_apply(seq, identity).await;
        });

        self.hooks.run_after(HookEvent::AfterSignIn, &payload).await;
        Ok(session)
    }

    /// Register a new identity. The default USER role row is written
    /// best-effort: a failure is logged, not fatal, because the resolver
    /// already defaults to `User`. Whether the caller ends up signed in
    /// depends on the backend (the session feed drives any state change).
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> Result<SignUpOutcome> {
        let outcome = self.auth.sign_up(email, password, metadata).await?;

        if let Err(err) = self
            .assignments
            .assign(&outcome.identity.id, self.options.roles.user_role_id)
            .await
        {
            self.logger.warn(&format!(
                "failed to assign default role for {}: {err}",
                outcome.identity.id
            ));
        }

        self.hooks
            .run_after(
                HookEvent::AfterSignUp,
                &serde_json::json!({ "userId": outcome.identity.id }),
            )
            .await;
        Ok(outcome)
    }

    /// End the session. Local state clears first so the UI reacts
    /// immediately, and stays cleared even when the backend call fails —
    /// never leave the UI authenticated against a revoked session.
    /// Idempotent: a second call is a no-op that still returns `Ok`.
    pub async fn sign_out(&self) -> Result<()> {
        let seq = self.next_seq();
        self.role_cache.clear();
        self.apply_if_current(seq, AuthState::Unauthenticated);

        if let Err(err) = self.auth.sign_out().await {
            self.logger
                .warn(&format!("backend sign-out failed: {err}"));
        }

        self.hooks
            .run_after(HookEvent::AfterSignOut, &serde_json::json!({}))
            .await;
        Ok(())
    }

    /// Dispatch a password-reset email. Returns the dispatch result, not
    /// whether the email arrived.
    pub async fn reset_password(&self, email: &str) -> Result<()> {
        self.auth
            .send_password_reset(email, &self.options.password_reset_redirect_url)
            .await
    }

    /// Set a new password for the current identity.
    pub async fn update_password(&self, new_password: &str) -> Result<()> {
        self.auth.update_password(new_password).await
    }

    /// Force a session renewal and re-resolution. Use after an operation
    /// that may have changed the server-side role assignment, so the
    /// client reflects it without a sign-out/in cycle.
    pub async fn refresh_token(&self) -> Result<()> {
        let session = self.auth.refresh_session().await?;
        let seq = self.next_seq();
        self.resolve_and_apply(seq, session.identity).await;
        Ok(())
    }

    // ─── Internals ──────────────────────────────────────────────

    async fn resolve_and_apply(&self, seq: u64, identity: Identity) {
        let hint = self.cached_hint(&identity);
        let role = self.resolver.resolve(Some(&identity), hint).await;

        let snapshot = RoleSnapshot {
            user_id: identity.id.clone(),
            email: identity.email.clone(),
            role,
            cached_at: Utc::now(),
        };
        if self.apply_if_current(seq, AuthState::Authenticated { identity, role }) {
            self.role_cache.store(&snapshot);
        }
    }

    /// Draw the next transition number. Anything resolved under an older
    /// number is stale from this point on.
    fn next_seq(&self) -> u64 {
        let mut latest = self.latest_seq.lock().unwrap();
        *latest += 1;
        *latest
    }

    /// Emit `state` only if `seq` is still the latest issued number.
    fn apply_if_current(&self, seq: u64, state: AuthState) -> bool {
        let latest = self.latest_seq.lock().unwrap();
        if seq != *latest {
            self.logger.debug(&format!(
                "discarding stale transition (seq {seq}, latest {latest})"
            ));
            return false;
        }
        self.state_tx.send_replace(state);
        true
    }

    fn cached_hint(&self, identity: &Identity) -> Option<Role> {
        self.role_cache
            .load()
            .filter(|snapshot| snapshot.user_id == identity.id)
            .map(|snapshot| snapshot.role)
    }
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("state", &self.state())
            .field("hooks", &self.hooks)
            .finish()
    }
}
