// Shared harness for the integration suites: an AuthContext wired to the
// in-memory backend, plus state-waiting helpers.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use parkstead::{AuthContext, AuthContextConfig, AuthState};
use parkstead_core::hooks::AsyncHookRegistry;
use parkstead_core::logger::{LoggerConfig, MarketLogger};
use parkstead_core::options::ParksteadOptions;
use parkstead_memory::MemoryBackend;

pub struct Harness {
    pub backend: MemoryBackend,
    pub options: Arc<ParksteadOptions>,
    pub ctx: AuthContext,
}

pub fn harness() -> Harness {
    harness_with(ParksteadOptions::default(), AsyncHookRegistry::new())
}

pub fn harness_with(options: ParksteadOptions, hooks: AsyncHookRegistry) -> Harness {
    let backend = MemoryBackend::new();
    let options = Arc::new(options);
    let logger = quiet_logger();
    let ctx = AuthContext::new(AuthContextConfig {
        auth: backend.auth.clone(),
        directory: backend.directory.clone(),
        assignments: backend.assignments.clone(),
        role_cache: backend.role_cache.clone(),
        options: Arc::clone(&options),
        logger,
        hooks,
    });
    Harness {
        backend,
        options,
        ctx,
    }
}

pub fn quiet_logger() -> MarketLogger {
    MarketLogger::new(LoggerConfig {
        disabled: true,
        ..Default::default()
    })
}

/// Await the first state satisfying `pred`, bounded so a broken state
/// machine fails the test instead of hanging it.
pub async fn wait_for_state<F>(rx: &mut watch::Receiver<AuthState>, pred: F) -> AuthState
where
    F: Fn(&AuthState) -> bool,
{
    tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            {
                let state = rx.borrow().clone();
                if pred(&state) {
                    return state;
                }
            }
            rx.changed().await.expect("auth context dropped");
        }
    })
    .await
    .expect("expected auth state never reached")
}
