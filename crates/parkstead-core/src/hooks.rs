// Async lifecycle hooks fired around auth transitions.
//
// The embedding shell subscribes here for side effects the core does not
// own — the canonical consumer is an `AfterSignOut` hook that reloads the
// client entry point so no stale in-memory state survives a sign-out.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

/// The kind of auth event that triggered a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    BeforeSignIn,
    AfterSignIn,
    AfterSignUp,
    AfterSignOut,
}

impl HookEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BeforeSignIn => "before_sign_in",
            Self::AfterSignIn => "after_sign_in",
            Self::AfterSignUp => "after_sign_up",
            Self::AfterSignOut => "after_sign_out",
        }
    }
}

/// An async hook registered around auth events.
///
/// `before` hooks may cancel the operation; `after` hooks are
/// fire-and-forget.
#[async_trait]
pub trait AsyncHook: Send + Sync {
    async fn on_event(&self, event: HookEvent, data: &Value) -> HookResult;
}

/// The result of a hook execution.
#[derive(Debug, Clone)]
pub enum HookResult {
    /// Continue the operation.
    Continue,
    /// Cancel the operation with an optional reason.
    Cancel(Option<String>),
}

impl HookResult {
    pub fn ok() -> Self {
        Self::Continue
    }

    pub fn cancel(reason: impl Into<String>) -> Self {
        Self::Cancel(Some(reason.into()))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancel(_))
    }
}

/// Registry of async hooks; multiple hooks per event run in registration
/// order.
#[derive(Clone, Default)]
pub struct AsyncHookRegistry {
    hooks: Vec<(HookEvent, Arc<dyn AsyncHook>)>,
}

impl std::fmt::Debug for AsyncHookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncHookRegistry")
            .field("hook_count", &self.hooks.len())
            .finish()
    }
}

impl AsyncHookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook for a specific event.
    pub fn register(&mut self, event: HookEvent, hook: Arc<dyn AsyncHook>) {
        self.hooks.push((event, hook));
    }

    /// Run all hooks for a "before" event in registration order.
    /// Returns `HookResult::Cancel` if any hook cancels.
    pub async fn run_before(&self, event: HookEvent, data: &Value) -> HookResult {
        for (hook_event, hook) in &self.hooks {
            if *hook_event == event {
                let result = hook.on_event(event, data).await;
                if result.is_cancelled() {
                    return result;
                }
            }
        }
        HookResult::Continue
    }

    /// Run all hooks for an "after" event (fire-and-forget).
    pub async fn run_after(&self, event: HookEvent, data: &Value) {
        for (hook_event, hook) in &self.hooks {
            if *hook_event == event {
                let _ = hook.on_event(event, data).await;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingHook {
        calls: std::sync::atomic::AtomicUsize,
        cancel: bool,
    }

    #[async_trait]
    impl AsyncHook for CountingHook {
        async fn on_event(&self, _event: HookEvent, _data: &Value) -> HookResult {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if self.cancel {
                HookResult::cancel("no")
            } else {
                HookResult::ok()
            }
        }
    }

    #[tokio::test]
    async fn test_after_hooks_run_in_order() {
        let hook = Arc::new(CountingHook {
            calls: Default::default(),
            cancel: false,
        });
        let mut registry = AsyncHookRegistry::new();
        registry.register(HookEvent::AfterSignOut, hook.clone());
        registry.register(HookEvent::AfterSignOut, hook.clone());
        registry.register(HookEvent::AfterSignIn, hook.clone());

        registry
            .run_after(HookEvent::AfterSignOut, &serde_json::json!({}))
            .await;
        assert_eq!(hook.calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_before_hook_can_cancel() {
        let mut registry = AsyncHookRegistry::new();
        registry.register(
            HookEvent::BeforeSignIn,
            Arc::new(CountingHook {
                calls: Default::default(),
                cancel: true,
            }),
        );
        let result = registry
            .run_before(HookEvent::BeforeSignIn, &serde_json::json!({}))
            .await;
        assert!(result.is_cancelled());
    }

    #[tokio::test]
    async fn test_empty_registry_continues() {
        let registry = AsyncHookRegistry::new();
        let result = registry
            .run_before(HookEvent::BeforeSignIn, &serde_json::json!({}))
            .await;
        assert!(!result.is_cancelled());
        assert!(registry.is_empty());
    }
}
