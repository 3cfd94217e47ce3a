// Route guards: evaluate an auth-state snapshot against what a route
// requires. A denied admin route renders an access-denied view — never a
// redirect loop — so denial carries a presentable error.

use parkstead_core::error::ErrorCode;
use parkstead_core::models::Role;

use crate::context::AuthState;

/// What a route requires before rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteRequirement {
    Public,
    Authenticated,
    Admin,
}

/// Outcome of a guard evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteAccess {
    Granted,
    /// Auth state is still `Loading`; render a loader, not a denial. The
    /// init safety timeout bounds how long this can last.
    Pending,
    /// Render the access-denied view with this code/message.
    Denied { code: ErrorCode, message: String },
}

impl RouteAccess {
    pub fn is_granted(&self) -> bool {
        matches!(self, RouteAccess::Granted)
    }

    fn denied(code: ErrorCode) -> Self {
        RouteAccess::Denied {
            message: code.to_string(),
            code,
        }
    }
}

/// Evaluate a state snapshot against a requirement.
pub fn evaluate(state: &AuthState, requirement: RouteRequirement) -> RouteAccess {
    match requirement {
        RouteRequirement::Public => RouteAccess::Granted,
        RouteRequirement::Authenticated => match state {
            AuthState::Loading => RouteAccess::Pending,
            AuthState::Unauthenticated => RouteAccess::denied(ErrorCode::Unauthorized),
            AuthState::Authenticated { .. } => RouteAccess::Granted,
        },
        RouteRequirement::Admin => match state {
            AuthState::Loading => RouteAccess::Pending,
            AuthState::Unauthenticated => RouteAccess::denied(ErrorCode::Unauthorized),
            AuthState::Authenticated { role, .. } if *role == Role::Admin => RouteAccess::Granted,
            AuthState::Authenticated { .. } => {
                RouteAccess::denied(ErrorCode::NotAllowedToModerateListings)
            }
        },
    }
}

/// Requirement for an application route path.
pub fn requirement_for_path(path: &str) -> RouteRequirement {
    if path == "/admin" || path.starts_with("/admin/") {
        RouteRequirement::Admin
    } else if path == "/broker/dashboard" || path == "/listings/new" {
        RouteRequirement::Authenticated
    } else {
        RouteRequirement::Public
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parkstead_core::models::Identity;

    fn authed(role: Role) -> AuthState {
        AuthState::Authenticated {
            identity: Identity::new("u1", "a@b.com", "tok"),
            role,
        }
    }

    #[test]
    fn test_public_always_granted() {
        assert!(evaluate(&AuthState::Loading, RouteRequirement::Public).is_granted());
        assert!(evaluate(&AuthState::Unauthenticated, RouteRequirement::Public).is_granted());
    }

    #[test]
    fn test_admin_route_requires_admin() {
        assert!(evaluate(&authed(Role::Admin), RouteRequirement::Admin).is_granted());
        assert!(!evaluate(&authed(Role::Broker), RouteRequirement::Admin).is_granted());
        assert!(!evaluate(&authed(Role::User), RouteRequirement::Admin).is_granted());
        assert!(!evaluate(&AuthState::Unauthenticated, RouteRequirement::Admin).is_granted());
    }

    #[test]
    fn test_loading_is_pending_not_denied() {
        assert_eq!(
            evaluate(&AuthState::Loading, RouteRequirement::Admin),
            RouteAccess::Pending
        );
        assert_eq!(
            evaluate(&AuthState::Loading, RouteRequirement::Authenticated),
            RouteAccess::Pending
        );
    }

    #[test]
    fn test_authenticated_routes() {
        assert!(evaluate(&authed(Role::User), RouteRequirement::Authenticated).is_granted());
        let denied = evaluate(&AuthState::Unauthenticated, RouteRequirement::Authenticated);
        assert!(matches!(
            denied,
            RouteAccess::Denied {
                code: ErrorCode::Unauthorized,
                ..
            }
        ));
    }

    #[test]
    fn test_requirement_for_path() {
        assert_eq!(requirement_for_path("/admin"), RouteRequirement::Admin);
        assert_eq!(
            requirement_for_path("/admin/listings"),
            RouteRequirement::Admin
        );
        assert_eq!(
            requirement_for_path("/broker/dashboard"),
            RouteRequirement::Authenticated
        );
        assert_eq!(
            requirement_for_path("/listings/new"),
            RouteRequirement::Authenticated
        );
        assert_eq!(requirement_for_path("/listings/42"), RouteRequirement::Public);
        assert_eq!(requirement_for_path("/"), RouteRequirement::Public);
    }
}
