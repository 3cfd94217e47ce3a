// Role resolution: compute the authorization role for an identity.
//
// Precedence is token claim, then admin-membership table, then the
// role-assignment join table. Each strategy degrades to the next on
// failure; the whole pass races a bounded timeout. Callers always receive
// a role, never an error — downstream authorization is the only consumer,
// and failing closed to `User` is the safe default.

use std::sync::Arc;

use tokio::time::timeout;

use parkstead_core::backend::directory::{AdminDirectory, RoleAssignments};
use parkstead_core::logger::MarketLogger;
use parkstead_core::models::{Identity, Role};
use parkstead_core::options::ParksteadOptions;

/// Resolves an identity to its authoritative [`Role`].
#[derive(Clone)]
pub struct RoleResolver {
    directory: Arc<dyn AdminDirectory>,
    assignments: Arc<dyn RoleAssignments>,
    options: Arc<ParksteadOptions>,
    logger: MarketLogger,
}

impl RoleResolver {
    pub fn new(
        directory: Arc<dyn AdminDirectory>,
        assignments: Arc<dyn RoleAssignments>,
        options: Arc<ParksteadOptions>,
        logger: MarketLogger,
    ) -> Self {
        Self {
            directory,
            assignments,
            options,
            logger,
        }
    }

    /// Resolve the role for `identity`.
    ///
    /// `fallback` is the role substituted when the pass times out —
    /// typically the persisted snapshot from the last session, else
    /// `Role::User`. An absent identity is always anonymous `User`.
    pub async fn resolve(&self, identity: Option<&Identity>, fallback: Option<Role>) -> Role {
        let Some(identity) = identity else {
            return Role::User;
        };

        let fallback = fallback.unwrap_or(Role::User);
        match timeout(
            self.options.role_resolution_timeout(),
            self.resolve_inner(identity),
        )
        .await
        {
            Ok(role) => role,
            Err(_) => {
                self.logger.warn(&format!(
                    "role resolution timed out for {}; using {}",
                    identity.id, fallback
                ));
                fallback
            }
        }
    }

    async fn resolve_inner(&self, identity: &Identity) -> Role {
        // Token claims need no round-trip, so they win.
        if let Some(role) = identity.role_claim().and_then(Role::from_claim) {
            return role;
        }

        match self
            .directory
            .find_by_email(&identity.email.to_lowercase())
            .await
        {
            Ok(Some(_)) => return Role::Admin,
            Ok(None) => {}
            Err(err) => {
                self.logger
                    .debug(&format!("admin directory lookup failed: {err}"));
            }
        }

        match self.assignments.list_role_ids_for_user(&identity.id).await {
            Ok(role_ids) => {
                if role_ids.contains(&self.options.roles.admin_role_id) {
                    Role::Admin
                } else if role_ids.contains(&self.options.roles.broker_role_id) {
                    Role::Broker
                } else {
                    Role::User
                }
            }
            Err(err) => {
                self.logger
                    .debug(&format!("role assignment lookup failed: {err}"));
                Role::User
            }
        }
    }
}

impl std::fmt::Debug for RoleResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleResolver")
            .field("timeout_ms", &self.options.role_resolution_timeout_ms)
            .finish()
    }
}
