// Role-lookup collaborators: the dedicated admin-membership table and the
// role-assignment join table.

use async_trait::async_trait;

use crate::backend::BackendResult;
use crate::models::{AdminRecord, RoleId};

/// The dedicated admin-membership table, keyed by email.
#[async_trait]
pub trait AdminDirectory: Send + Sync {
    /// Look up an admin row by normalized (lower-cased) email.
    async fn find_by_email(&self, email: &str) -> BackendResult<Option<AdminRecord>>;
}

/// The role-assignment join table, keyed by user id.
#[async_trait]
pub trait RoleAssignments: Send + Sync {
    /// All role ids assigned to a user. Empty means the implicit default.
    async fn list_role_ids_for_user(&self, user_id: &str) -> BackendResult<Vec<RoleId>>;

    /// Write a role-assignment row. Used best-effort at sign-up.
    async fn assign(&self, user_id: &str, role_id: RoleId) -> BackendResult<()>;
}
