// Persisted client-side role/identity snapshot.
//
// Backed by local browser storage in the shipped client; only ever an
// optimistic-render hint, cleared unconditionally on sign-out and
// reconciled against a fresh resolution on the next load.

use crate::models::RoleSnapshot;

pub trait RoleCache: Send + Sync {
    fn store(&self, snapshot: &RoleSnapshot);
    fn load(&self) -> Option<RoleSnapshot>;
    fn clear(&self);
}
