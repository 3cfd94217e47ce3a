//! In-memory implementations of every Parkstead collaborator trait.
//!
//! Data lives in `HashMap`s behind `tokio::sync::RwLock` and is lost on
//! drop. Each fake carries failure and latency injection knobs so the
//! integration suites can script degraded backends, timeouts, and
//! resolution races deterministically.

mod auth;
mod directory;
mod storage;
mod store;

pub use auth::MemoryAuthService;
pub use directory::{MemoryAdminDirectory, MemoryRoleAssignments};
pub use storage::{MemoryObjectStorage, MemoryRoleCache};
pub use store::MemoryListingStore;

use std::sync::Arc;

/// Aggregate of all the in-memory collaborators, wired together the way a
/// real deployment wires the hosted backend clients.
#[derive(Clone)]
pub struct MemoryBackend {
    pub auth: Arc<MemoryAuthService>,
    pub directory: Arc<MemoryAdminDirectory>,
    pub assignments: Arc<MemoryRoleAssignments>,
    pub listings: Arc<MemoryListingStore>,
    pub storage: Arc<MemoryObjectStorage>,
    pub role_cache: Arc<MemoryRoleCache>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            auth: Arc::new(MemoryAuthService::new()),
            directory: Arc::new(MemoryAdminDirectory::new()),
            assignments: Arc::new(MemoryRoleAssignments::new()),
            listings: Arc::new(MemoryListingStore::new()),
            storage: Arc::new(MemoryObjectStorage::new()),
            role_cache: Arc::new(MemoryRoleCache::new()),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}
