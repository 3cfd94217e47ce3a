//! Core types for the Parkstead marketplace: data models, error taxonomy,
//! logging, configuration, lifecycle hooks, and the collaborator traits
//! behind which the hosted backend (managed auth, managed tables, object
//! storage) lives.
//!
//! Nothing in this crate talks to a network. Concrete collaborator
//! implementations live elsewhere (`parkstead-memory` provides in-memory
//! ones for tests and local development).

pub mod backend;
pub mod error;
pub mod hooks;
pub mod logger;
pub mod models;
pub mod options;

// Re-exports for convenience
pub use backend::auth::{AuthService, SessionEvent, SignUpOutcome};
pub use backend::cache::RoleCache;
pub use backend::directory::{AdminDirectory, RoleAssignments};
pub use backend::listings::{ListingFilters, ListingStore};
pub use backend::storage::ObjectStorage;
pub use backend::BackendResult;
pub use error::{ApiError, ErrorCode, ParksteadError, Result};
pub use hooks::{AsyncHook, AsyncHookRegistry, HookEvent, HookResult};
pub use logger::{LogHandler, LogLevel, LoggerConfig, MarketLogger};
pub use models::{
    AdminRecord, AssetKind, Identity, Listing, ListingAsset, ListingDraft, ListingPatch,
    ListingStatus, Role, RoleId, RoleSnapshot, Session,
};
pub use options::ParksteadOptions;
