// Collaborator traits for the hosted backend.
//
// The core never talks to the network directly; every external concern
// (managed auth, managed tables, object storage, the persisted client
// cache) sits behind one of these traits and is injected as an
// `Arc<dyn ...>`, so tests substitute fakes.

pub mod auth;
pub mod cache;
pub mod directory;
pub mod listings;
pub mod storage;

use crate::error::ParksteadError;

/// Result type for backend collaborator operations.
pub type BackendResult<T> = std::result::Result<T, ParksteadError>;
