//! # Parkstead
//!
//! The auth/role core and listing moderation workflow of the Parkstead
//! marketplace (RV parks and campgrounds for sale). The hosted backend —
//! managed auth, managed tables, object storage — sits behind the
//! collaborator traits in `parkstead-core`; this crate owns the logic that
//! coordinates them:
//!
//! - [`AuthContext`]: the process-wide reactive auth state machine
//!   (`Loading -> Unauthenticated | Authenticated`), with sequence-guarded
//!   role resolution so a stale lookup never overwrites a fresher one.
//! - [`RoleResolver`]: token claim -> admin table -> role assignments,
//!   degrading on failure and bounded by a timeout; always yields a role.
//! - [`ModerationWorkflow`]: ADMIN-gated `pending/approved/rejected`
//!   transitions over listings.
//! - [`ListingService`] and [`UploadOrchestrator`]: owner-scoped CRUD and
//!   per-asset independent uploads with a mixed-result summary.
//! - [`guards`]: route-level access evaluation.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use parkstead::{AuthContext, AuthContextConfig};
//! use parkstead_core::{AsyncHookRegistry, MarketLogger, ParksteadOptions};
//! use parkstead_memory::MemoryBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = MemoryBackend::new();
//!     let ctx = AuthContext::new(AuthContextConfig {
//!         auth: backend.auth.clone(),
//!         directory: backend.directory.clone(),
//!         assignments: backend.assignments.clone(),
//!         role_cache: backend.role_cache.clone(),
//!         options: Arc::new(ParksteadOptions::default()),
//!         logger: MarketLogger::default(),
//!         hooks: AsyncHookRegistry::new(),
//!     });
//!     ctx.init().await;
//!
//!     let mut state = ctx.subscribe();
//!     println!("auth state: {:?}", *state.borrow_and_update());
//! }
//! ```

pub mod context;
pub mod guards;
pub mod listings;
pub mod moderation;
pub mod resolver;
pub mod uploads;

pub use context::{AuthContext, AuthContextConfig, AuthState};
pub use listings::ListingService;
pub use moderation::ModerationWorkflow;
pub use resolver::RoleResolver;
pub use uploads::{NewAsset, UploadFailure, UploadOrchestrator, UploadSummary};
