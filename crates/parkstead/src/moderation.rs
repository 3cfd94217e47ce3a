// Listing moderation workflow: pending -> approved | rejected, with
// reverts. Every transition requires an ADMIN actor and is a single remote
// update; nothing is mutated optimistically, so a failed update leaves the
// listing exactly as it was and the caller retries manually.

use std::sync::Arc;

use parkstead_core::backend::listings::ListingStore;
use parkstead_core::error::{ApiError, ErrorCode, Result};
use parkstead_core::logger::MarketLogger;
use parkstead_core::models::Listing;
use parkstead_core::options::ParksteadOptions;

use crate::context::AuthState;

/// ADMIN-gated status transitions over listings.
#[derive(Clone)]
pub struct ModerationWorkflow {
    store: Arc<dyn ListingStore>,
    options: Arc<ParksteadOptions>,
    logger: MarketLogger,
}

impl ModerationWorkflow {
    pub fn new(
        store: Arc<dyn ListingStore>,
        options: Arc<ParksteadOptions>,
        logger: MarketLogger,
    ) -> Self {
        Self {
            store,
            options,
            logger,
        }
    }

    /// `* -> approved`. Clears `rejection_reason`.
    pub async fn approve(&self, actor: &AuthState, listing_id: &str) -> Result<Listing> {
        self.require_admin(actor)?;
        let updated = self
            .store
            .update(
                listing_id,
                serde_json::json!({ "status": "approved", "rejectionReason": null }),
            )
            .await?
            .ok_or_else(|| ApiError::not_found(ErrorCode::ListingNotFound))?;
        self.logger
            .info(&format!("listing {listing_id} approved"));
        Ok(updated)
    }

    /// `* -> rejected`. Always records a non-empty reason; an empty or
    /// missing one falls back to the configured default.
    pub async fn reject(
        &self,
        actor: &AuthState,
        listing_id: &str,
        reason: Option<&str>,
    ) -> Result<Listing> {
        self.require_admin(actor)?;
        let reason = match reason.map(str::trim) {
            Some(r) if !r.is_empty() => r.to_string(),
            _ => self.options.moderation.default_rejection_reason.clone(),
        };
        let updated = self
            .store
            .update(
                listing_id,
                serde_json::json!({ "status": "rejected", "rejectionReason": reason }),
            )
            .await?
            .ok_or_else(|| ApiError::not_found(ErrorCode::ListingNotFound))?;
        self.logger
            .info(&format!("listing {listing_id} rejected"));
        Ok(updated)
    }

    /// `* -> pending`. Reverts a decision; the last rejection reason is
    /// left in place until the listing is approved.
    pub async fn revert_to_pending(&self, actor: &AuthState, listing_id: &str) -> Result<Listing> {
        self.require_admin(actor)?;
        let updated = self
            .store
            .update(listing_id, serde_json::json!({ "status": "pending" }))
            .await?
            .ok_or_else(|| ApiError::not_found(ErrorCode::ListingNotFound))?;
        Ok(updated)
    }

    fn require_admin(&self, actor: &AuthState) -> Result<()> {
        match actor.role() {
            Some(role) if role.can_moderate() => Ok(()),
            _ => Err(ApiError::forbidden(ErrorCode::NotAllowedToModerateListings).into()),
        }
    }
}

impl std::fmt::Debug for ModerationWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModerationWorkflow").finish()
    }
}
