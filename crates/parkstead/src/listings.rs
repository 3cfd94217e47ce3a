// Listing CRUD outside the moderation state machine: owner-stamped
// creation, owner-only content edits, and owner-or-admin deletion with an
// asset cascade.

use std::collections::HashMap;
use std::sync::Arc;

use parkstead_core::backend::listings::{ListingFilters, ListingStore};
use parkstead_core::backend::storage::ObjectStorage;
use parkstead_core::error::{ApiError, ErrorCode, Result};
use parkstead_core::logger::MarketLogger;
use parkstead_core::models::{Listing, ListingDraft, ListingPatch};
use parkstead_core::options::ParksteadOptions;

use crate::context::AuthState;

/// Listing CRUD for brokers and public browse.
#[derive(Clone)]
pub struct ListingService {
    store: Arc<dyn ListingStore>,
    storage: Arc<dyn ObjectStorage>,
    options: Arc<ParksteadOptions>,
    logger: MarketLogger,
}

impl ListingService {
    pub fn new(
        store: Arc<dyn ListingStore>,
        storage: Arc<dyn ObjectStorage>,
        options: Arc<ParksteadOptions>,
        logger: MarketLogger,
    ) -> Self {
        Self {
            store,
            storage,
            options,
            logger,
        }
    }

    /// Create a `pending` listing owned by the current identity.
    pub async fn create(&self, actor: &AuthState, draft: ListingDraft) -> Result<Listing> {
        let identity = actor
            .identity()
            .ok_or_else(ApiError::unauthorized)?;
        let listing = Listing::new(draft, identity.id.clone());
        self.store.insert(listing).await
    }

    /// Apply a content patch. Owner-only, allowed in any status; the patch
    /// type has no `status` field so the moderation state is unreachable
    /// from here.
    pub async fn edit(
        &self,
        actor: &AuthState,
        listing_id: &str,
        patch: ListingPatch,
    ) -> Result<Listing> {
        let listing = self
            .store
            .find_by_id(listing_id)
            .await?
            .ok_or_else(|| ApiError::not_found(ErrorCode::ListingNotFound))?;

        let is_owner = actor
            .identity()
            .is_some_and(|identity| identity.id == listing.owner_id);
        if !is_owner {
            return Err(ApiError::forbidden(ErrorCode::NotAllowedToEditListing).into());
        }

        if patch.is_empty() {
            return Ok(listing);
        }

        let fields = serde_json::to_value(&patch)
            .map_err(|err| parkstead_core::error::ParksteadError::Other(err.to_string()))?;
        self.store
            .update(listing_id, fields)
            .await?
            .ok_or_else(|| ApiError::not_found(ErrorCode::ListingNotFound).into())
    }

    /// Delete a listing (owner or admin, any status), cascading to its
    /// assets. Metadata rows go first; storage removal afterwards is
    /// best-effort — a failure there leaves orphaned objects, which is
    /// logged and accepted, never rolled back.
    pub async fn delete(&self, actor: &AuthState, listing_id: &str) -> Result<()> {
        let listing = self
            .store
            .find_by_id(listing_id)
            .await?
            .ok_or_else(|| ApiError::not_found(ErrorCode::ListingNotFound))?;

        let is_owner = actor
            .identity()
            .is_some_and(|identity| identity.id == listing.owner_id);
        let is_admin = actor.role().is_some_and(|role| role.can_moderate());
        if !is_owner && !is_admin {
            return Err(ApiError::forbidden(ErrorCode::NotAllowedToDeleteListing).into());
        }

        let removed = self.store.delete_assets(listing_id).await?;
        self.store.delete(listing_id).await?;

        // Group removed asset paths by bucket before the storage sweep.
        let mut by_bucket: HashMap<&str, Vec<String>> = HashMap::new();
        for asset in &removed {
            by_bucket
                .entry(self.options.uploads.bucket_for(asset.file_type))
                .or_default()
                .push(asset.storage_path.clone());
        }
        for (bucket, paths) in by_bucket {
            if let Err(err) = self.storage.remove(bucket, &paths).await {
                self.logger.warn(&format!(
                    "orphaned {} object(s) in {bucket} after deleting listing {listing_id}: {err}",
                    paths.len()
                ));
            }
        }
        Ok(())
    }

    /// Browse/search listings, newest first.
    pub async fn query(&self, filters: ListingFilters) -> Result<Vec<Listing>> {
        self.store.query(filters).await
    }
}

impl std::fmt::Debug for ListingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingService").finish()
    }
}
