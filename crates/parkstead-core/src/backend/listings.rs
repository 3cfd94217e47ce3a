// The managed listing/asset tables.

use async_trait::async_trait;

use crate::backend::BackendResult;
use crate::models::{Listing, ListingAsset, ListingStatus};

/// Query filters for listing browse/search. Results are ordered by
/// `created_at` descending unless stated otherwise.
#[derive(Debug, Clone, Default)]
pub struct ListingFilters {
    pub status: Option<ListingStatus>,
    pub owner_id: Option<String>,
    /// Case-insensitive substring match over title and location.
    pub search: Option<String>,
    pub limit: Option<usize>,
}

impl ListingFilters {
    pub fn with_status(status: ListingStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn for_owner(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
            ..Default::default()
        }
    }
}

/// The hosted listing table plus its asset metadata rows.
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn insert(&self, listing: Listing) -> BackendResult<Listing>;

    /// Partial update: `fields` is a JSON object of camelCase column
    /// patches (`null` clears a nullable column). Returns the updated row,
    /// or `None` when no row matched.
    async fn update(&self, id: &str, fields: serde_json::Value) -> BackendResult<Option<Listing>>;

    async fn delete(&self, id: &str) -> BackendResult<()>;

    async fn find_by_id(&self, id: &str) -> BackendResult<Option<Listing>>;

    async fn query(&self, filters: ListingFilters) -> BackendResult<Vec<Listing>>;

    // Asset metadata rows

    async fn insert_asset(&self, asset: ListingAsset) -> BackendResult<ListingAsset>;

    async fn list_assets(&self, listing_id: &str) -> BackendResult<Vec<ListingAsset>>;

    async fn delete_asset(&self, asset_id: &str) -> BackendResult<()>;

    /// Remove all asset rows for a listing, returning the removed rows so
    /// the caller can cascade to storage.
    async fn delete_assets(&self, listing_id: &str) -> BackendResult<Vec<ListingAsset>>;

    /// Demote the listing's current primary asset, if any.
    async fn clear_primary(&self, listing_id: &str) -> BackendResult<()>;
}
