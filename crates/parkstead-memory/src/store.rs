// In-memory listing/asset tables. Updates are applied the way the hosted
// table API applies them: merge a JSON patch over the serialized row
// (null clears a nullable column), then stamp `updatedAt`.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use parkstead_core::backend::listings::{ListingFilters, ListingStore};
use parkstead_core::backend::BackendResult;
use parkstead_core::error::ParksteadError;
use parkstead_core::models::{Listing, ListingAsset};

/// In-memory [`ListingStore`].
pub struct MemoryListingStore {
    listings: RwLock<Vec<Listing>>,
    assets: RwLock<Vec<ListingAsset>>,
    fail_updates: AtomicBool,
    fail_asset_inserts_matching: RwLock<Option<String>>,
}

impl MemoryListingStore {
    pub fn new() -> Self {
        Self {
            listings: RwLock::new(Vec::new()),
            assets: RwLock::new(Vec::new()),
            fail_updates: AtomicBool::new(false),
            fail_asset_inserts_matching: RwLock::new(None),
        }
    }

    /// Make every `update` call fail, for transition-failure tests.
    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Reject asset-row inserts whose storage path contains `pattern`.
    pub async fn fail_asset_inserts_matching(&self, pattern: Option<&str>) {
        *self.fail_asset_inserts_matching.write().await = pattern.map(str::to_string);
    }

    pub async fn listing_count(&self) -> usize {
        self.listings.read().await.len()
    }

    pub async fn asset_count(&self) -> usize {
        self.assets.read().await.len()
    }

    fn merge_patch(listing: &Listing, fields: &serde_json::Value) -> BackendResult<Listing> {
        let mut value = serde_json::to_value(listing)
            .map_err(|err| ParksteadError::Backend(err.to_string()))?;
        let Some(object) = value.as_object_mut() else {
            return Err(ParksteadError::Backend("listing row is not an object".into()));
        };
        if let Some(patch) = fields.as_object() {
            for (key, patch_value) in patch {
                object.insert(key.clone(), patch_value.clone());
            }
        }
        object.insert("updatedAt".into(), serde_json::json!(Utc::now()));
        serde_json::from_value(value).map_err(|err| ParksteadError::Backend(err.to_string()))
    }
}

impl Default for MemoryListingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ListingStore for MemoryListingStore {
    async fn insert(&self, listing: Listing) -> BackendResult<Listing> {
        self.listings.write().await.push(listing.clone());
        Ok(listing)
    }

    async fn update(&self, id: &str, fields: serde_json::Value) -> BackendResult<Option<Listing>> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(ParksteadError::Backend("update rejected".to_string()));
        }
        let mut listings = self.listings.write().await;
        let Some(slot) = listings.iter_mut().find(|listing| listing.id == id) else {
            return Ok(None);
        };
        let updated = Self::merge_patch(slot, &fields)?;
        *slot = updated.clone();
        Ok(Some(updated))
    }

    async fn delete(&self, id: &str) -> BackendResult<()> {
        self.listings.write().await.retain(|listing| listing.id != id);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> BackendResult<Option<Listing>> {
        Ok(self
            .listings
            .read()
            .await
            .iter()
            .find(|listing| listing.id == id)
            .cloned())
    }

    async fn query(&self, filters: ListingFilters) -> BackendResult<Vec<Listing>> {
        let listings = self.listings.read().await;
        let search = filters.search.as_deref().map(str::to_lowercase);
        let mut matched: Vec<Listing> = listings
            .iter()
            .filter(|listing| {
                filters
                    .status
                    .is_none_or(|status| listing.status == status)
            })
            .filter(|listing| {
                filters
                    .owner_id
                    .as_deref()
                    .is_none_or(|owner| listing.owner_id == owner)
            })
            .filter(|listing| {
                search.as_deref().is_none_or(|needle| {
                    listing.title.to_lowercase().contains(needle)
                        || listing.location.to_lowercase().contains(needle)
                })
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = filters.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    async fn insert_asset(&self, asset: ListingAsset) -> BackendResult<ListingAsset> {
        let pattern = self.fail_asset_inserts_matching.read().await.clone();
        if let Some(pattern) = pattern {
            if asset.storage_path.contains(&pattern) {
                return Err(ParksteadError::Backend(
                    "asset row insert rejected".to_string(),
                ));
            }
        }
        self.assets.write().await.push(asset.clone());
        Ok(asset)
    }

    async fn list_assets(&self, listing_id: &str) -> BackendResult<Vec<ListingAsset>> {
        let mut rows: Vec<ListingAsset> = self
            .assets
            .read()
            .await
            .iter()
            .filter(|asset| asset.listing_id == listing_id)
            .cloned()
            .collect();
        rows.sort_by_key(|asset| asset.position);
        Ok(rows)
    }

    async fn delete_asset(&self, asset_id: &str) -> BackendResult<()> {
        self.assets.write().await.retain(|asset| asset.id != asset_id);
        Ok(())
    }

    async fn delete_assets(&self, listing_id: &str) -> BackendResult<Vec<ListingAsset>> {
        let mut assets = self.assets.write().await;
        let (removed, kept): (Vec<ListingAsset>, Vec<ListingAsset>) = assets
            .drain(..)
            .partition(|asset| asset.listing_id == listing_id);
        *assets = kept;
        Ok(removed)
    }

    async fn clear_primary(&self, listing_id: &str) -> BackendResult<()> {
        let mut assets = self.assets.write().await;
        for asset in assets.iter_mut() {
            if asset.listing_id == listing_id {
                asset.is_primary = false;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for MemoryListingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryListingStore").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parkstead_core::models::{ListingDraft, ListingStatus};

    fn draft(title: &str) -> ListingDraft {
        ListingDraft {
            title: title.into(),
            price: 500_000,
            description: "desc".into(),
            location: "Moab, UT".into(),
        }
    }

    #[tokio::test]
    async fn test_update_merges_patch_and_bumps_updated_at() {
        let store = MemoryListingStore::new();
        let listing = store
            .insert(Listing::new(draft("Red Rock RV"), "owner-1"))
            .await
            .unwrap();

        let updated = store
            .update(
                &listing.id,
                serde_json::json!({ "status": "rejected", "rejectionReason": "Too vague" }),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, ListingStatus::Rejected);
        assert_eq!(updated.rejection_reason.as_deref(), Some("Too vague"));
        assert!(updated.updated_at >= listing.updated_at);
    }

    #[tokio::test]
    async fn test_update_null_clears_reason() {
        let store = MemoryListingStore::new();
        let listing = store
            .insert(Listing::new(draft("Pine Hollow"), "owner-1"))
            .await
            .unwrap();
        store
            .update(
                &listing.id,
                serde_json::json!({ "status": "rejected", "rejectionReason": "spam" }),
            )
            .await
            .unwrap();

        let updated = store
            .update(
                &listing.id,
                serde_json::json!({ "status": "approved", "rejectionReason": null }),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, ListingStatus::Approved);
        assert!(updated.rejection_reason.is_none());
    }

    #[tokio::test]
    async fn test_update_missing_listing_is_none() {
        let store = MemoryListingStore::new();
        let result = store
            .update("nope", serde_json::json!({ "status": "approved" }))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_query_newest_first_with_filters() {
        let store = MemoryListingStore::new();
        let mut first = Listing::new(draft("Older Park"), "owner-1");
        first.created_at = Utc::now() - chrono::Duration::hours(2);
        store.insert(first).await.unwrap();
        store
            .insert(Listing::new(draft("Newer Park"), "owner-2"))
            .await
            .unwrap();

        let all = store.query(ListingFilters::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "Newer Park");

        let owned = store
            .query(ListingFilters::for_owner("owner-1"))
            .await
            .unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].title, "Older Park");

        let searched = store
            .query(ListingFilters {
                search: Some("newer".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(searched.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_assets_partitions_by_listing() {
        let store = MemoryListingStore::new();
        for (listing_id, path) in [("l1", "a"), ("l1", "b"), ("l2", "c")] {
            store
                .insert_asset(ListingAsset {
                    id: uuid::Uuid::new_v4().to_string(),
                    listing_id: listing_id.into(),
                    storage_path: path.into(),
                    position: 0,
                    is_primary: false,
                    file_type: parkstead_core::models::AssetKind::Image,
                })
                .await
                .unwrap();
        }
        let removed = store.delete_assets("l1").await.unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(store.asset_count().await, 1);
    }
}
