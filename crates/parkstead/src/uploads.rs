// Asset upload orchestration: per-asset independent uploads with bounded
// parallelism. A failing asset never aborts its siblings; the caller gets
// a mixed-result summary. The metadata row is written only after the
// storage upload succeeds, so a failed upload never leaves a row behind —
// the reverse (an orphaned storage object after a row-insert failure) is
// cleaned up best-effort and otherwise just logged.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use parkstead_core::backend::listings::ListingStore;
use parkstead_core::backend::storage::ObjectStorage;
use parkstead_core::error::Result;
use parkstead_core::logger::MarketLogger;
use parkstead_core::models::{AssetKind, ListingAsset};
use parkstead_core::options::ParksteadOptions;

/// An asset queued for upload.
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub kind: AssetKind,
    pub position: i32,
    pub is_primary: bool,
}

/// A single asset that failed, with the reason.
#[derive(Debug, Clone, serde::Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{file_name}: {message}")]
pub struct UploadFailure {
    pub file_name: String,
    pub message: String,
}

/// Aggregated outcome of one upload batch.
#[derive(Debug, Clone, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    pub uploaded: Vec<ListingAsset>,
    pub failures: Vec<UploadFailure>,
}

impl UploadSummary {
    pub fn success_count(&self) -> usize {
        self.uploaded.len()
    }

    pub fn error_count(&self) -> usize {
        self.failures.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Uploads listing assets to object storage and records their metadata
/// rows, maintaining the one-primary-per-listing invariant.
#[derive(Clone)]
pub struct UploadOrchestrator {
    store: Arc<dyn ListingStore>,
    storage: Arc<dyn ObjectStorage>,
    options: Arc<ParksteadOptions>,
    logger: MarketLogger,
}

impl UploadOrchestrator {
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

    /// Upload a batch of assets for one listing.
    ///
    /// Uploads run concurrently up to the configured limit. Each asset's
    /// success or failure is tracked independently and aggregated into the
    /// returned summary; the call itself only errors when the batch cannot
    /// start at all (e.g. demoting the existing primary fails).
    pub async fn upload_assets(
        &self,
        listing_id: &str,
        mut assets: Vec<NewAsset>,
    ) -> Result<UploadSummary> {
        // At most one primary per listing: keep the first incoming primary,
        // demote the rest, and clear the currently stored one up front.
        let mut saw_primary = false;
        for asset in &mut assets {
            if asset.is_primary {
                if saw_primary {
                    asset.is_primary = false;
                } else {
                    saw_primary = true;
                }
            }
        }
        if saw_primary {
            self.store.clear_primary(listing_id).await?;
        }

        let semaphore = Arc::new(Semaphore::new(self.options.uploads.max_concurrent_uploads));
        let mut tasks: JoinSet<std::result::Result<ListingAsset, UploadFailure>> = JoinSet::new();

        for asset in assets {
            let semaphore = Arc::clone(&semaphore);
            let store = Arc::clone(&self.store);
            let storage = Arc::clone(&self.storage);
            let logger = self.logger.clone();
            let bucket = self.options.uploads.bucket_for(asset.kind).to_string();
            let listing_id = listing_id.to_string();

            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return Err(UploadFailure {
                            file_name: asset.file_name,
                            message: "upload slot closed".to_string(),
                        })
                    }
                };

                let path = format!(
                    "{}/{}-{}",
                    listing_id,
                    uuid::Uuid::new_v4(),
                    asset.file_name
                );
                let stored_path = match storage.upload(&bucket, &path, asset.bytes).await {
                    Ok(stored_path) => stored_path,
                    Err(err) => {
                        return Err(UploadFailure {
                            file_name: asset.file_name,
                            message: err.to_string(),
                        })
                    }
                };

                let row = ListingAsset {
                    id: uuid::Uuid::new_v4().to_string(),
                    listing_id,
                    storage_path: stored_path.clone(),
                    position: asset.position,
                    is_primary: asset.is_primary,
                    file_type: asset.kind,
                };
                match store.insert_asset(row).await {
                    Ok(row) => Ok(row),
                    Err(err) => {
                        // The object is already stored; sweep it so the row
                        // failure does not leave an orphan. If the sweep
                        // fails too, the orphan is accepted and logged.
                        if let Err(cleanup_err) =
                            storage.remove(&bucket, &[stored_path.clone()]).await
                        {
                            logger.warn(&format!(
                                "orphaned object {bucket}/{stored_path}: {cleanup_err}"
                            ));
                        }
                        Err(UploadFailure {
                            file_name: asset.file_name,
                            message: err.to_string(),
                        })
                    }
                }
            });
        }

        let mut summary = UploadSummary::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(row)) => summary.uploaded.push(row),
                Ok(Err(failure)) => {
                    self.logger.warn(&format!(
                        "asset {} failed: {}",
                        failure.file_name, failure.message
                    ));
                    summary.failures.push(failure);
                }
                Err(err) => summary.failures.push(UploadFailure {
                    file_name: "<unknown>".to_string(),
                    message: format!("upload task failed: {err}"),
                }),
            }
        }
        summary.uploaded.sort_by_key(|asset| asset.position);
        Ok(summary)
    }

    /// Public URL for a stored asset.
    pub fn public_url(&self, asset: &ListingAsset) -> String {
        let bucket = self.options.uploads.bucket_for(asset.file_type);
        self.storage.get_public_url(bucket, &asset.storage_path)
    }
}

impl std::fmt::Debug for UploadOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadOrchestrator")
            .field(
                "max_concurrent_uploads",
                &self.options.uploads.max_concurrent_uploads,
            )
            .finish()
    }
}
