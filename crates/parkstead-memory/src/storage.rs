// In-memory object storage and role-snapshot cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use parkstead_core::backend::cache::RoleCache;
use parkstead_core::backend::storage::ObjectStorage;
use parkstead_core::backend::BackendResult;
use parkstead_core::error::ParksteadError;
use parkstead_core::models::RoleSnapshot;

/// In-memory [`ObjectStorage`].
pub struct MemoryObjectStorage {
    objects: RwLock<HashMap<(String, String), Vec<u8>>>,
    fail_uploads_matching: RwLock<Option<String>>,
    fail_remove: AtomicBool,
}

impl MemoryObjectStorage {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            fail_uploads_matching: RwLock::new(None),
            fail_remove: AtomicBool::new(false),
        }
    }

    /// Reject uploads whose path contains `pattern`.
    pub async fn fail_uploads_matching(&self, pattern: Option<&str>) {
        *self.fail_uploads_matching.write().await = pattern.map(str::to_string);
    }

    /// Make `remove` fail, so orphan-cleanup paths can be exercised.
    pub fn fail_remove(&self, fail: bool) {
        self.fail_remove.store(fail, Ordering::SeqCst);
    }

    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn contains(&self, bucket: &str, path: &str) -> bool {
        self.objects
            .read()
            .await
            .contains_key(&(bucket.to_string(), path.to_string()))
    }
}

impl Default for MemoryObjectStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>) -> BackendResult<String> {
        let pattern = self.fail_uploads_matching.read().await.clone();
        if let Some(pattern) = pattern {
            if path.contains(&pattern) {
                return Err(ParksteadError::Storage("upload refused".to_string()));
            }
        }
        self.objects
            .write()
            .await
            .insert((bucket.to_string(), path.to_string()), bytes);
        Ok(path.to_string())
    }

    fn get_public_url(&self, bucket: &str, path: &str) -> String {
        format!("https://storage.parkstead.local/{bucket}/{path}")
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> BackendResult<()> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(ParksteadError::Storage("remove refused".to_string()));
        }
        let mut objects = self.objects.write().await;
        for path in paths {
            objects.remove(&(bucket.to_string(), path.clone()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for MemoryObjectStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryObjectStorage").finish()
    }
}

/// In-memory [`RoleCache`], standing in for local browser storage.
pub struct MemoryRoleCache {
    snapshot: std::sync::RwLock<Option<RoleSnapshot>>,
}

impl MemoryRoleCache {
    pub fn new() -> Self {
        Self {
            snapshot: std::sync::RwLock::new(None),
        }
    }

    /// Current snapshot, for assertions.
    pub fn snapshot(&self) -> Option<RoleSnapshot> {
        self.snapshot.read().unwrap().clone()
    }
}

impl Default for MemoryRoleCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RoleCache for MemoryRoleCache {
    fn store(&self, snapshot: &RoleSnapshot) {
        *self.snapshot.write().unwrap() = Some(snapshot.clone());
    }

    fn load(&self) -> Option<RoleSnapshot> {
        self.snapshot.read().unwrap().clone()
    }

    fn clear(&self) {
        *self.snapshot.write().unwrap() = None;
    }
}

impl std::fmt::Debug for MemoryRoleCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRoleCache")
            .field("cached", &self.snapshot.read().unwrap().is_some())
            .finish()
    }
}
