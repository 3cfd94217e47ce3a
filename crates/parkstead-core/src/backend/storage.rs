// The managed object-storage boundary.

use async_trait::async_trait;

use crate::backend::BackendResult;

/// Hosted object storage, addressed by bucket + path.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store an object; returns the stored path.
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>) -> BackendResult<String>;

    /// Public URL for a stored object. Pure formatting, no round-trip.
    fn get_public_url(&self, bucket: &str, path: &str) -> String;

    /// Remove objects. Missing paths are not an error.
    async fn remove(&self, bucket: &str, paths: &[String]) -> BackendResult<()>;
}
