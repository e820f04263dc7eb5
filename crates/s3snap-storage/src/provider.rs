use async_trait::async_trait;
use std::path::Path;

use s3snap_core::types::RemoteObject;

use crate::error::StoreResult;

/// A bucket of archive objects.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Every object in the bucket. An empty bucket is an empty vec.
    async fn list_objects(&self) -> StoreResult<Vec<RemoteObject>>;

    /// Upload a local file as `key`.
    async fn upload(&self, local_file: &Path, key: &str) -> StoreResult<()>;

    /// Download `key` into a local file, replacing it if present.
    async fn download(&self, key: &str, local_file: &Path) -> StoreResult<()>;

    /// Delete one object.
    async fn delete_object(&self, key: &str) -> StoreResult<()>;

    /// Bucket name for display.
    fn bucket(&self) -> &str;
}
