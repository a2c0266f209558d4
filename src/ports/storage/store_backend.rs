use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::domain::{
    errors::StorageResult,
    value_objects::{BucketName, ObjectKey},
};

/// Port for the backing object store.
///
/// One handle serves every bucket and is shared by all services; implementations
/// must be safe to call concurrently without external locking.
#[async_trait]
pub trait StoreBackend: Send + Sync + 'static {
    /// Check whether a bucket exists
    async fn bucket_exists(&self, bucket: &BucketName) -> StorageResult<bool>;

    /// Create a bucket
    async fn create_bucket(&self, bucket: &BucketName) -> StorageResult<()>;

    /// Store an in-memory buffer under `key`
    async fn put_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<PutOutcome>;

    /// Store the contents of a local file, streaming from disk
    async fn put_file(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        path: &Path,
        content_type: &str,
    ) -> StorageResult<PutOutcome>;

    /// Fetch object metadata; a missing key is `StorageError::ObjectNotFound`
    async fn head_object(&self, bucket: &BucketName, key: &ObjectKey)
        -> StorageResult<ObjectHead>;

    /// Delete an object; deleting a missing key succeeds
    async fn delete_object(&self, bucket: &BucketName, key: &ObjectKey) -> StorageResult<()>;

    /// Sign a GET URL for `key` valid for `expires_in`
    async fn presign_get(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        expires_in: Duration,
    ) -> StorageResult<String>;
}

/// What the store reported after a successful write
#[derive(Debug, Clone, PartialEq)]
pub struct PutOutcome {
    pub size: u64,
    pub etag: Option<String>,
}

/// Object metadata as reported by the store
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectHead {
    pub size: u64,
    pub content_type: Option<String>,
    pub last_modified: DateTime<Utc>,
    pub etag: Option<String>,
}
