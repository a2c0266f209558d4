use async_trait::async_trait;

use crate::domain::{errors::StorageResult, value_objects::BucketName};

/// Port for bucket management
#[async_trait]
pub trait BucketService: Send + Sync + 'static {
    /// Check if a bucket exists, bounded by the service's bucket timeout
    async fn bucket_exists(&self, bucket: &BucketName) -> StorageResult<bool>;

    /// Create the bucket unless it already exists. Safe to call repeatedly.
    async fn ensure_bucket(&self, bucket: &BucketName) -> StorageResult<()>;
}
