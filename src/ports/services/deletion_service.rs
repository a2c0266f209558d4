use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::domain::{
    errors::StorageResult,
    models::DeletionOutcome,
    value_objects::{BucketName, ObjectKey},
};

/// Port for single and bulk object deletion
#[async_trait]
pub trait DeletionService: Send + Sync + 'static {
    /// Delete one object; a missing key is not an error
    async fn delete_one(&self, bucket: &BucketName, key: &ObjectKey) -> StorageResult<()>;

    /// Delete every key, returning one outcome per key in completion order.
    /// Individual failures never abort the batch.
    async fn delete_many(&self, bucket: &BucketName, keys: Vec<String>) -> Vec<DeletionOutcome>;

    /// Like [`DeletionService::delete_many`], yielding outcomes as they complete
    fn delete_many_stream(
        &self,
        bucket: &BucketName,
        keys: Vec<String>,
    ) -> BoxStream<'static, DeletionOutcome>;
}
