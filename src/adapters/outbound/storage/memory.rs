use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::memory::InMemory;
use tokio::sync::RwLock;

use super::transfer;
use crate::{
    domain::{
        errors::{StorageError, StorageResult},
        value_objects::{BucketName, ObjectKey},
    },
    ports::storage::{ObjectHead, PutOutcome, StoreBackend},
};

/// Process-local backend with real bucket semantics, one `InMemory` store per
/// bucket. Used by tests and by the CLI's `--in-memory` mode.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    buckets: RwLock<HashMap<String, Arc<InMemory>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the given buckets already created
    pub fn with_buckets<I>(buckets: I) -> Self
    where
        I: IntoIterator<Item = BucketName>,
    {
        let buckets = buckets
            .into_iter()
            .map(|bucket| (bucket.to_string(), Arc::new(InMemory::new())))
            .collect();
        Self {
            buckets: RwLock::new(buckets),
        }
    }

    async fn store(&self, bucket: &BucketName) -> StorageResult<Arc<InMemory>> {
        self.buckets
            .read()
            .await
            .get(bucket.as_str())
            .cloned()
            .ok_or_else(|| StorageError::BucketNotFound {
                bucket: bucket.to_string(),
            })
    }
}

#[async_trait]
impl StoreBackend for InMemoryBackend {
    async fn bucket_exists(&self, bucket: &BucketName) -> StorageResult<bool> {
        Ok(self.buckets.read().await.contains_key(bucket.as_str()))
    }

    async fn create_bucket(&self, bucket: &BucketName) -> StorageResult<()> {
        let mut buckets = self.buckets.write().await;
        if buckets.contains_key(bucket.as_str()) {
            return Err(StorageError::BucketAlreadyExists {
                bucket: bucket.to_string(),
            });
        }
        buckets.insert(bucket.to_string(), Arc::new(InMemory::new()));
        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<PutOutcome> {
        let store = self.store(bucket).await?;
        let result = async {
            let path = transfer::object_path(key)?;
            transfer::put_bytes(store.as_ref(), &path, data, content_type).await
        }
        .await;
        result.map_err(|e| e.into_storage_error("put_object", bucket, Some(key)))
    }

    async fn put_file(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        path: &Path,
        content_type: &str,
    ) -> StorageResult<PutOutcome> {
        let store = self.store(bucket).await?;
        let result = async {
            let object_path = transfer::object_path(key)?;
            transfer::put_file(store.as_ref(), &object_path, path, content_type).await
        }
        .await;
        result.map_err(|e| e.into_storage_error("put_file", bucket, Some(key)))
    }

    async fn head_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> StorageResult<ObjectHead> {
        let store = self.store(bucket).await?;
        let result = async {
            let path = transfer::object_path(key)?;
            transfer::head(store.as_ref(), &path).await
        }
        .await;
        result.map_err(|e| e.into_storage_error("head_object", bucket, Some(key)))
    }

    async fn delete_object(&self, bucket: &BucketName, key: &ObjectKey) -> StorageResult<()> {
        let store = self.store(bucket).await?;
        let result = async {
            let path = transfer::object_path(key)?;
            transfer::delete(store.as_ref(), &path).await
        }
        .await;
        result.map_err(|e| e.into_storage_error("delete_object", bucket, Some(key)))
    }

    async fn presign_get(
        &self,
        _bucket: &BucketName,
        _key: &ObjectKey,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        Err(StorageError::UnsupportedOperation {
            operation: "presign_get".to_string(),
            reason: "in-memory objects have no URL".to_string(),
        })
    }
}
