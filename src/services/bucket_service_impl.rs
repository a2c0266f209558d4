use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::{
    domain::{
        errors::{StorageError, StorageResult},
        value_objects::BucketName,
    },
    ports::{services::BucketService, storage::StoreBackend},
};

/// Deadline applied to each bucket-level store call
pub const DEFAULT_BUCKET_TIMEOUT: Duration = Duration::from_secs(10);

/// Bucket management over a shared store handle
#[derive(Clone)]
pub struct BucketServiceImpl {
    backend: Arc<dyn StoreBackend>,
    timeout: Duration,
}

impl BucketServiceImpl {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self {
            backend,
            timeout: DEFAULT_BUCKET_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Abandon `call` once the bucket deadline passes. Nothing is retried.
    async fn bounded<T, F>(&self, operation: &str, call: F) -> StorageResult<T>
    where
        F: Future<Output = StorageResult<T>> + Send,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout {
                operation: operation.to_string(),
                after: self.timeout,
            }),
        }
    }
}

#[async_trait]
impl BucketService for BucketServiceImpl {
    async fn bucket_exists(&self, bucket: &BucketName) -> StorageResult<bool> {
        let result = self
            .bounded("bucket_exists", self.backend.bucket_exists(bucket))
            .await;

        match &result {
            Ok(exists) => debug!(bucket = %bucket, exists, "bucket existence checked"),
            Err(err) => error!(bucket = %bucket, error = %err, "bucket existence check failed"),
        }
        result
    }

    async fn ensure_bucket(&self, bucket: &BucketName) -> StorageResult<()> {
        if self.bucket_exists(bucket).await? {
            debug!(bucket = %bucket, "bucket already exists");
            return Ok(());
        }

        match self
            .bounded("create_bucket", self.backend.create_bucket(bucket))
            .await
        {
            Ok(()) => {
                info!(bucket = %bucket, "bucket created");
                Ok(())
            }
            Err(err) => {
                error!(bucket = %bucket, error = %err, "bucket creation failed");
                Err(err)
            }
        }
    }
}
