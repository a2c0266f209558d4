use async_trait::async_trait;
use futures::{channel::mpsc, stream::BoxStream, SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::{
    domain::{
        errors::{StorageError, StorageResult},
        models::{DeletionOutcome, DeletionRequest},
        value_objects::{BucketName, ObjectKey},
    },
    ports::{services::DeletionService, storage::StoreBackend},
};

/// Deletes in flight at once during a bulk delete
pub const DELETE_CONCURRENCY: usize = 16;

/// Keys buffered between the producer and the delete workers
pub const CHANNEL_CAPACITY: usize = 128;

/// Single and bulk deletion over a shared store handle
#[derive(Clone)]
pub struct DeletionServiceImpl {
    backend: Arc<dyn StoreBackend>,
}

impl DeletionServiceImpl {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self { backend }
    }

    pub async fn execute(&self, request: DeletionRequest) -> Vec<DeletionOutcome> {
        self.delete_many(&request.bucket, request.keys).await
    }
}

async fn delete_key(
    backend: Arc<dyn StoreBackend>,
    bucket: BucketName,
    key: String,
) -> DeletionOutcome {
    let object_key = match ObjectKey::new(key.clone()) {
        Ok(object_key) => object_key,
        Err(err) => {
            let error = StorageError::from(err);
            warn!(bucket = %bucket, key = %key, error = %error, "skipping invalid key");
            return DeletionOutcome::Failed { key, error };
        }
    };

    match backend.delete_object(&bucket, &object_key).await {
        Ok(()) => {
            debug!(bucket = %bucket, key = %key, "object deleted");
            DeletionOutcome::Deleted { key }
        }
        Err(error) => {
            error!(bucket = %bucket, key = %key, error = %error, "object delete failed");
            DeletionOutcome::Failed { key, error }
        }
    }
}

#[async_trait]
impl DeletionService for DeletionServiceImpl {
    async fn delete_one(&self, bucket: &BucketName, key: &ObjectKey) -> StorageResult<()> {
        match self.backend.delete_object(bucket, key).await {
            Ok(()) => {
                debug!(bucket = %bucket, key = %key, "object deleted");
                Ok(())
            }
            Err(err) => {
                error!(bucket = %bucket, key = %key, error = %err, "object delete failed");
                Err(err)
            }
        }
    }

    async fn delete_many(&self, bucket: &BucketName, keys: Vec<String>) -> Vec<DeletionOutcome> {
        let requested = keys.len();
        let outcomes: Vec<DeletionOutcome> =
            self.delete_many_stream(bucket, keys).collect().await;

        let failed = outcomes.iter().filter(|o| !o.is_deleted()).count();
        if failed > 0 {
            warn!(bucket = %bucket, requested, failed, "bulk delete finished with failures");
        } else {
            info!(bucket = %bucket, requested, "bulk delete finished");
        }
        outcomes
    }

    /// Keys flow through a bounded channel from a spawned producer task; the
    /// returned stream ends once the producer has sent every key and dropped
    /// its sender. Must be called from within a Tokio runtime.
    fn delete_many_stream(
        &self,
        bucket: &BucketName,
        keys: Vec<String>,
    ) -> BoxStream<'static, DeletionOutcome> {
        let (mut sender, receiver) = mpsc::channel::<String>(CHANNEL_CAPACITY);

        tokio::spawn(async move {
            for key in keys {
                if sender.send(key).await.is_err() {
                    // Consumer went away; nothing left to feed
                    break;
                }
            }
        });

        let backend = Arc::clone(&self.backend);
        let bucket = bucket.clone();
        receiver
            .map(move |key| delete_key(Arc::clone(&backend), bucket.clone(), key))
            .buffer_unordered(DELETE_CONCURRENCY)
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::storage::InMemoryBackend;
    use bytes::Bytes;
    use std::collections::HashSet;

    async fn seeded(keys: &[&str]) -> (DeletionServiceImpl, Arc<InMemoryBackend>, BucketName) {
        let bucket = BucketName::new("scratch").unwrap();
        let backend = Arc::new(InMemoryBackend::with_buckets([bucket.clone()]));
        for key in keys {
            backend
                .put_object(
                    &bucket,
                    &ObjectKey::new(*key).unwrap(),
                    Bytes::from_static(b"x"),
                    "text/plain",
                )
                .await
                .unwrap();
        }
        (DeletionServiceImpl::new(backend.clone()), backend, bucket)
    }

    #[tokio::test]
    async fn test_large_batch_exceeds_channel_capacity() {
        let keys: Vec<String> = (0..CHANNEL_CAPACITY * 3)
            .map(|i| format!("logs/{i:05}.log"))
            .collect();
        let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        let (service, backend, bucket) = seeded(&refs).await;

        let outcomes = service.delete_many(&bucket, keys.clone()).await;
        assert_eq!(outcomes.len(), keys.len());
        assert!(outcomes.iter().all(DeletionOutcome::is_deleted));

        let seen: HashSet<&str> = outcomes.iter().map(DeletionOutcome::key).collect();
        assert_eq!(seen.len(), keys.len());

        let probe = ObjectKey::new("logs/00000.log").unwrap();
        assert!(backend.head_object(&bucket, &probe).await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_key_fails_alone() {
        let (service, _, bucket) = seeded(&["a.txt", "b.txt"]).await;
        let outcomes = service
            .execute(DeletionRequest {
                bucket,
                keys: vec!["a.txt".into(), "".into(), "b.txt".into()],
            })
            .await;

        assert_eq!(outcomes.len(), 3);
        let failed: Vec<_> = outcomes.iter().filter(|o| !o.is_deleted()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].key(), "");
        assert!(matches!(
            failed[0].error(),
            Some(StorageError::ValidationError { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let (service, _, bucket) = seeded(&[]).await;
        assert!(service.delete_many(&bucket, Vec::new()).await.is_empty());
    }
}
