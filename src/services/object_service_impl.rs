use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::{
    domain::{
        content_type::{self, ContentType},
        errors::{StorageError, StorageResult},
        models::{ObjectDescriptor, UploadReceipt, UploadSource},
        value_objects::{BucketName, ObjectKey},
    },
    ports::{
        services::ObjectService,
        storage::{PutOutcome, StoreBackend},
    },
};

/// Uploads, stat and presigning over a shared store handle
#[derive(Clone)]
pub struct ObjectServiceImpl {
    backend: Arc<dyn StoreBackend>,
}

impl ObjectServiceImpl {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self { backend }
    }

    fn receipt(
        bucket: &BucketName,
        key: &ObjectKey,
        content_type: &ContentType,
        outcome: PutOutcome,
    ) -> UploadReceipt {
        UploadReceipt {
            bucket: bucket.to_string(),
            key: key.to_string(),
            size_bytes: outcome.size,
            content_type: content_type.to_string(),
            etag: outcome.etag,
        }
    }

    fn log_upload(
        bucket: &BucketName,
        key: &ObjectKey,
        result: StorageResult<UploadReceipt>,
    ) -> StorageResult<UploadReceipt> {
        match &result {
            Ok(receipt) => info!(
                bucket = %bucket,
                key = %key,
                size = receipt.size_bytes,
                content_type = %receipt.content_type,
                "upload succeeded"
            ),
            Err(err) => error!(bucket = %bucket, key = %key, error = %err, "upload failed"),
        }
        result
    }
}

#[async_trait]
impl ObjectService for ObjectServiceImpl {
    async fn upload_buffer(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        data: Bytes,
        declared_length: u64,
        content_type: Option<ContentType>,
    ) -> StorageResult<UploadReceipt> {
        let actual = data.len() as u64;
        if declared_length != actual {
            let err = StorageError::LengthMismatch {
                declared: declared_length,
                actual,
            };
            error!(bucket = %bucket, key = %key, error = %err, "upload rejected");
            return Err(err);
        }

        let content_type =
            content_type.unwrap_or_else(|| content_type::resolve_bytes(key.file_name(), &data));
        debug!(
            bucket = %bucket,
            key = %key,
            content_type = %content_type,
            size = actual,
            "uploading buffer"
        );

        let result = self
            .backend
            .put_object(bucket, key, data, content_type.as_str())
            .await
            .map(|outcome| Self::receipt(bucket, key, &content_type, outcome));

        Self::log_upload(bucket, key, result)
    }

    async fn upload_file(
        &self,
        bucket: &BucketName,
        file_path: &Path,
        key: &ObjectKey,
        content_type: Option<ContentType>,
    ) -> StorageResult<UploadReceipt> {
        let content_type = match content_type {
            Some(content_type) => content_type,
            None => content_type::resolve_file(file_path).await,
        };
        debug!(
            bucket = %bucket,
            key = %key,
            path = %file_path.display(),
            content_type = %content_type,
            "uploading file"
        );

        let result = self
            .backend
            .put_file(bucket, key, file_path, content_type.as_str())
            .await
            .map(|outcome| Self::receipt(bucket, key, &content_type, outcome));

        Self::log_upload(bucket, key, result)
    }

    async fn upload(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        source: UploadSource,
        content_type: Option<ContentType>,
    ) -> StorageResult<UploadReceipt> {
        match source {
            UploadSource::Buffer {
                data,
                declared_length,
            } => {
                self.upload_buffer(bucket, key, data, declared_length, content_type)
                    .await
            }
            UploadSource::File(path) => self.upload_file(bucket, &path, key, content_type).await,
        }
    }

    async fn stat_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> StorageResult<Option<ObjectDescriptor>> {
        match self.backend.head_object(bucket, key).await {
            Ok(head) => Ok(Some(ObjectDescriptor::new(
                bucket,
                key,
                head.content_type
                    .unwrap_or_else(|| ContentType::OCTET_STREAM.to_string()),
                head.size,
                head.last_modified,
                head.etag,
            ))),
            Err(StorageError::ObjectNotFound { .. }) => {
                debug!(bucket = %bucket, key = %key, "object not found");
                Ok(None)
            }
            Err(err) => {
                error!(bucket = %bucket, key = %key, error = %err, "stat failed");
                Err(err)
            }
        }
    }

    async fn presigned_url(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        expiry: Duration,
    ) -> StorageResult<String> {
        match self.backend.presign_get(bucket, key, expiry).await {
            Ok(url) => {
                debug!(bucket = %bucket, key = %key, expiry_secs = expiry.as_secs(), "presigned GET");
                Ok(url)
            }
            Err(err) => {
                error!(bucket = %bucket, key = %key, error = %err, "presign failed");
                Err(err)
            }
        }
    }
}
