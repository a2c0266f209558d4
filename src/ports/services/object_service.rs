use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::{
    content_type::ContentType,
    errors::StorageResult,
    models::{ObjectDescriptor, UploadReceipt, UploadSource},
    value_objects::{BucketName, ObjectKey},
};

/// Port for writing and inspecting objects
#[async_trait]
pub trait ObjectService: Send + Sync + 'static {
    /// Upload an in-memory buffer. `declared_length` must equal `data.len()`.
    async fn upload_buffer(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        data: Bytes,
        declared_length: u64,
        content_type: Option<ContentType>,
    ) -> StorageResult<UploadReceipt>;

    /// Upload a local file, streaming it from disk
    async fn upload_file(
        &self,
        bucket: &BucketName,
        file_path: &Path,
        key: &ObjectKey,
        content_type: Option<ContentType>,
    ) -> StorageResult<UploadReceipt>;

    /// Upload from either kind of source
    async fn upload(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        source: UploadSource,
        content_type: Option<ContentType>,
    ) -> StorageResult<UploadReceipt>;

    /// Stat an object. `Ok(None)` means the store has no such key.
    async fn stat_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> StorageResult<Option<ObjectDescriptor>>;

    /// Presign a GET link that stays valid for `expiry`
    async fn presigned_url(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        expiry: Duration,
    ) -> StorageResult<String>;
}
