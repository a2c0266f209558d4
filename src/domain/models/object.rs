use std::path::PathBuf;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{
    errors::StorageError,
    value_objects::{BucketName, ObjectKey},
};

/// Metadata about a stored object, as reported by a stat call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectDescriptor {
    pub bucket: String,
    pub key: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub last_modified: DateTime<Utc>,
    pub etag: Option<String>,
}

/// What the store acknowledged after an upload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadReceipt {
    pub bucket: String,
    pub key: String,
    pub size_bytes: u64,
    pub content_type: String,
    pub etag: Option<String>,
}

/// Where upload content comes from
#[derive(Debug, Clone)]
pub enum UploadSource {
    /// In-memory buffer with the length the caller claims it has
    Buffer { data: Bytes, declared_length: u64 },
    /// File on the local filesystem, streamed from disk
    File(PathBuf),
}

impl UploadSource {
    /// Buffer source whose declared length is taken from the data itself
    pub fn buffer(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let declared_length = data.len() as u64;
        UploadSource::Buffer {
            data,
            declared_length,
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        UploadSource::File(path.into())
    }
}

/// Keys to remove from one bucket. Duplicates are deleted independently.
#[derive(Debug, Clone)]
pub struct DeletionRequest {
    pub bucket: BucketName,
    pub keys: Vec<String>,
}

/// Result of one key in a bulk delete
#[derive(Debug, Clone, PartialEq)]
pub enum DeletionOutcome {
    Deleted { key: String },
    Failed { key: String, error: StorageError },
}

impl DeletionOutcome {
    pub fn key(&self) -> &str {
        match self {
            DeletionOutcome::Deleted { key } | DeletionOutcome::Failed { key, .. } => key,
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, DeletionOutcome::Deleted { .. })
    }

    pub fn error(&self) -> Option<&StorageError> {
        match self {
            DeletionOutcome::Deleted { .. } => None,
            DeletionOutcome::Failed { error, .. } => Some(error),
        }
    }
}

impl ObjectDescriptor {
    pub fn new(
        bucket: &BucketName,
        key: &ObjectKey,
        content_type: String,
        size_bytes: u64,
        last_modified: DateTime<Utc>,
        etag: Option<String>,
    ) -> Self {
        Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
            content_type,
            size_bytes,
            last_modified,
            etag,
        }
    }
}
