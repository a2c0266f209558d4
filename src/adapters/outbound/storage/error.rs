use std::io;
use std::path::PathBuf;

use thiserror::Error as ThisError;

use crate::domain::{
    errors::StorageError,
    value_objects::{BucketName, ObjectKey},
};

/// Failure to build the store handle. Fatal at startup.
#[derive(ThisError, Debug)]
pub enum ConnectError {
    #[error("Invalid store endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Failed to build store client: {0}")]
    Client(String),
}

/// Infrastructure-level failures raised inside the storage adapters
#[derive(ThisError, Debug)]
pub enum StoreError {
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("Invalid object path: {0}")]
    Path(#[from] object_store::path::Error),

    #[error("Object key '{key}' would be stored as '{stored}'")]
    KeyRewritten { key: String, stored: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Cannot read '{}': {source}", .path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP error: {status} - {message}")]
    Http {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Convert into a domain error, attaching what was being attempted and on what
    pub fn into_storage_error(
        self,
        operation: &str,
        bucket: &BucketName,
        key: Option<&ObjectKey>,
    ) -> StorageError {
        let bucket_name = bucket.to_string();
        let key_name = key.map(|k| k.to_string());

        match self {
            StoreError::ObjectStore(err) => match err {
                object_store::Error::NotFound { .. } => match key_name {
                    Some(key) => StorageError::ObjectNotFound {
                        bucket: bucket_name,
                        key,
                    },
                    None => StorageError::BucketNotFound {
                        bucket: bucket_name,
                    },
                },
                object_store::Error::PermissionDenied { .. }
                | object_store::Error::Unauthenticated { .. } => StorageError::AccessDenied {
                    bucket: bucket_name,
                    key: key_name,
                    operation: operation.to_string(),
                },
                object_store::Error::NotSupported { .. } => StorageError::UnsupportedOperation {
                    operation: operation.to_string(),
                    reason: err.to_string(),
                },
                _ => StorageError::InfrastructureError {
                    message: format!("{} failed", operation),
                    source: Some(err.to_string()),
                },
            },
            StoreError::Path(err) => StorageError::ValidationError {
                message: format!("Invalid object key: {}", err),
            },
            StoreError::KeyRewritten { key, stored } => StorageError::ValidationError {
                message: format!("Object key '{}' would be stored as '{}'", key, stored),
            },
            StoreError::Source { path, source } => StorageError::SourceUnreadable {
                path: path.display().to_string(),
                message: source.to_string(),
            },
            StoreError::Http {
                status,
                code,
                message,
            } => match (status, code.as_deref()) {
                (404, Some("NoSuchKey")) => StorageError::ObjectNotFound {
                    bucket: bucket_name,
                    key: key_name.unwrap_or_default(),
                },
                (404, _) if key_name.is_none() => StorageError::BucketNotFound {
                    bucket: bucket_name,
                },
                (403, _) => StorageError::AccessDenied {
                    bucket: bucket_name,
                    key: key_name,
                    operation: operation.to_string(),
                },
                (409, Some("BucketAlreadyOwnedByYou" | "BucketAlreadyExists")) => {
                    StorageError::BucketAlreadyExists {
                        bucket: bucket_name,
                    }
                }
                _ => StorageError::InfrastructureError {
                    message: format!("{} failed with HTTP {}", operation, status),
                    source: Some(match &code {
                        Some(code) => format!("{}: {}", code, message),
                        None => message,
                    }),
                },
            },
            other => StorageError::InfrastructureError {
                message: format!("{} failed", operation),
                source: Some(other.to_string()),
            },
        }
    }
}
