use std::time::Duration;

use super::ValidationError;

/// Errors that can occur during storage operations
#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    /// Object not found
    ObjectNotFound { bucket: String, key: String },

    /// Bucket not found
    BucketNotFound { bucket: String },

    /// Bucket already exists (create on an existing bucket)
    BucketAlreadyExists { bucket: String },

    /// Access denied by the store
    AccessDenied {
        bucket: String,
        key: Option<String>,
        operation: String,
    },

    /// Operation exceeded its deadline
    Timeout { operation: String, after: Duration },

    /// Declared upload length disagrees with the supplied buffer
    LengthMismatch { declared: u64, actual: u64 },

    /// Local upload source could not be read
    SourceUnreadable { path: String, message: String },

    /// Validation error
    ValidationError { message: String },

    /// Unsupported operation
    UnsupportedOperation { operation: String, reason: String },

    /// Infrastructure error with external source
    InfrastructureError {
        message: String,
        source: Option<String>, // Store error as string to allow Clone
    },
}

impl StorageError {
    /// Whether the store reported the object as missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::ObjectNotFound { .. })
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::ObjectNotFound { bucket, key } => {
                write!(f, "Object not found: {}/{}", bucket, key)
            }
            StorageError::BucketNotFound { bucket } => {
                write!(f, "Bucket not found: {}", bucket)
            }
            StorageError::BucketAlreadyExists { bucket } => {
                write!(f, "Bucket already exists: {}", bucket)
            }
            StorageError::AccessDenied {
                bucket,
                key,
                operation,
            } => match key {
                Some(key) => write!(
                    f,
                    "Access denied for operation '{}' on object: {}/{}",
                    operation, bucket, key
                ),
                None => write!(
                    f,
                    "Access denied for operation '{}' on bucket: {}",
                    operation, bucket
                ),
            },
            StorageError::Timeout { operation, after } => {
                write!(f, "Operation '{}' timed out after {:?}", operation, after)
            }
            StorageError::LengthMismatch { declared, actual } => {
                write!(
                    f,
                    "Declared length {} does not match buffer length {}",
                    declared, actual
                )
            }
            StorageError::SourceUnreadable { path, message } => {
                write!(f, "Cannot read upload source '{}': {}", path, message)
            }
            StorageError::ValidationError { message } => {
                write!(f, "Validation error: {}", message)
            }
            StorageError::UnsupportedOperation { operation, reason } => {
                write!(f, "Unsupported operation '{}': {}", operation, reason)
            }
            StorageError::InfrastructureError { message, source } => match source {
                Some(source) if source != message => {
                    write!(f, "Infrastructure error: {} ({})", message, source)
                }
                _ => write!(f, "Infrastructure error: {}", message),
            },
        }
    }
}

impl std::error::Error for StorageError {}

impl From<ValidationError> for StorageError {
    fn from(err: ValidationError) -> Self {
        StorageError::ValidationError {
            message: err.to_string(),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
