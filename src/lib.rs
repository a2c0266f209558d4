pub mod adapters;
pub mod app;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export key types for convenience

// Domain types - value objects, models and errors
pub use domain::{
    BucketName, ContentType, DeletionOutcome, DeletionRequest, DomainValidationError,
    ObjectDescriptor, ObjectKey, StorageError, StorageResult, StoreConnection, UploadReceipt,
    UploadSource,
};

// Port types - interfaces for the store and the services
pub use ports::{BucketService, DeletionService, ObjectHead, ObjectService, PutOutcome, StoreBackend};

// Service implementations
pub use services::{BucketServiceImpl, DeletionServiceImpl, ObjectServiceImpl};

// Application factory and configuration
pub use app::{
    connect, create_app_from_env, create_in_memory_app, create_s3_app, AppBuilder, AppConfig,
    AppError, AppServices, StorageBackend,
};

// Adapter types - store handles
pub use adapters::outbound::storage::{ConnectError, InMemoryBackend, S3Backend};

// Public facade for easy construction
pub mod prelude {
    pub use crate::{
        connect, create_app_from_env, create_in_memory_app, AppBuilder, AppServices, BucketName,
        BucketService, ContentType, DeletionService, ObjectKey, ObjectService, StorageError,
        StoreConnection, UploadSource,
    };
}
