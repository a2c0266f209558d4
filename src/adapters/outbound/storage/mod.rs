// Infrastructure error types
pub mod error;

// Shared object transfers and bucket-level requests
pub mod bucket;
pub mod transfer;

// Backends
pub mod memory;
pub mod s3;

// Re-export key types
pub use error::{ConnectError, StoreError};
pub use memory::InMemoryBackend;
pub use s3::S3Backend;
