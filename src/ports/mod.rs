pub mod services;
pub mod storage;

// Re-export all port traits for convenience
pub use services::{BucketService, DeletionService, ObjectService};
pub use storage::{ObjectHead, PutOutcome, StoreBackend};
