mod bucket_service;
mod deletion_service;
mod object_service;

pub use bucket_service::BucketService;
pub use deletion_service::DeletionService;
pub use object_service::ObjectService;
