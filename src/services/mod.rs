mod bucket_service_impl;
mod deletion_service_impl;
mod object_service_impl;

pub use bucket_service_impl::{BucketServiceImpl, DEFAULT_BUCKET_TIMEOUT};
pub use deletion_service_impl::{DeletionServiceImpl, CHANNEL_CAPACITY, DELETE_CONCURRENCY};
pub use object_service_impl::ObjectServiceImpl;
