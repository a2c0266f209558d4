//! S3-compatible backend (MinIO, AWS S3, and anything speaking the same API)
//! built on the `object_store` crate.

mod s3_backend;

pub use s3_backend::S3Backend;
