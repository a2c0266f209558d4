mod store_backend;

pub use store_backend::{ObjectHead, PutOutcome, StoreBackend};
