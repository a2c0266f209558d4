pub mod connection;
pub mod object;

pub use connection::{StoreConnection, DEFAULT_REGION};
pub use object::*;
