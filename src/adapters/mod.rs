pub mod http;
pub mod store;

pub use http::{ApiError, HttpCloudApi};
pub use store::MemoryStore;
