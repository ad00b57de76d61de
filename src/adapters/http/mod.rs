mod client;

pub use client::{ApiError, HttpCloudApi};
