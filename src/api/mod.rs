pub mod client;
pub mod models;

pub use client::{describe_http_error, ApiClient, ApiError, Result};
pub use models::ApiConfig;
