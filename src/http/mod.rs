//! HTTP client module with retry logic and error handling.

mod client;
mod retry;

pub use client::HttpClient;
pub use retry::{RetryConfig, with_retry};

/// Decoded success payload: string keys to loosely-typed JSON values.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;
