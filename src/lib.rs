//! Async client for the Sensibo cloud API.
//!
//! Every call goes through one request executor that attaches the API key,
//! retries transient failures and turns responses into typed results.

pub mod client;
pub mod commands;
pub mod config;
pub mod credential;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod model;

pub use client::{ALL_FIELDS, Calibration, SensiboApi, SensiboClient};
pub use config::ClientConfig;
pub use credential::{ApiKey, CredentialPlacement};
pub use error::{ApiError, BuildError};
pub use http::{JsonObject, RetryConfig};
pub use model::{SensiboData, SensiboDevice};
