//! Retry logic for API calls with per-class attempt budgets.

use std::time::Duration;

use log::{debug, warn};

use crate::error::ApiError;

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after a 5xx response (not counting the initial request).
    pub server_retries: u32,
    /// Retries after a 429 response.
    pub rate_limit_retries: u32,
    /// Retries after a connection-level failure.
    pub network_retries: u32,
    /// Delay before the first retry, and the rate-limit wait when the server
    /// sends no `Retry-After`.
    pub initial_delay: Duration,
    /// Ceiling for every wait, including server-provided hints.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each retry.
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            server_retries: 3,
            rate_limit_retries: 1,
            network_retries: 1,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    /// A config that never retries.
    pub fn none() -> Self {
        Self {
            server_retries: 0,
            rate_limit_retries: 0,
            network_retries: 0,
            ..Self::default()
        }
    }

    /// Calculate delay for a given retry (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_millis() as f64 * self.backoff_factor.powi(attempt as i32);
        let capped = base.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }

    /// Wait before retrying a rate-limited request.
    pub fn rate_limit_delay(&self, retry_after: Option<Duration>) -> Duration {
        retry_after.unwrap_or(self.initial_delay).min(self.max_delay)
    }
}

/// Attempts used so far in each failure class. The rate-limit count only
/// covers the current run of consecutive 429s.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Budget {
    server: u32,
    rate_limit: u32,
    network: u32,
}

impl Budget {
    /// Consumes one retry for the class of `error` and returns the wait
    /// before it, or `None` when the error must surface.
    fn next_delay(&mut self, config: &RetryConfig, error: &ApiError) -> Option<Duration> {
        if !matches!(error, ApiError::RateLimited { .. }) {
            self.rate_limit = 0;
        }

        match error {
            ApiError::RateLimited { retry_after, .. } => {
                if self.rate_limit >= config.rate_limit_retries {
                    return None;
                }
                self.rate_limit += 1;
                Some(config.rate_limit_delay(*retry_after))
            }
            ApiError::ServerError {
                decode_failure: false,
                ..
            } => {
                if self.server >= config.server_retries {
                    return None;
                }
                let delay = config.delay_for_attempt(self.server);
                self.server += 1;
                Some(delay)
            }
            ApiError::NetworkError { .. } => {
                if self.network >= config.network_retries {
                    return None;
                }
                let delay = config.delay_for_attempt(self.network);
                self.network += 1;
                Some(delay)
            }
            _ => None,
        }
    }
}

/// Executes an async operation with retry logic.
///
/// Transient failures (429, 5xx, connection errors) are retried within their
/// class budget; everything else surfaces on the first occurrence. The last
/// error is returned unchanged once a budget runs out.
pub async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    operation_name: &str,
    operation: F,
) -> Result<T, ApiError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, ApiError>>,
{
    let mut budget = Budget::default();
    let mut attempt = 1u32;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                let Some(delay) = budget.next_delay(config, &e) else {
                    debug!("{}: giving up after attempt {}: {}", operation_name, attempt, e);
                    return Err(e);
                };
                warn!(
                    "{}: attempt {} failed ({}), retrying in {}ms...",
                    operation_name,
                    attempt,
                    e,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
