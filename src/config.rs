//! Client configuration.

use std::time::Duration;

use crate::credential::CredentialPlacement;
use crate::http::RetryConfig;

/// Public Sensibo API host.
pub const DEFAULT_BASE_URL: &str = "https://home.sensibo.com";

/// Total per-request timeout applied by the pooled HTTP client.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Settings shared by every call a client makes.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub retry: RetryConfig,
    pub credential_placement: CredentialPlacement,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryConfig::default(),
            credential_placement: CredentialPlacement::default(),
            user_agent: format!("sensibo-rs/{}", env!("SENSIBO_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Overrides the API host, e.g. for a proxy or a test server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_credential_placement(mut self, placement: CredentialPlacement) -> Self {
        self.credential_placement = placement;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://home.sensibo.com");
        assert_eq!(config.timeout, Duration::from_secs(300));
        assert_eq!(config.credential_placement, CredentialPlacement::Header);
        assert_eq!(config.retry.server_retries, 3);
        assert_eq!(config.retry.rate_limit_retries, 1);
        assert_eq!(config.retry.network_retries, 1);
        assert!(config.user_agent.starts_with("sensibo-rs/"));
    }

    #[test]
    fn test_with_base_url_trims_slash() {
        let config = ClientConfig::default().with_base_url("http://127.0.0.1:1234/");
        assert_eq!(config.base_url, "http://127.0.0.1:1234");
    }

    #[test]
    fn test_builder_methods() {
        let config = ClientConfig::default()
            .with_timeout(Duration::from_secs(10))
            .with_retry(RetryConfig::none())
            .with_credential_placement(CredentialPlacement::Query);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.retry.server_retries, 0);
        assert_eq!(config.credential_placement, CredentialPlacement::Query);
    }
}
