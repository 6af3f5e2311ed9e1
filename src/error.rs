//! Typed failure outcomes of a Sensibo API call.

use std::time::Duration;

/// Errors returned by the request executor and every endpoint wrapper.
///
/// Each variant names the cause of the failure so callers can apply their own
/// policy: stop on `AuthenticationFailed`, back off on `RateLimited`, and so on.
#[derive(Debug)]
pub enum ApiError {
    /// The API key was rejected (HTTP 401 or 403). Never retried.
    AuthenticationFailed { status: u16 },
    /// HTTP 429 persisted after the rate-limit retry.
    RateLimited {
        status: u16,
        retry_after: Option<Duration>,
    },
    /// HTTP 404.
    NotFound { body: String },
    /// Any other 4xx status.
    ClientError { status: u16, body: String },
    /// HTTP 5xx after retries were exhausted, or an undecodable success body.
    ServerError {
        status: Option<u16>,
        body: String,
        decode_failure: bool,
    },
    /// Connection-level failure: timeout, DNS, refused or reset connection.
    NetworkError { message: String, timeout: bool },
    /// The request could not be built, e.g. from a malformed base URL. Never retried.
    InvalidRequest { message: String },
}

impl ApiError {
    /// Builds the error used when a payload could not be decoded.
    pub fn decode(status: Option<u16>, message: impl Into<String>) -> Self {
        ApiError::ServerError {
            status,
            body: message.into(),
            decode_failure: true,
        }
    }

    /// Raw HTTP status code, when the failure carried one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::AuthenticationFailed { status }
            | ApiError::RateLimited { status, .. }
            | ApiError::ClientError { status, .. } => Some(*status),
            ApiError::NotFound { .. } => Some(404),
            ApiError::ServerError { status, .. } => *status,
            ApiError::NetworkError { .. } | ApiError::InvalidRequest { .. } => None,
        }
    }

    /// Server-provided hint for how long to wait before calling again.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ApiError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// True when a 2xx body could not be decoded into a JSON object.
    pub fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            ApiError::ServerError {
                decode_failure: true,
                ..
            }
        )
    }

    /// Whether the failure class is transient and may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::RateLimited { .. } | ApiError::NetworkError { .. } => true,
            ApiError::ServerError { decode_failure, .. } => !decode_failure,
            _ => false,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::AuthenticationFailed { status } => {
                write!(
                    f,
                    "Authentication failed (HTTP {}). Check your SENSIBO_API_KEY.",
                    status
                )
            }
            ApiError::RateLimited { retry_after, .. } => match retry_after {
                Some(wait) => write!(
                    f,
                    "Rate limit exceeded. Try again in {} seconds.",
                    wait.as_secs()
                ),
                None => write!(f, "Rate limit exceeded. Try again later."),
            },
            ApiError::NotFound { body } => write!(f, "Not found: {}", body),
            ApiError::ClientError { status, body } => {
                write!(f, "Request error: HTTP {}: {}", status, body)
            }
            ApiError::ServerError {
                status,
                body,
                decode_failure: true,
            } => match status {
                Some(status) => write!(f, "Could not decode response (HTTP {}): {}", status, body),
                None => write!(f, "Could not decode response: {}", body),
            },
            ApiError::ServerError { status, body, .. } => match status {
                Some(status) => write!(f, "Server error: HTTP {}: {}", status, body),
                None => write!(f, "Server error: {}", body),
            },
            ApiError::NetworkError { message, timeout } => {
                if *timeout {
                    write!(f, "Request timed out: {}", message)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            ApiError::InvalidRequest { message } => write!(f, "Invalid request: {}", message),
        }
    }
}

impl std::error::Error for ApiError {}

/// Errors raised while constructing a client.
#[derive(Debug)]
pub enum BuildError {
    /// The key contains characters that cannot be sent in a header.
    InvalidApiKey,
    /// The underlying HTTP client could not be built.
    Http(reqwest::Error),
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::InvalidApiKey => write!(f, "API key contains invalid characters"),
            BuildError::Http(e) => write!(f, "Failed to build HTTP client: {}", e),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::InvalidApiKey => None,
            BuildError::Http(e) => Some(e),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    /// The request URL is dropped from the message: it may carry the API key.
    fn from(error: reqwest::Error) -> Self {
        let timeout = error.is_timeout();
        let builder = error.is_builder();
        let message = error.without_url().to_string();

        if builder {
            ApiError::InvalidRequest { message }
        } else {
            ApiError::NetworkError { message, timeout }
        }
    }
}
