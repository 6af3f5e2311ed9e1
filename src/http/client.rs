//! Request executor: one logical API call with credential, retry and decoding.

use chrono::{DateTime, Utc};
use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

use super::JsonObject;
use super::retry::{RetryConfig, with_retry};
use crate::config::ClientConfig;
use crate::credential::{API_KEY_PARAM, ApiKey, CredentialPlacement};
use crate::endpoint::Endpoint;
use crate::error::{ApiError, BuildError};

/// HTTP client with built-in retry logic for Sensibo API calls.
///
/// Cloning is cheap and shares the connection pool; no other state is kept
/// between calls.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    api_key: ApiKey,
    auth: Auth,
    retry: RetryConfig,
}

/// How the key travels on each request.
#[derive(Clone)]
enum Auth {
    Header(HeaderName, HeaderValue),
    Query,
}

impl HttpClient {
    /// Builds a pooled reqwest client from `config`.
    pub fn new(config: &ClientConfig, api_key: ApiKey) -> Result<Self, BuildError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(BuildError::Http)?;
        Self::with_client(client, config, api_key)
    }

    /// Wraps an existing reqwest Client, e.g. one shared with the host application.
    pub fn with_client(
        client: Client,
        config: &ClientConfig,
        api_key: ApiKey,
    ) -> Result<Self, BuildError> {
        let auth = match config.credential_placement {
            CredentialPlacement::Header => {
                let (name, value) = api_key
                    .header_value()
                    .map_err(|_| BuildError::InvalidApiKey)?;
                Auth::Header(name, value)
            }
            CredentialPlacement::Query => Auth::Query,
        };
        debug!(
            "HTTP client for {} using API key {}",
            config.base_url,
            api_key.masked()
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            auth,
            retry: config.retry.clone(),
        })
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends `endpoint` with an optional JSON body and decodes the response
    /// object. Transient failures are retried according to the retry config.
    #[tracing::instrument(skip(self, body))]
    pub async fn execute(
        &self,
        endpoint: &Endpoint,
        body: Option<&Value>,
    ) -> Result<JsonObject, ApiError> {
        let url = endpoint.url(&self.base_url);
        let operation_name = format!("{} {}", endpoint.method, endpoint.path());
        debug!("{} with query {:?}...", operation_name, endpoint.query);

        with_retry(&self.retry, &operation_name, || {
            self.execute_once(endpoint, &url, body)
        })
        .await
    }

    /// Single round trip without retry.
    async fn execute_once(
        &self,
        endpoint: &Endpoint,
        url: &str,
        body: Option<&Value>,
    ) -> Result<JsonObject, ApiError> {
        let mut request = self
            .client
            .request(endpoint.method.clone(), url)
            .query(&endpoint.query);

        request = match &self.auth {
            Auth::Header(name, value) => request.header(name.clone(), value.clone()),
            Auth::Query => request.query(&[(API_KEY_PARAM, self.api_key.expose())]),
        };

        if let Some(timeout) = endpoint.timeout {
            request = request.timeout(timeout);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        let text = response.text().await?;

        decode_response(status, retry_after, &text)
    }
}

/// Maps a status and body to a decoded object or the matching error variant.
pub(crate) fn decode_response(
    status: StatusCode,
    retry_after: Option<Duration>,
    body: &str,
) -> Result<JsonObject, ApiError> {
    let code = status.as_u16();

    match status {
        StatusCode::NO_CONTENT => Ok(JsonObject::new()),
        s if s.is_success() => match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(ApiError::decode(
                Some(code),
                format!("expected a JSON object, got {}", json_kind(&other)),
            )),
            Err(e) => Err(ApiError::decode(Some(code), e.to_string())),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(ApiError::AuthenticationFailed { status: code })
        }
        StatusCode::NOT_FOUND => Err(ApiError::NotFound {
            body: body.to_string(),
        }),
        StatusCode::TOO_MANY_REQUESTS => Err(ApiError::RateLimited {
            status: code,
            retry_after,
        }),
        s if s.is_server_error() => Err(ApiError::ServerError {
            status: Some(code),
            body: body.to_string(),
            decode_failure: false,
        }),
        _ => Err(ApiError::ClientError {
            status: code,
            body: body.to_string(),
        }),
    }
}

/// Reads `Retry-After` as delta-seconds or an HTTP date.
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    let wait = at.signed_duration_since(Utc::now());
    Some(wait.to_std().unwrap_or(Duration::ZERO))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
