//! API key handling.

use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue, InvalidHeaderValue};

/// Query parameter name the vendor accepts the key under.
pub const API_KEY_PARAM: &str = "apiKey";

/// Where the API key is attached on outgoing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialPlacement {
    /// `Authorization: Bearer <key>`
    #[default]
    Header,
    /// `?apiKey=<key>`
    Query,
}

/// A Sensibo API key from <https://home.sensibo.com/me/api>.
///
/// Immutable once built; the raw value only leaves this type when a request
/// is being assembled.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }

    /// Key with everything but the first and last four characters hidden.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 8 {
            return "*".repeat(chars.len());
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}*********{}", head, tail)
    }

    /// The `Authorization` header value, marked sensitive.
    pub(crate) fn header_value(&self) -> Result<(HeaderName, HeaderValue), InvalidHeaderValue> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.0))?;
        value.set_sensitive(true);
        Ok((AUTHORIZATION, value))
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ApiKey").field(&self.masked()).finish()
    }
}
