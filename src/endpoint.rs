//! Per-call endpoint descriptors.

use std::time::Duration;

use reqwest::Method;

/// API generation an endpoint lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    V1,
    V2,
}

impl ApiVersion {
    pub fn prefix(&self) -> &'static str {
        match self {
            ApiVersion::V1 => "/api/v1",
            ApiVersion::V2 => "/api/v2",
        }
    }
}

/// Method, path template and query of one API call.
///
/// Templates use `{name}` placeholders, filled from [`Endpoint::param`].
/// Placeholders without a value are left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub method: Method,
    pub version: ApiVersion,
    pub template: &'static str,
    pub path_params: Vec<(&'static str, String)>,
    pub query: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl Endpoint {
    pub fn new(method: Method, version: ApiVersion, template: &'static str) -> Self {
        Self {
            method,
            version,
            template,
            path_params: Vec::new(),
            query: Vec::new(),
            timeout: None,
        }
    }

    pub fn get(version: ApiVersion, template: &'static str) -> Self {
        Self::new(Method::GET, version, template)
    }

    pub fn post(version: ApiVersion, template: &'static str) -> Self {
        Self::new(Method::POST, version, template)
    }

    pub fn put(version: ApiVersion, template: &'static str) -> Self {
        Self::new(Method::PUT, version, template)
    }

    pub fn patch(version: ApiVersion, template: &'static str) -> Self {
        Self::new(Method::PATCH, version, template)
    }

    pub fn delete(version: ApiVersion, template: &'static str) -> Self {
        Self::new(Method::DELETE, version, template)
    }

    pub fn param(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.path_params.push((name, value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Per-call deadline for a single attempt, on top of the client timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Path below the host, with the version prefix and parameters filled in.
    pub fn path(&self) -> String {
        let mut path = String::from(self.version.prefix());
        let mut rest = self.template;

        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            let name = &rest[start + 1..start + len];
            path.push_str(&rest[..start]);
            match self.path_params.iter().find(|(n, _)| *n == name) {
                Some((_, value)) => path.push_str(&urlencoding::encode(value)),
                None => path.push_str(&rest[start..=start + len]),
            }
            rest = &rest[start + len + 1..];
        }
        path.push_str(rest);
        path
    }

    /// Absolute URL against `base_url`, without the query string.
    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path())
    }
}
