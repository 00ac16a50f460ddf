//! Outbound HTTP transport.
//!
//! Generated tools never talk to `reqwest` directly. They describe a call as a
//! [`TransportRequest`] and hand it to an [`HttpTransport`]; [`ReqwestTransport`] is the
//! production implementation, tests swap in recording fakes.

use crate::safety::sanitize_reqwest_error;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde_json::{Value, json};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("invalid header '{name}': {message}")]
    InvalidHeader { name: String, message: String },

    /// The API answered with a non-2xx status.
    #[error("API returned status code {status} ({reason})")]
    Status {
        status: u16,
        reason: String,
        body: String,
    },

    /// Network failure, timeout, or an unreadable response body.
    #[error("API request failed: {0}")]
    Request(String),
}

impl TransportError {
    /// Extra context worth showing to a caller (the API's error body), if any.
    #[must_use]
    pub fn details(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } if !body.trim().is_empty() => Some(body),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// HTTP verbs that may key an operation inside an OpenAPI path item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
        HttpMethod::Trace,
    ];

    /// Lowercase form, as used for path-item keys and tool-name prefixes.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
            HttpMethod::Trace => "trace",
        }
    }

    #[must_use]
    pub fn to_reqwest(self) -> Method {
        match self {
            HttpMethod::Get => Method::GET,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Post => Method::POST,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Options => Method::OPTIONS,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Trace => Method::TRACE,
        }
    }
}

impl FromStr for HttpMethod {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == lower)
            .ok_or_else(|| TransportError::UnsupportedMethod(s.to_string()))
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

/// A fully-resolved outbound call: no templates, no absent values.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: HttpMethod,
    /// Path relative to the API base URL, with path parameters already substituted.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    /// JSON payload; `None` means no body is sent.
    pub body: Option<Value>,
}

impl TransportRequest {
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }
}

/// The transport collaborator every generated tool delegates to.
///
/// Implementations must be safe to share across concurrent tool invocations.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform the call and return the response as JSON.
    ///
    /// Bodies that are not valid JSON come back as `{"raw_response": "<text>"}`.
    async fn request(&self, request: TransportRequest) -> Result<Value>;
}

/// [`HttpTransport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
    default_headers: Vec<(String, String)>,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    #[must_use]
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            default_headers: Vec::new(),
            timeout: None,
        }
    }

    /// Headers sent on every call. Per-call headers with the same name win.
    #[must_use]
    pub fn with_default_headers(
        mut self,
        headers: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.default_headers.extend(headers);
        self
    }

    /// Per-call timeout. `None` leaves the client's own behaviour in place.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_url(&self, path: &str, query: &[(String, String)]) -> Result<Url> {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        let raw = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let mut url = Url::parse(&raw).map_err(|e| TransportError::InvalidUrl {
            url: raw.clone(),
            message: e.to_string(),
        })?;

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }

        Ok(url)
    }

    fn build_headers(&self, request_headers: &[(String, String)]) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        for (name, value) in self.default_headers.iter().chain(request_headers) {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                    TransportError::InvalidHeader {
                        name: name.clone(),
                        message: e.to_string(),
                    }
                })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| TransportError::InvalidHeader {
                    name: name.clone(),
                    message: e.to_string(),
                })?;
            headers.insert(header_name, header_value);
        }

        Ok(headers)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn request(&self, request: TransportRequest) -> Result<Value> {
        let url = self.build_url(&request.path, &request.query)?;
        let headers = self.build_headers(&request.headers)?;

        tracing::debug!(method = %request.method, path = %request.path, "outbound API call");

        let mut builder = self
            .client
            .request(request.method.to_reqwest(), url)
            .headers(headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Request(sanitize_reqwest_error(&e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Request(sanitize_reqwest_error(&e)))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
                body: text,
            });
        }

        Ok(parse_response_body(&text))
    }
}

/// Parse a response body as JSON, falling back to `{"raw_response": text}`.
#[must_use]
pub fn parse_response_body(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| json!({ "raw_response": text }))
}
