//! Spec acquisition: one GET, then dispatch on the response content type.

use crate::config::HashPolicy;
use crate::embedded;
use crate::error::SpecError;
use crate::model::SpecDocument;
use apibridge_http_tools::safety::{redact_url, sanitize_reqwest_error};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::time::Duration;
use url::Url;

/// How a spec payload is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecFormat {
    Json,
    /// JavaScript bundle with the spec assigned inside it.
    Script,
}

impl SpecFormat {
    /// Classify a `Content-Type` header value. Parameters (`; charset=utf-8`) are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::UnsupportedFormat`] for anything that is neither JSON nor script.
    pub fn from_content_type(content_type: &str) -> Result<Self, SpecError> {
        let unsupported = || SpecError::UnsupportedFormat {
            content_type: content_type.to_string(),
        };
        let parsed: mime::Mime = content_type.parse().map_err(|_| unsupported())?;

        let subtype = parsed.subtype().as_str();
        if matches!(subtype, "javascript" | "x-javascript" | "ecmascript") {
            return Ok(Self::Script);
        }
        if parsed.subtype() == mime::JSON || parsed.suffix() == Some(mime::JSON) {
            return Ok(Self::Json);
        }
        Err(unsupported())
    }
}

/// The raw spec response, kept around for hashing before it is parsed.
#[derive(Debug, Clone)]
pub struct FetchedSpec {
    /// Redacted source URL, used in error messages.
    pub location: String,
    pub content_type: String,
    pub body: String,
}

impl FetchedSpec {
    /// Decode the body into JSON according to its content type.
    ///
    /// # Errors
    ///
    /// Returns format, extraction or parse errors.
    pub fn to_json(&self, embedded_key: &str) -> Result<Value, SpecError> {
        match SpecFormat::from_content_type(&self.content_type)? {
            SpecFormat::Script => embedded::extract(&self.body, embedded_key),
            SpecFormat::Json => {
                serde_json::from_str(&self.body).map_err(|source| SpecError::Parse {
                    location: self.location.clone(),
                    source,
                })
            }
        }
    }

    /// Decode and parse into a [`SpecDocument`].
    ///
    /// # Errors
    ///
    /// See [`FetchedSpec::to_json`] and [`SpecDocument::from_value`].
    pub fn parse(&self, embedded_key: &str) -> Result<SpecDocument, SpecError> {
        SpecDocument::from_value(&self.to_json(embedded_key)?)
    }
}

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches spec documents over HTTP.
#[derive(Debug, Clone)]
pub struct SpecAcquirer {
    client: Client,
    embedded_key: String,
    timeout: Option<Duration>,
}

impl SpecAcquirer {
    #[must_use]
    pub fn new(client: Client, embedded_key: impl Into<String>) -> Self {
        Self {
            client,
            embedded_key: embedded_key.into(),
            timeout: Some(DEFAULT_FETCH_TIMEOUT),
        }
    }

    /// Bound the spec request; an elapsed timeout is a [`SpecError::Fetch`]. `None` leaves it
    /// unbounded.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn embedded_key(&self) -> &str {
        &self.embedded_key
    }

    /// Fetch and parse the spec at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::Fetch`] on transport failure (including non-2xx), or any decoding
    /// error from [`FetchedSpec::parse`].
    pub async fn fetch(&self, url: &str) -> Result<SpecDocument, SpecError> {
        self.fetch_raw(url).await?.parse(&self.embedded_key)
    }

    /// Perform the GET and return the unparsed response.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::Fetch`] on transport failure, timeout or a non-2xx status.
    pub async fn fetch_raw(&self, url: &str) -> Result<FetchedSpec, SpecError> {
        let parsed = Url::parse(url).map_err(|e| SpecError::Fetch {
            url: url.to_string(),
            message: format!("invalid URL: {e}"),
        })?;
        let location = redact_url(&parsed);
        let fetch_err = |message: String| SpecError::Fetch {
            url: location.clone(),
            message,
        };

        tracing::info!(url = %location, "fetching API spec");

        let mut request = self.client.get(parsed);
        if let Some(t) = self.timeout {
            request = request.timeout(t);
        }
        let response = request
            .send()
            .await
            .map_err(|e| fetch_err(sanitize_reqwest_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_err(format!("HTTP status {status}")));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let body = response
            .text()
            .await
            .map_err(|e| fetch_err(sanitize_reqwest_error(&e)))?;

        tracing::debug!(
            url = %location,
            content_type = %content_type,
            bytes = body.len(),
            "fetched API spec"
        );

        Ok(FetchedSpec {
            location,
            content_type,
            body,
        })
    }
}

/// `sha256:<hex>` digest of a raw spec body.
#[must_use]
pub fn spec_hash(body: &str) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(body.as_bytes())))
}

/// Compare the digest of `body` with an expected `sha256:<hex>` value under `policy`.
///
/// # Errors
///
/// Returns [`SpecError::HashMismatch`] only under [`HashPolicy::Fail`].
pub fn verify_spec_hash(
    body: &str,
    expected: Option<&str>,
    policy: HashPolicy,
) -> Result<(), SpecError> {
    let Some(expected) = expected else {
        return Ok(());
    };
    if policy == HashPolicy::Ignore {
        return Ok(());
    }

    let actual = spec_hash(body);
    if actual.eq_ignore_ascii_case(expected) {
        return Ok(());
    }

    match policy {
        HashPolicy::Fail => Err(SpecError::HashMismatch {
            expected: expected.to_string(),
            actual,
        }),
        HashPolicy::Warn => {
            tracing::warn!(
                expected = %expected,
                actual = %actual,
                "spec hash mismatch"
            );
            Ok(())
        }
        HashPolicy::Ignore => Ok(()),
    }
}
