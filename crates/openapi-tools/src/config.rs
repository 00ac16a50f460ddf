use crate::error::{OpenApiToolsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Assignment name the spec is embedded under in `swagger-ui-init.js` bundles.
pub const DEFAULT_EMBEDDED_KEY: &str = "swaggerDoc";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 30;

/// Configuration for one OpenAPI-backed tool source.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSourceConfig {
    /// Spec location (http(s) URL serving JSON or a JavaScript bundle).
    pub spec: String,

    /// API base URL. When absent it is derived from the spec (`servers` / `host` + `basePath`).
    #[serde(default)]
    pub base_url: Option<String>,

    /// Name of the assignment holding the spec inside a script payload.
    #[serde(default = "default_embedded_key")]
    pub embedded_key: String,

    /// Optional spec hash (`sha256:<hex>`) for version detection.
    #[serde(default)]
    pub spec_hash: Option<String>,

    /// Hash policy: warn, fail, or ignore.
    #[serde(default)]
    pub spec_hash_policy: HashPolicy,

    /// Headers sent with every API call (auth tokens, tenant ids, ...).
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Timeout in seconds for the spec request and each API call. `0` disables it.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Bound on spec acquisition + registration.
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,
}

fn default_embedded_key() -> String {
    DEFAULT_EMBEDDED_KEY.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_startup_timeout_secs() -> u64 {
    DEFAULT_STARTUP_TIMEOUT_SECS
}

impl ApiSourceConfig {
    /// Config with every optional field at its default.
    #[must_use]
    pub fn new(spec: impl Into<String>) -> Self {
        Self {
            spec: spec.into(),
            base_url: None,
            embedded_key: default_embedded_key(),
            spec_hash: None,
            spec_hash_policy: HashPolicy::default(),
            headers: BTreeMap::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            startup_timeout_secs: DEFAULT_STARTUP_TIMEOUT_SECS,
        }
    }

    /// Parse a YAML (or JSON, which is a YAML subset) config document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not deserialize or fails validation.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and parse a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Check the invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`OpenApiToolsError::Config`] describing the first violated rule.
    pub fn validate(&self) -> Result<()> {
        if !(self.spec.starts_with("http://") || self.spec.starts_with("https://")) {
            return Err(OpenApiToolsError::Config(format!(
                "spec must be an http(s) URL, got '{}'",
                self.spec
            )));
        }
        if self.embedded_key.is_empty() {
            return Err(OpenApiToolsError::Config(
                "embeddedKey must not be empty".to_string(),
            ));
        }
        if let Some(hash) = &self.spec_hash
            && !hash.starts_with("sha256:")
        {
            return Err(OpenApiToolsError::Config(format!(
                "specHash must look like 'sha256:<hex>', got '{hash}'"
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn call_timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    #[must_use]
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }
}

/// Hash verification policy.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HashPolicy {
    /// Log warning if hash doesn't match.
    #[default]
    Warn,
    /// Fail startup if hash doesn't match.
    Fail,
    /// Ignore hash verification.
    Ignore,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_yaml_fills_defaults() {
        let cfg =
            ApiSourceConfig::from_yaml_str("spec: https://petstore.swagger.io/v2/swagger.json")
                .unwrap();
        assert_eq!(cfg.embedded_key, "swaggerDoc");
        assert_eq!(cfg.spec_hash_policy, HashPolicy::Warn);
        assert_eq!(cfg.call_timeout(), Some(Duration::from_secs(30)));
        assert!(cfg.base_url.is_none());
        assert!(cfg.headers.is_empty());
    }

    #[test]
    fn camel_case_fields_and_zero_timeout() {
        let cfg = ApiSourceConfig::from_yaml_str(
            r"
spec: https://app.example.com/api/docs/swagger-ui-init.js
baseUrl: https://app.example.com
embeddedKey: spec
specHash: sha256:abcd
specHashPolicy: fail
headers:
  X-Api-Key: secret
timeoutSecs: 0
",
        )
        .unwrap();
        assert_eq!(cfg.base_url.as_deref(), Some("https://app.example.com"));
        assert_eq!(cfg.embedded_key, "spec");
        assert_eq!(cfg.spec_hash_policy, HashPolicy::Fail);
        assert_eq!(cfg.headers.get("X-Api-Key").map(String::as_str), Some("secret"));
        assert_eq!(cfg.call_timeout(), None);
    }

    #[test]
    fn rejects_non_http_spec_and_bad_hash() {
        assert!(matches!(
            ApiSourceConfig::from_yaml_str("spec: ./swagger.json"),
            Err(OpenApiToolsError::Config(_))
        ));
        assert!(matches!(
            ApiSourceConfig::from_yaml_str("spec: https://x.test/s.json\nspecHash: md5:1"),
            Err(OpenApiToolsError::Config(_))
        ));
    }

    #[test]
    fn reads_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source.json");
        std::fs::write(&path, r#"{"spec": "http://127.0.0.1:1/swagger.json"}"#).unwrap();
        let cfg = ApiSourceConfig::from_file(&path).unwrap();
        assert_eq!(cfg.spec, "http://127.0.0.1:1/swagger.json");
    }
}
