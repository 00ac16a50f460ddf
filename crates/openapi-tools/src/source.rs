//! Startup orchestration for one OpenAPI-backed tool source.

use crate::acquire::{SpecAcquirer, verify_spec_hash};
use crate::config::ApiSourceConfig;
use crate::driver::register_all;
use crate::error::{OpenApiToolsError, Result};
use crate::model::SpecDocument;
use crate::registry::{FrozenRegistry, ToolRegistry};
use apibridge_http_tools::safety::redact_url;
use apibridge_http_tools::transport::ReqwestTransport;
use reqwest::Client;
use std::sync::Arc;
use url::Url;

const USER_AGENT: &str = concat!("apibridge/", env!("CARGO_PKG_VERSION"));

/// Fetches a spec and turns it into a frozen registry of callable tools.
#[derive(Debug, Clone)]
pub struct ApiToolSource {
    config: ApiSourceConfig,
    client: Client,
}

/// What [`ApiToolSource::start`] produced.
#[derive(Debug)]
pub struct StartedSource {
    pub registry: FrozenRegistry,
    pub base_url: String,
    /// `info.title` of the spec, if any.
    pub title: Option<String>,
}

impl ApiToolSource {
    /// # Errors
    ///
    /// Returns [`OpenApiToolsError::Config`] for an invalid config and
    /// [`OpenApiToolsError::Startup`] if the HTTP client cannot be built.
    pub fn new(config: ApiSourceConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| OpenApiToolsError::Startup(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    #[must_use]
    pub fn config(&self) -> &ApiSourceConfig {
        &self.config
    }

    /// Acquire the spec, register every operation, and freeze the registry.
    ///
    /// Bounded by the configured startup timeout. Any failure aborts the whole registration.
    ///
    /// # Errors
    ///
    /// Returns spec, configuration (no usable base URL) or startup-timeout errors.
    pub async fn start(&self) -> Result<StartedSource> {
        let startup_timeout = self.config.startup_timeout();

        let startup = async {
            let acquirer = SpecAcquirer::new(self.client.clone(), self.config.embedded_key.clone())
                .with_timeout(self.config.call_timeout());
            let fetched = acquirer.fetch_raw(&self.config.spec).await?;
            verify_spec_hash(
                &fetched.body,
                self.config.spec_hash.as_deref(),
                self.config.spec_hash_policy,
            )?;
            let spec = fetched.parse(acquirer.embedded_key())?;
            let base_url = self.resolve_base_url(&spec)?;

            let transport = ReqwestTransport::with_client(self.client.clone(), base_url.clone())
                .with_default_headers(self.config.headers.clone())
                .with_timeout(self.config.call_timeout());

            let mut registry = ToolRegistry::new();
            register_all(&spec, &mut registry, Arc::new(transport));

            Ok::<_, OpenApiToolsError>(StartedSource {
                registry: registry.freeze(),
                base_url,
                title: spec.title,
            })
        };

        let started = match tokio::time::timeout(startup_timeout, startup).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(OpenApiToolsError::Startup(format!(
                    "startup timeout after {}s while loading '{}'",
                    startup_timeout.as_secs(),
                    self.redacted_spec_url()
                )));
            }
        };

        tracing::info!(
            spec = %self.redacted_spec_url(),
            base_url = %started.base_url,
            tools = started.registry.len(),
            "registered API tools"
        );

        Ok(started)
    }

    fn redacted_spec_url(&self) -> String {
        Url::parse(&self.config.spec).map_or_else(|_| self.config.spec.clone(), |u| redact_url(&u))
    }

    fn resolve_base_url(&self, spec: &SpecDocument) -> Result<String> {
        if let Some(configured) = &self.config.base_url {
            if configured.starts_with("http://") || configured.starts_with("https://") {
                return Ok(configured.clone());
            }
            // Relative base URLs resolve against the spec URL, like relative `servers` entries.
            return Url::parse(&self.config.spec)
                .and_then(|spec_url| spec_url.join(configured))
                .map(|u| u.to_string())
                .map_err(|e| {
                    OpenApiToolsError::Config(format!("invalid baseUrl '{configured}': {e}"))
                });
        }

        spec.default_base_url(Some(&self.config.spec)).ok_or_else(|| {
            OpenApiToolsError::Config(
                "no baseUrl configured and none found in spec (servers / host)".to_string(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpecError;
    use apibridge_test_support::TestServer;
    use axum::Router;
    use axum::http::header;
    use axum::routing::get;
    use std::time::Duration;

    const NO_SERVERS: &str = r#"{"paths": {"/ping": {"get": {}}}}"#;

    async fn serve_spec(body: &'static str) -> TestServer {
        let router = Router::new().route(
            "/openapi.json",
            get(move || async move { ([(header::CONTENT_TYPE, "application/json")], body) }),
        );
        TestServer::spawn(router).await.unwrap()
    }

    #[tokio::test]
    async fn missing_base_url_is_a_config_error() {
        let server = serve_spec(NO_SERVERS).await;
        let source = ApiToolSource::new(ApiSourceConfig::new(server.url("/openapi.json"))).unwrap();
        let err = source.start().await.unwrap_err();
        assert!(matches!(err, OpenApiToolsError::Config(_)));
    }

    #[tokio::test]
    async fn relative_base_url_resolves_against_spec_url() {
        let server = serve_spec(NO_SERVERS).await;
        let mut cfg = ApiSourceConfig::new(server.url("/openapi.json"));
        cfg.base_url = Some("/api/v1".to_string());

        let started = ApiToolSource::new(cfg).unwrap().start().await.unwrap();
        assert_eq!(started.base_url, format!("{}/api/v1", server.base_url()));
        assert!(started.registry.get("get_ping").is_some());
    }

    #[tokio::test]
    async fn hash_mismatch_fails_startup_under_fail_policy() {
        let server = serve_spec(NO_SERVERS).await;
        let mut cfg = ApiSourceConfig::new(server.url("/openapi.json"));
        cfg.base_url = Some("http://127.0.0.1:1".to_string());
        cfg.spec_hash = Some("sha256:0000".to_string());
        cfg.spec_hash_policy = crate::config::HashPolicy::Fail;

        let err = ApiToolSource::new(cfg).unwrap().start().await.unwrap_err();
        assert!(matches!(
            err,
            OpenApiToolsError::Spec(SpecError::HashMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn slow_spec_endpoint_hits_startup_timeout() {
        let router = Router::new().route(
            "/openapi.json",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                ([(header::CONTENT_TYPE, "application/json")], NO_SERVERS)
            }),
        );
        let server = TestServer::spawn(router).await.unwrap();
        let mut cfg = ApiSourceConfig::new(server.url("/openapi.json"));
        cfg.timeout_secs = 0;
        cfg.startup_timeout_secs = 1;

        let err = ApiToolSource::new(cfg).unwrap().start().await.unwrap_err();
        assert!(matches!(err, OpenApiToolsError::Startup(m) if m.contains("startup timeout")));
    }

    #[tokio::test]
    async fn slow_spec_request_is_a_fetch_error() {
        let router = Router::new().route(
            "/openapi.json",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                ([(header::CONTENT_TYPE, "application/json")], NO_SERVERS)
            }),
        );
        let server = TestServer::spawn(router).await.unwrap();
        let mut cfg = ApiSourceConfig::new(server.url("/openapi.json"));
        cfg.timeout_secs = 1;
        cfg.startup_timeout_secs = 8;

        let err = ApiToolSource::new(cfg).unwrap().start().await.unwrap_err();
        assert!(matches!(err, OpenApiToolsError::Spec(SpecError::Fetch { .. })));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let err = ApiToolSource::new(ApiSourceConfig::new("swagger.json")).unwrap_err();
        assert!(matches!(err, OpenApiToolsError::Config(_)));
    }
}
