//! `apibridge-mcp`: expose every operation of an OpenAPI/Swagger spec as an MCP tool.
//!
//! The spec is fetched once at startup (plain JSON or a Swagger UI `swagger-ui-init.js`
//! bundle), each operation becomes a tool, and the tools are served over MCP stdio.
//!
//! ```sh
//! apibridge-mcp --spec https://petstore.swagger.io/v2/swagger.json
//! apibridge-mcp --config apibridge.yaml --log-format json
//! ```

mod config;
mod server;

use anyhow::Context as _;
use apibridge_openapi_tools::ApiToolSource;
use clap::{Parser, ValueEnum};
use rmcp::ServiceExt as _;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{Overrides, ServerConfig};
use crate::server::ApiBridgeServer;

#[derive(Debug, Parser)]
#[command(name = "apibridge-mcp", version, about)]
struct Cli {
    /// Config file (YAML or JSON).
    #[arg(long, env = "APIBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Spec URL; overrides `spec` from the config file.
    #[arg(long, env = "APIBRIDGE_SPEC")]
    spec: Option<String>,

    /// API base URL; overrides `baseUrl` and whatever the spec declares.
    #[arg(long, env = "APIBRIDGE_BASE_URL")]
    base_url: Option<String>,

    /// Assignment name holding the spec inside a JavaScript payload.
    #[arg(long, env = "APIBRIDGE_EMBEDDED_KEY")]
    embedded_key: Option<String>,

    /// Default log level when `RUST_LOG` is unset.
    #[arg(long, env = "APIBRIDGE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[arg(long, env = "APIBRIDGE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Plain)]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Plain,
    Json,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            spec: self.spec.clone(),
            base_url: self.base_url.clone(),
            embedded_key: self.embedded_key.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_format);

    let config = ServerConfig::load(cli.config.as_deref(), &cli.overrides())?;
    info!(
        name = %config.name,
        version = env!("CARGO_PKG_VERSION"),
        "starting apibridge MCP server"
    );

    let started = ApiToolSource::new(config.source.clone())?
        .start()
        .await
        .context("failed to register API tools")?;
    if started.registry.is_empty() {
        tracing::warn!("spec declares no operations; serving an empty tool list");
    }

    let instructions = config.instructions.clone().or_else(|| {
        started
            .title
            .as_ref()
            .map(|title| format!("Tools generated from the '{title}' API."))
    });
    let server = ApiBridgeServer::new(started.registry, instructions);

    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .context("failed to start MCP stdio transport")?;
    info!("serving MCP over stdio");

    tokio::select! {
        quit = service.waiting() => {
            let reason = quit.context("MCP service task failed")?;
            info!(?reason, "MCP session ended");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, shutting down");
        }
    }

    Ok(())
}

/// Logs go to stderr; stdout carries the MCP protocol.
fn init_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Plain => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "apibridge-mcp",
            "--spec",
            "https://petstore.swagger.io/v2/swagger.json",
            "--embedded-key",
            "spec",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
        let overrides = cli.overrides();
        assert_eq!(
            overrides.spec.as_deref(),
            Some("https://petstore.swagger.io/v2/swagger.json")
        );
        assert_eq!(overrides.embedded_key.as_deref(), Some("spec"));
        assert!(overrides.base_url.is_none());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory as _;
        Cli::command().debug_assert();
    }
}
