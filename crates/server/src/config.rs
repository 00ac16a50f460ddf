use anyhow::{Context as _, bail};
use apibridge_openapi_tools::ApiSourceConfig;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::Path;

const DEFAULT_SERVER_NAME: &str = "apibridge";

/// Server config file: MCP identity plus the API source (flattened).
///
/// ```yaml
/// name: petstore
/// instructions: Tools for the Swagger Petstore API.
/// spec: https://petstore.swagger.io/v2/swagger.json
/// headers:
///   api_key: special-key
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default = "default_server_name")]
    pub name: String,

    /// Sent to MCP clients in the initialize response.
    #[serde(default)]
    pub instructions: Option<String>,

    #[serde(flatten)]
    pub source: ApiSourceConfig,
}

fn default_server_name() -> String {
    DEFAULT_SERVER_NAME.to_string()
}

/// Command-line values that win over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub spec: Option<String>,
    pub base_url: Option<String>,
    pub embedded_key: Option<String>,
}

impl ServerConfig {
    /// Load from an optional YAML/JSON file, apply CLI overrides, then validate.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> anyhow::Result<Self> {
        let mut doc = match path {
            Some(path) => read_mapping(path)?,
            None => Mapping::new(),
        };

        for (key, value) in [
            ("spec", &overrides.spec),
            ("baseUrl", &overrides.base_url),
            ("embeddedKey", &overrides.embedded_key),
        ] {
            if let Some(value) = value {
                doc.insert(Value::from(key), Value::from(value.as_str()));
            }
        }

        if !doc.contains_key("spec") {
            bail!("no spec URL configured (set `spec` in the config file or pass --spec)");
        }

        let cfg: Self =
            serde_yaml::from_value(Value::Mapping(doc)).context("invalid server config")?;
        cfg.source.validate()?;
        Ok(cfg)
    }
}

fn read_mapping(path: &Path) -> anyhow::Result<Mapping> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let value: Value = serde_yaml::from_str(&content)
        .with_context(|| format!("parse config {}", path.display()))?;
    match value {
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(m) => Ok(m),
        _ => bail!("config {} must be a mapping", path.display()),
    }
}
