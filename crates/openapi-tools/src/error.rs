//! Error types for `apibridge-openapi-tools`.
//!
//! Two families with different propagation rules:
//! - [`SpecError`]: acquiring or parsing the spec. Fatal to startup; nothing gets registered.
//! - [`ToolCallError`]: a single tool invocation. Rendered as data, never raised past the registry.

use apibridge_http_tools::transport::TransportError;
use thiserror::Error;

/// Spec acquisition and parsing failures.
#[derive(Error, Debug)]
pub enum SpecError {
    /// Transport-level failure fetching the spec (non-2xx, network, timeout).
    #[error("failed to fetch spec from '{url}': {message}")]
    Fetch { url: String, message: String },

    #[error("unsupported spec content-type: '{content_type}'")]
    UnsupportedFormat { content_type: String },

    #[error("no '{key}' found in script content")]
    KeyNotFound { key: String },

    #[error("opening brace for '{key}' not found")]
    MalformedEmbedding { key: String },

    #[error("unmatched braces while extracting '{key}'")]
    UnbalancedBraces { key: String },

    #[error("failed to parse embedded '{key}' JSON: {source}")]
    EmbeddedJsonParse {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse spec from '{location}': {source}")]
    Parse {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    /// Valid JSON that is not a usable spec document.
    #[error("invalid spec document: {0}")]
    Invalid(String),

    #[error("spec hash mismatch. Expected: {expected}, Got: {actual}")]
    HashMismatch { expected: String, actual: String },
}

/// Invocation-time failures of a generated tool.
#[derive(Error, Debug)]
pub enum ToolCallError {
    #[error("Missing required parameter: {name}")]
    MissingRequiredParameter { name: String },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ToolCallError {
    /// Human-readable rendering handed back to tool callers.
    #[must_use]
    pub fn render(&self) -> String {
        let details = match self {
            ToolCallError::Transport(e) => e.details(),
            ToolCallError::MissingRequiredParameter { .. } => None,
        };
        format!(
            "Error: {self}\n\nDetails: {}",
            details.unwrap_or("No additional details")
        )
    }
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Tool not found: {0}")]
    UnknownTool(String),
}

/// Main error type for `OpenAPI` tooling.
#[derive(Error, Debug)]
pub enum OpenApiToolsError {
    /// Configuration errors (invalid config file, no usable base URL).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Startup errors (startup timeout, HTTP client construction).
    #[error("Startup error: {0}")]
    Startup(String),

    #[error("Spec error: {0}")]
    Spec(#[from] SpecError),

    #[error("Tool call error: {0}")]
    ToolCall(#[from] ToolCallError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for `OpenAPI` tooling operations.
pub type Result<T> = std::result::Result<T, OpenApiToolsError>;
