//! Dynamic tool construction.
//!
//! [`build`] turns one spec operation into a [`ToolDescriptor`] whose handler maps caller
//! arguments onto an outbound [`TransportRequest`]: path placeholders are substituted, query,
//! header and cookie values are collected under their wire names, and a JSON body is passed
//! through verbatim.

use crate::error::ToolCallError;
use crate::model::{Operation, ParamLocation};
use crate::naming;
use crate::params::{self, ParameterContract, ResolvedArguments, sanitize_arg_name};
use crate::registry::ToolDescriptor;
use apibridge_http_tools::transport::{HttpMethod, HttpTransport, TransportRequest};
use async_trait::async_trait;
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

/// Arguments as received from a tool caller, keyed by sanitized name.
pub type ToolArguments = Map<String, Value>;

static PATH_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}/]+)\}").expect("valid placeholder regex"));

/// What a handler hands back to the host: text plus an error flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolReply {
    pub text: String,
    pub is_error: bool,
}

impl ToolReply {
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// A registered tool's callable half.
///
/// Handlers never fail: invocation errors are rendered into an error [`ToolReply`].
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: &ToolArguments) -> ToolReply;
}

/// Handler generated from a spec operation.
pub struct DynamicTool {
    method: HttpMethod,
    path: String,
    arguments: ResolvedArguments,
    transport: Arc<dyn HttpTransport>,
}

impl DynamicTool {
    #[must_use]
    pub fn new(
        method: HttpMethod,
        path: impl Into<String>,
        arguments: ResolvedArguments,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            arguments,
            transport,
        }
    }

    #[must_use]
    pub fn arguments(&self) -> &ResolvedArguments {
        &self.arguments
    }

    /// Map caller arguments onto a request. Absent (missing or `null`) values are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ToolCallError::MissingRequiredParameter`] when a required argument is absent,
    /// or when a `{placeholder}` in the path is left unfilled.
    pub fn build_request(
        &self,
        supplied: &ToolArguments,
    ) -> Result<TransportRequest, ToolCallError> {
        for key in supplied.keys() {
            if !self.arguments.accepts(key) {
                tracing::debug!(argument = %key, path = %self.path, "ignoring unknown argument");
            }
        }

        let mut request = TransportRequest::new(self.method, String::new());
        let mut path_values: HashMap<&str, String> = HashMap::new();
        let mut cookies: Vec<String> = Vec::new();

        for arg in self.arguments.arguments() {
            let Some(value) = supplied.get(&arg.name).filter(|v| !v.is_null()) else {
                if arg.required {
                    return Err(ToolCallError::MissingRequiredParameter {
                        name: arg.name.clone(),
                    });
                }
                continue;
            };

            match arg.location {
                ParamLocation::Path => {
                    let segment = urlencoding::encode(&value_to_string(value)).into_owned();
                    path_values.insert(arg.wire_name.as_str(), segment);
                }
                ParamLocation::Query => push_query(&mut request.query, &arg.wire_name, value),
                ParamLocation::Header => {
                    request
                        .headers
                        .push((arg.wire_name.clone(), value_to_string(value)));
                }
                ParamLocation::Cookie => {
                    cookies.push(format!("{}={}", arg.wire_name, value_to_string(value)));
                }
                ParamLocation::Body => request.body = Some(value.clone()),
            }
        }

        // Placeholders come from the template, never from substituted values.
        if let Some(caps) = PATH_PLACEHOLDER
            .captures_iter(&self.path)
            .find(|caps| !path_values.contains_key(&caps[1]))
        {
            return Err(ToolCallError::MissingRequiredParameter {
                name: sanitize_arg_name(&caps[1]),
            });
        }
        let path = PATH_PLACEHOLDER
            .replace_all(&self.path, |caps: &Captures<'_>| {
                path_values.get(&caps[1]).cloned().unwrap_or_default()
            })
            .into_owned();

        if !cookies.is_empty() {
            request
                .headers
                .push(("Cookie".to_string(), cookies.join("; ")));
        }

        request.path = path;
        Ok(request)
    }

    /// Build the request and perform it.
    ///
    /// # Errors
    ///
    /// Argument errors are returned before any network call; transport errors afterwards.
    pub async fn invoke(&self, supplied: &ToolArguments) -> Result<Value, ToolCallError> {
        let request = self.build_request(supplied)?;
        tracing::debug!(method = %request.method, path = %request.path, "invoking API tool");
        Ok(self.transport.request(request).await?)
    }
}

#[async_trait]
impl ToolHandler for DynamicTool {
    async fn call(&self, arguments: &ToolArguments) -> ToolReply {
        match self.invoke(arguments).await {
            Ok(value) => ToolReply::success(format_response(&value)),
            Err(e) => {
                tracing::debug!(
                    method = %self.method,
                    path = %self.path,
                    error = %e,
                    "API tool call failed"
                );
                ToolReply::error(e.render())
            }
        }
    }
}

/// Build the descriptor for one operation. The name is the raw sanitized identifier; the
/// registration driver makes it unique.
#[must_use]
pub fn build(
    method: HttpMethod,
    path: &str,
    operation: &Operation,
    transport: Arc<dyn HttpTransport>,
) -> ToolDescriptor {
    let arguments = params::resolve(&operation.parameters, operation.request_body.as_ref());
    let contract = ParameterContract::from_resolved(&arguments);
    let description = operation
        .summary
        .clone()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| format!("{method} {path}"));

    ToolDescriptor {
        name: naming::sanitize(method, path),
        description,
        method,
        path: path.to_string(),
        contract,
        handler: Arc::new(DynamicTool::new(method, path, arguments, transport)),
    }
}

/// Pretty-printed JSON for successful calls.
#[must_use]
pub fn format_response(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// String form of a value for paths, headers and query strings.
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}

/// Arrays become repeated keys (`tag=a&tag=b`); everything else a single pair.
fn push_query(query: &mut Vec<(String, String)>, name: &str, value: &Value) {
    match value {
        Value::Array(items) => {
            for item in items.iter().filter(|v| !v.is_null()) {
                query.push((name.to_string(), value_to_string(item)));
            }
        }
        other => query.push((name.to_string(), value_to_string(other))),
    }
}
