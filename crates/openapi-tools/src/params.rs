//! Operation parameter resolution.
//!
//! Turns an operation's declared parameters (plus an optional JSON request body) into the
//! argument list a generated tool accepts, and the [`ParameterContract`] it advertises.

use crate::model::{ParamLocation, ParameterSpec, RequestBodySpec};
use serde_json::{Map, Value, json};

/// Name of the synthetic argument carrying an `OpenAPI` 3 JSON request body.
pub const BODY_ARGUMENT: &str = "body";

/// Used instead of [`BODY_ARGUMENT`] when a declared parameter already sanitizes to `body`.
pub const BODY_ARGUMENT_FALLBACK: &str = "request_body";

/// Normalize a declared parameter name into an argument name (`X-Request-Id` -> `X_Request_Id`).
#[must_use]
pub fn sanitize_arg_name(raw: &str) -> String {
    raw.replace('-', "_")
}

/// One tool argument and where its value goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    /// Sanitized name callers use.
    pub name: String,
    /// Name the remote API expects (path placeholder, query key, header name).
    pub wire_name: String,
    pub location: ParamLocation,
    pub required: bool,
    pub type_hint: String,
    pub description: Option<String>,
}

/// Arguments in declaration order, request body last.
///
/// Two declared parameters may sanitize to the same name (`page-size` and `page_size`); both
/// stay listed and read the same caller-supplied value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedArguments {
    arguments: Vec<Argument>,
}

impl ResolvedArguments {
    #[must_use]
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.arguments.iter().map(|a| a.name.as_str())
    }

    pub fn required(&self) -> impl Iterator<Item = &Argument> + '_ {
        self.arguments.iter().filter(|a| a.required)
    }

    /// Optional arguments. Their default is "absent": nothing is sent for them unless supplied.
    pub fn optional(&self) -> impl Iterator<Item = &Argument> + '_ {
        self.arguments.iter().filter(|a| !a.required)
    }

    #[must_use]
    pub fn accepts(&self, name: &str) -> bool {
        self.arguments.iter().any(|a| a.name == name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }
}

/// Resolve declared parameters and an optional request body into tool arguments.
#[must_use]
pub fn resolve(
    parameters: &[ParameterSpec],
    request_body: Option<&RequestBodySpec>,
) -> ResolvedArguments {
    let mut arguments: Vec<Argument> = Vec::with_capacity(parameters.len() + 1);

    for param in parameters {
        let name = sanitize_arg_name(&param.name);
        if let Some(existing) = arguments.iter().find(|a| a.name == name) {
            tracing::warn!(
                argument = %name,
                first = %existing.wire_name,
                second = %param.name,
                "parameters share a sanitized argument name; both read the same value"
            );
        }
        arguments.push(Argument {
            name,
            wire_name: param.name.clone(),
            location: param.location,
            required: param.required,
            type_hint: param.type_hint.clone(),
            description: param.description.clone(),
        });
    }

    if let Some(body) = request_body.filter(|b| b.accepts_json()) {
        let name = if arguments.iter().any(|a| a.name == BODY_ARGUMENT) {
            BODY_ARGUMENT_FALLBACK
        } else {
            BODY_ARGUMENT
        };
        arguments.push(Argument {
            name: name.to_string(),
            wire_name: name.to_string(),
            location: ParamLocation::Body,
            required: false,
            type_hint: "object".to_string(),
            description: body
                .required
                .then(|| "JSON request body (required by the API)".to_string()),
        });
    }

    ResolvedArguments { arguments }
}

/// Default of an optional argument: when omitted it is left out of the request entirely, never
/// sent as an empty string, zero or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Absent;

/// One advertised argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractEntry {
    pub name: String,
    pub required: bool,
    pub type_hint: String,
    pub description: Option<String>,
}

impl ContractEntry {
    /// `None` for required arguments, which have no default.
    #[must_use]
    pub fn default_value(&self) -> Option<Absent> {
        (!self.required).then_some(Absent)
    }
}

/// The call signature of a generated tool: unique argument names in resolved order.
///
/// Optional entries default to [`Absent`]; an omitted (or `null`) argument is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterContract {
    entries: Vec<ContractEntry>,
}

impl ParameterContract {
    /// Collapse resolved arguments into one entry per name; an entry is required if any
    /// argument sharing its name is.
    #[must_use]
    pub fn from_resolved(resolved: &ResolvedArguments) -> Self {
        let mut entries: Vec<ContractEntry> = Vec::new();
        for arg in resolved.arguments() {
            if let Some(existing) = entries.iter_mut().find(|e| e.name == arg.name) {
                existing.required |= arg.required;
                continue;
            }
            entries.push(ContractEntry {
                name: arg.name.clone(),
                required: arg.required,
                type_hint: arg.type_hint.clone(),
                description: arg.description.clone(),
            });
        }
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[ContractEntry] {
        &self.entries
    }

    pub fn required(&self) -> impl Iterator<Item = &ContractEntry> + '_ {
        self.entries.iter().filter(|e| e.required)
    }

    pub fn optional(&self) -> impl Iterator<Item = &ContractEntry> + '_ {
        self.entries.iter().filter(|e| !e.required)
    }

    /// JSON Schema for MCP `tools/list`.
    ///
    /// Optional properties carry no `default`: [`Absent`] has no JSON rendering.
    #[must_use]
    pub fn input_schema(&self) -> Map<String, Value> {
        let mut properties = Map::new();
        for entry in &self.entries {
            let mut prop = Map::new();
            if let Some(ty) = json_schema_type(&entry.type_hint) {
                prop.insert("type".to_string(), json!(ty));
            }
            if let Some(desc) = &entry.description {
                prop.insert("description".to_string(), json!(desc));
            }
            properties.insert(entry.name.clone(), Value::Object(prop));
        }

        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));

        let required: Vec<&str> = self.required().map(|e| e.name.as_str()).collect();
        if !required.is_empty() {
            schema.insert("required".to_string(), json!(required));
        }
        schema
    }
}

fn json_schema_type(type_hint: &str) -> Option<&'static str> {
    match type_hint {
        "string" | "file" => Some("string"),
        "integer" => Some("integer"),
        "number" => Some("number"),
        "boolean" => Some("boolean"),
        "array" => Some("array"),
        "object" => Some("object"),
        _ => None,
    }
}
