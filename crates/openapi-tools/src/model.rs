//! Parsed spec document.
//!
//! One model covers Swagger 2.0 and `OpenAPI` 3.x: only the pieces needed to synthesize tools are
//! kept (operation summaries, parameters, JSON request bodies, base-URL hints). Parsing is
//! lenient about optional fields and strict about the document shape (`paths` must exist).

use crate::error::SpecError;
use crate::resolver::RefResolver;
use apibridge_http_tools::transport::HttpMethod;
use serde_json::{Map, Value};
use url::Url;

/// Where a parameter travels in the outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Cookie,
    /// Swagger 2 `in: body`: the parameter *is* the JSON payload.
    Body,
}

impl ParamLocation {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "cookie" => Some(Self::Cookie),
            "body" => Some(Self::Body),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
            Self::Body => "body",
        }
    }
}

/// Type hint recorded when a parameter declares none.
pub const DEFAULT_TYPE_HINT: &str = "string";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    /// Name as the remote API expects it (never sanitized).
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    /// Advisory only; values are not validated against it.
    pub type_hint: String,
    pub description: Option<String>,
}

impl ParameterSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, location: ParamLocation, required: bool) -> Self {
        Self {
            name: name.into(),
            location,
            required,
            type_hint: DEFAULT_TYPE_HINT.to_string(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestBodySpec {
    pub required: bool,
    /// Declared media types, in document order.
    pub content_types: Vec<String>,
}

impl RequestBodySpec {
    /// Only `application/json` bodies become a tool argument.
    #[must_use]
    pub fn accepts_json(&self) -> bool {
        self.content_types.iter().any(|c| c == "application/json")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Operation {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub operation_id: Option<String>,
    pub parameters: Vec<ParameterSpec>,
    pub request_body: Option<RequestBodySpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    pub path: String,
    pub operations: Vec<(HttpMethod, Operation)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecDocument {
    pub title: Option<String>,
    /// `OpenAPI` 3 `servers[].url`, possibly relative.
    pub servers: Vec<String>,
    /// Swagger 2 `host`.
    pub host: Option<String>,
    /// Swagger 2 `basePath`.
    pub base_path: Option<String>,
    /// Swagger 2 `schemes`.
    pub schemes: Vec<String>,
    paths: Vec<PathEntry>,
}

impl SpecDocument {
    /// Build a document from already-parsed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::Invalid`] if the root is not an object, has no `paths` object, or
    /// contains unresolvable `$ref`s.
    pub fn from_value(root: &Value) -> Result<Self, SpecError> {
        let obj = root
            .as_object()
            .ok_or_else(|| SpecError::Invalid("spec root is not a JSON object".to_string()))?;
        let paths = obj
            .get("paths")
            .and_then(Value::as_object)
            .ok_or_else(|| SpecError::Invalid("missing 'paths' object".to_string()))?;

        let resolver = RefResolver::new(root);
        let mut entries = Vec::with_capacity(paths.len());
        for (path, item) in paths {
            if !path.starts_with('/') {
                tracing::debug!(key = %path, "skipping non-path key under 'paths'");
                continue;
            }
            let item = resolver.resolve(item)?;
            let Some(item) = item.as_object() else {
                tracing::warn!(path = %path, "skipping path item that is not an object");
                continue;
            };
            entries.push(PathEntry {
                path: path.clone(),
                operations: parse_path_item(&resolver, path, item)?,
            });
        }

        Ok(Self {
            title: obj
                .get("info")
                .and_then(|i| i.get("title"))
                .and_then(Value::as_str)
                .map(str::to_string),
            servers: obj
                .get("servers")
                .and_then(Value::as_array)
                .map(|servers| {
                    servers
                        .iter()
                        .filter_map(|s| s.get("url").and_then(Value::as_str))
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            host: str_field(obj, "host"),
            base_path: str_field(obj, "basePath"),
            schemes: obj
                .get("schemes")
                .and_then(Value::as_array)
                .map(|s| s.iter().filter_map(Value::as_str).map(str::to_string).collect())
                .unwrap_or_default(),
            paths: entries,
        })
    }

    /// Path entries in document order.
    #[must_use]
    pub fn paths(&self) -> &[PathEntry] {
        &self.paths
    }

    /// Every (path, method, operation) triple: path order first, then method order per path.
    pub fn operations(&self) -> impl Iterator<Item = (&str, HttpMethod, &Operation)> + '_ {
        self.paths.iter().flat_map(|entry| {
            entry
                .operations
                .iter()
                .map(move |(method, op)| (entry.path.as_str(), *method, op))
        })
    }

    #[must_use]
    pub fn operation(&self, path: &str, method: HttpMethod) -> Option<&Operation> {
        self.paths
            .iter()
            .find(|e| e.path == path)
            .and_then(|e| e.operations.iter().find(|(m, _)| *m == method))
            .map(|(_, op)| op)
    }

    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.paths.iter().map(|e| e.operations.len()).sum()
    }

    /// Infer the API base URL from the document.
    ///
    /// `OpenAPI` 3 `servers[0].url` wins (relative URLs resolve against `spec_url`); otherwise
    /// Swagger 2 `host` + `basePath`, where a missing host means "the host serving the spec".
    #[must_use]
    pub fn default_base_url(&self, spec_url: Option<&str>) -> Option<String> {
        let spec_url = spec_url.and_then(|u| Url::parse(u).ok());

        if let Some(server) = self.servers.first() {
            if server.starts_with("http://") || server.starts_with("https://") {
                return Some(server.clone());
            }
            return spec_url
                .and_then(|u| u.join(server).ok())
                .map(|u| u.to_string());
        }

        let base_path = self.base_path.as_deref().unwrap_or("");
        if let Some(host) = &self.host {
            let scheme = if self.schemes.iter().any(|s| s == "https") {
                "https"
            } else if let Some(s) = self.schemes.first() {
                s.as_str()
            } else {
                spec_url.as_ref().map_or("https", Url::scheme)
            };
            return Some(format!("{scheme}://{host}{base_path}"));
        }

        if self.base_path.is_some() {
            let origin = spec_url?.origin().ascii_serialization();
            return Some(format!("{origin}{base_path}"));
        }

        None
    }
}

fn str_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

fn parse_path_item<'a>(
    resolver: &RefResolver<'a>,
    path: &str,
    item: &'a Map<String, Value>,
) -> Result<Vec<(HttpMethod, Operation)>, SpecError> {
    let shared = parse_parameter_list(resolver, path, item.get("parameters"))?;

    let mut operations = Vec::new();
    for (key, op) in item {
        // Path items also carry `parameters`, `summary`, `servers`, extensions...
        let Ok(method) = key.parse::<HttpMethod>() else {
            continue;
        };
        let Some(op) = op.as_object() else {
            tracing::warn!(
                path = %path,
                method = %method,
                "skipping operation that is not an object"
            );
            continue;
        };
        operations.push((method, parse_operation(resolver, path, op, &shared)?));
    }
    Ok(operations)
}

fn parse_operation<'a>(
    resolver: &RefResolver<'a>,
    path: &str,
    op: &'a Map<String, Value>,
    shared: &[ParameterSpec],
) -> Result<Operation, SpecError> {
    let own = parse_parameter_list(resolver, path, op.get("parameters"))?;

    // Operation-level parameters override path-level ones with the same (location, name).
    let mut parameters = shared.to_vec();
    for p in own {
        if let Some(existing) = parameters
            .iter_mut()
            .find(|e| e.location == p.location && e.name == p.name)
        {
            *existing = p;
        } else {
            parameters.push(p);
        }
    }

    let request_body = match op.get("requestBody") {
        Some(body) => Some(parse_request_body(resolver.resolve(body)?)),
        None => None,
    };

    Ok(Operation {
        summary: str_field(op, "summary"),
        description: str_field(op, "description"),
        operation_id: str_field(op, "operationId"),
        parameters,
        request_body,
    })
}

fn parse_parameter_list<'a>(
    resolver: &RefResolver<'a>,
    path: &str,
    list: Option<&'a Value>,
) -> Result<Vec<ParameterSpec>, SpecError> {
    let Some(list) = list.and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    let mut out = Vec::with_capacity(list.len());
    for raw in list {
        let param = resolver.resolve(raw)?;
        if let Some(p) = parse_parameter(resolver, path, param)? {
            out.push(p);
        }
    }
    Ok(out)
}

fn parse_parameter<'a>(
    resolver: &RefResolver<'a>,
    path: &str,
    param: &'a Value,
) -> Result<Option<ParameterSpec>, SpecError> {
    let Some(name) = param.get("name").and_then(Value::as_str) else {
        tracing::warn!(path = %path, "skipping parameter without a name");
        return Ok(None);
    };

    let raw_location = param.get("in").and_then(Value::as_str).unwrap_or("query");
    let Some(location) = ParamLocation::parse(raw_location) else {
        tracing::warn!(
            path = %path,
            param = %name,
            location = %raw_location,
            "skipping parameter with unsupported location"
        );
        return Ok(None);
    };

    let type_hint = match param.get("type").and_then(Value::as_str) {
        Some(t) => t.to_string(),
        None => match param.get("schema") {
            Some(schema) => resolver
                .resolve(schema)?
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or(if location == ParamLocation::Body {
                    "object"
                } else {
                    DEFAULT_TYPE_HINT
                })
                .to_string(),
            None => DEFAULT_TYPE_HINT.to_string(),
        },
    };

    Ok(Some(ParameterSpec {
        name: name.to_string(),
        location,
        required: param
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        type_hint,
        description: param
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
    }))
}

fn parse_request_body(body: &Value) -> RequestBodySpec {
    RequestBodySpec {
        required: body
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        content_types: body
            .get("content")
            .and_then(Value::as_object)
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_swagger2_operations_in_document_order() {
        let doc = json!({
            "swagger": "2.0",
            "info": { "title": "Swagger Petstore" },
            "host": "petstore.swagger.io",
            "basePath": "/v2",
            "schemes": ["https", "http"],
            "paths": {
                "/pet/{petId}": {
                    "get": {
                        "summary": "Find pet by ID",
                        "parameters": [
                            { "name": "petId", "in": "path", "required": true, "type": "integer" }
                        ]
                    },
                    "delete": {
                        "parameters": [
                            { "name": "api_key", "in": "header", "type": "string" },
                            { "name": "petId", "in": "path", "required": true, "type": "integer" }
                        ]
                    }
                },
                "/pet": {
                    "post": {
                        "summary": "Add a new pet to the store",
                        "parameters": [
                            { "in": "body", "name": "body", "required": true,
                              "schema": { "$ref": "#/definitions/Pet" } }
                        ]
                    }
                }
            },
            "definitions": { "Pet": { "type": "object" } }
        });

        let spec = SpecDocument::from_value(&doc).unwrap();
        assert_eq!(spec.title.as_deref(), Some("Swagger Petstore"));

        let ops: Vec<(&str, HttpMethod)> = spec.operations().map(|(p, m, _)| (p, m)).collect();
        assert_eq!(
            ops,
            vec![
                ("/pet/{petId}", HttpMethod::Get),
                ("/pet/{petId}", HttpMethod::Delete),
                ("/pet", HttpMethod::Post),
            ]
        );

        let get = spec.operation("/pet/{petId}", HttpMethod::Get).unwrap();
        assert_eq!(get.summary.as_deref(), Some("Find pet by ID"));
        assert_eq!(get.parameters[0].type_hint, "integer");
        assert!(get.parameters[0].required);

        let post = spec.operation("/pet", HttpMethod::Post).unwrap();
        assert_eq!(post.parameters[0].location, ParamLocation::Body);
        assert_eq!(post.parameters[0].type_hint, "object");
    }

    #[test]
    fn parses_openapi3_request_body_and_schema_types() {
        let doc = json!({
            "openapi": "3.0.0",
            "servers": [{ "url": "/api/v3" }],
            "components": {
                "requestBodies": {
                    "Pet": { "required": true, "content": { "application/json": {}, "application/xml": {} } }
                }
            },
            "paths": {
                "/pet": {
                    "put": {
                        "parameters": [
                            { "name": "dry-run", "in": "query", "schema": { "type": "boolean" } }
                        ],
                        "requestBody": { "$ref": "#/components/requestBodies/Pet" }
                    }
                }
            }
        });

        let spec = SpecDocument::from_value(&doc).unwrap();
        let put = spec.operation("/pet", HttpMethod::Put).unwrap();
        assert_eq!(put.parameters[0].type_hint, "boolean");
        assert!(!put.parameters[0].required);
        let body = put.request_body.as_ref().unwrap();
        assert!(body.required);
        assert!(body.accepts_json());
        assert_eq!(body.content_types, vec!["application/json", "application/xml"]);
    }

    #[test]
    fn defaults_missing_fields_and_skips_unusable_parameters() {
        let doc = json!({
            "paths": {
                "/search": {
                    "get": {
                        "parameters": [
                            { "name": "q" },
                            { "in": "query" },
                            { "name": "file", "in": "formData" }
                        ]
                    }
                }
            }
        });
        let spec = SpecDocument::from_value(&doc).unwrap();
        let get = spec.operation("/search", HttpMethod::Get).unwrap();
        assert_eq!(get.parameters, vec![ParameterSpec::new("q", ParamLocation::Query, false)]);
    }

    #[test]
    fn non_verb_path_item_keys_are_not_operations() {
        let doc = json!({
            "paths": {
                "x-internal": { "get": {} },
                "/users": {
                    "summary": "Users",
                    "parameters": [{ "name": "tenant", "in": "header", "required": true }],
                    "x-rate-limit": 10,
                    "get": {}
                }
            }
        });
        let spec = SpecDocument::from_value(&doc).unwrap();
        assert_eq!(spec.operation_count(), 1);
        let get = spec.operation("/users", HttpMethod::Get).unwrap();
        assert_eq!(get.parameters[0].name, "tenant");
        assert_eq!(get.parameters[0].location, ParamLocation::Header);
    }

    #[test]
    fn operation_parameters_override_path_level_ones() {
        let doc = json!({
            "parameters": {
                "Q": { "name": "q", "in": "query", "required": true }
            },
            "paths": {
                "/users": {
                    "parameters": [
                        { "name": "q", "in": "query", "required": false },
                        { "name": "q", "in": "header" }
                    ],
                    "get": { "parameters": [{ "$ref": "#/parameters/Q" }] }
                }
            }
        });
        let spec = SpecDocument::from_value(&doc).unwrap();
        let get = spec.operation("/users", HttpMethod::Get).unwrap();
        assert_eq!(get.parameters.len(), 2);
        assert_eq!(get.parameters[0].location, ParamLocation::Query);
        assert!(get.parameters[0].required);
        assert_eq!(get.parameters[1].location, ParamLocation::Header);
    }

    #[test]
    fn rejects_documents_without_paths_or_with_dangling_refs() {
        assert!(matches!(
            SpecDocument::from_value(&json!({"swagger": "2.0"})),
            Err(SpecError::Invalid(_))
        ));
        assert!(matches!(
            SpecDocument::from_value(&json!([1, 2])),
            Err(SpecError::Invalid(_))
        ));
        let dangling = json!({
            "paths": { "/a": { "get": { "parameters": [{ "$ref": "#/parameters/Missing" }] } } }
        });
        assert!(matches!(
            SpecDocument::from_value(&dangling),
            Err(SpecError::Invalid(_))
        ));
    }

    #[test]
    fn default_base_url_prefers_servers_then_host() {
        let v3 = SpecDocument::from_value(&json!({
            "servers": [{ "url": "/api/v3" }],
            "paths": {}
        }))
        .unwrap();
        assert_eq!(
            v3.default_base_url(Some("https://petstore3.swagger.io/api/v3/openapi.json"))
                .as_deref(),
            Some("https://petstore3.swagger.io/api/v3")
        );
        assert_eq!(v3.default_base_url(None), None);

        let v2 = SpecDocument::from_value(&json!({
            "host": "petstore.swagger.io",
            "basePath": "/v2",
            "schemes": ["http", "https"],
            "paths": {}
        }))
        .unwrap();
        assert_eq!(
            v2.default_base_url(None).as_deref(),
            Some("https://petstore.swagger.io/v2")
        );

        let hostless =
            SpecDocument::from_value(&json!({ "basePath": "/api", "paths": {} })).unwrap();
        assert_eq!(
            hostless
                .default_base_url(Some("http://127.0.0.1:9000/docs/swagger-ui-init.js"))
                .as_deref(),
            Some("http://127.0.0.1:9000/api")
        );
    }
}
