//! Tool registry.
//!
//! Lifecycle is `ToolRegistry::new() -> register* -> freeze()`. Registration happens once at
//! startup; the [`FrozenRegistry`] that comes out is read-only and shared by every call.

use crate::builder::{ToolArguments, ToolHandler, ToolReply};
use crate::error::RegistryError;
use crate::params::ParameterContract;
use apibridge_http_tools::semantics::annotations_for_method;
use apibridge_http_tools::transport::HttpMethod;
use rmcp::model::Tool;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Everything the host needs to advertise and dispatch one tool.
#[derive(Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub method: HttpMethod,
    /// Path template as declared in the spec.
    pub path: String,
    pub contract: ParameterContract,
    pub handler: Arc<dyn ToolHandler>,
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("contract", &self.contract)
            .finish_non_exhaustive()
    }
}

impl ToolDescriptor {
    /// MCP view of this tool: input schema from the contract, hints from the HTTP method.
    #[must_use]
    pub fn to_mcp_tool(&self) -> Tool {
        let mut tool = Tool::new(
            self.name.clone(),
            self.description.clone(),
            Arc::new(self.contract.input_schema()),
        );
        tool.annotations = Some(annotations_for_method(self.method));
        tool
    }
}

/// Mutable registry used while registering tools.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool. A tool already registered under the same name is replaced in place and
    /// returned.
    pub fn register(&mut self, descriptor: ToolDescriptor) -> Option<ToolDescriptor> {
        if let Some(slot) = self.tools.iter_mut().find(|t| t.name == descriptor.name) {
            tracing::warn!(tool = %descriptor.name, "replacing previously registered tool");
            return Some(std::mem::replace(slot, descriptor));
        }
        tracing::debug!(
            tool = %descriptor.name,
            method = %descriptor.method,
            path = %descriptor.path,
            "registered tool"
        );
        self.tools.push(descriptor);
        None
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.tools.iter().map(|t| t.name.as_str())
    }

    /// Stop accepting registrations.
    #[must_use]
    pub fn freeze(self) -> FrozenRegistry {
        let index = self
            .tools
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.clone(), i))
            .collect();
        FrozenRegistry {
            tools: self.tools,
            index,
        }
    }
}

/// Read-only registry served to callers.
#[derive(Debug, Default)]
pub struct FrozenRegistry {
    tools: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl FrozenRegistry {
    /// Tools in registration order.
    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        self.tools.iter().map(ToolDescriptor::to_mcp_tool).collect()
    }

    #[must_use]
    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Dispatch a call by tool name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownTool`] if no tool has that name. Failures inside the
    /// tool come back as an error [`ToolReply`], not as `Err`.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: &ToolArguments,
    ) -> Result<ToolReply, RegistryError> {
        let tool = self
            .get(name)
            .ok_or_else(|| RegistryError::UnknownTool(name.to_string()))?;
        Ok(tool.handler.call(arguments).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct Echo(&'static str);

    #[async_trait]
    impl ToolHandler for Echo {
        async fn call(&self, arguments: &ToolArguments) -> ToolReply {
            let echoed = serde_json::Value::Object(arguments.clone());
            ToolReply::success(format!("{}:{echoed}", self.0))
        }
    }

    fn descriptor(name: &str, method: HttpMethod, tag: &'static str) -> ToolDescriptor {
        ToolDescriptor {
            name: name.to_string(),
            description: format!("{method} /{name}"),
            method,
            path: format!("/{name}"),
            contract: ParameterContract::default(),
            handler: Arc::new(Echo(tag)),
        }
    }

    #[tokio::test]
    async fn register_freeze_and_dispatch() {
        let mut registry = ToolRegistry::new();
        assert!(registry.is_empty());
        registry.register(descriptor("get_pets", HttpMethod::Get, "list"));
        registry.register(descriptor("post_pets", HttpMethod::Post, "create"));
        assert!(registry.contains("get_pets"));
        assert_eq!(registry.len(), 2);

        let frozen = registry.freeze();
        assert_eq!(frozen.len(), 2);
        assert_eq!(frozen.get("post_pets").unwrap().method, HttpMethod::Post);

        let args = json!({ "limit": 1 }).as_object().cloned().unwrap();
        let reply = frozen.call_tool("get_pets", &args).await.unwrap();
        assert_eq!(reply, ToolReply::success(r#"list:{"limit":1}"#));

        let err = frozen.call_tool("nope", &args).await.unwrap_err();
        assert_eq!(err.to_string(), "Tool not found: nope");
    }

    #[test]
    fn duplicate_registration_replaces_in_place() {
        let mut registry = ToolRegistry::new();
        registry.register(descriptor("get_pets", HttpMethod::Get, "old"));
        registry.register(descriptor("get_user", HttpMethod::Get, "user"));
        let replaced = registry.register(descriptor("get_pets", HttpMethod::Get, "new"));

        assert!(replaced.is_some());
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["get_pets", "get_user"]);
    }

    #[test]
    fn list_tools_carries_schema_and_method_hints() {
        let mut registry = ToolRegistry::new();
        registry.register(descriptor("get_pets", HttpMethod::Get, "list"));
        registry.register(descriptor("delete_pet", HttpMethod::Delete, "delete"));
        let tools = registry.freeze().list_tools();

        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0].name, "get_pets");
        assert_eq!(tools[0].input_schema.get("type"), Some(&json!("object")));

        let get_hints = tools[0].annotations.as_ref().unwrap();
        assert_eq!(get_hints.read_only_hint, Some(true));
        let delete_hints = tools[1].annotations.as_ref().unwrap();
        assert_eq!(delete_hints.destructive_hint, Some(true));
    }
}
