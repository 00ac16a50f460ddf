//! MCP server over a frozen tool registry.

use apibridge_openapi_tools::FrozenRegistry;
use apibridge_openapi_tools::builder::{ToolArguments, ToolReply};
use apibridge_openapi_tools::error::RegistryError;
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, model::*, service::RequestContext,
};
use std::sync::Arc;
use tracing::instrument;

/// Serves `tools/list` and `tools/call` from the registry built at startup.
#[derive(Clone)]
pub struct ApiBridgeServer {
    registry: Arc<FrozenRegistry>,
    instructions: Option<String>,
}

impl ApiBridgeServer {
    #[must_use]
    pub fn new(registry: FrozenRegistry, instructions: Option<String>) -> Self {
        Self {
            registry: Arc::new(registry),
            instructions,
        }
    }

    #[must_use]
    pub fn tools(&self) -> Vec<Tool> {
        self.registry.list_tools()
    }

    /// Unknown tools are a protocol error; failing calls are an `is_error` result.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: &ToolArguments,
    ) -> Result<CallToolResult, McpError> {
        match self.registry.call_tool(name, arguments).await {
            Ok(reply) => Ok(to_call_result(reply)),
            Err(e @ RegistryError::UnknownTool(_)) => {
                Err(McpError::invalid_params(e.to_string(), None))
            }
        }
    }
}

fn to_call_result(reply: ToolReply) -> CallToolResult {
    let content = vec![Content::text(reply.text)];
    if reply.is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

impl ServerHandler for ApiBridgeServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: self.instructions.clone(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    #[instrument(skip(self, _request, _context))]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: self.tools(),
            ..Default::default()
        })
    }

    #[instrument(skip(self, request, _context), fields(tool = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = request.arguments.unwrap_or_default();
        self.dispatch(&request.name, &arguments).await
    }
}
