//! MCP server implementation
//!
//! This module provides the registry of n8n tools and resources and the
//! JSON-RPC dispatch used by the stdio transport.

use crate::error::ApiResult;
use crate::format::format_error;
use crate::types::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

/// MCP server error types.
#[derive(Debug, Error)]
pub enum McpServerError {
    /// Tool not found
    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    /// Resource not found
    #[error("Unknown resource: {0}")]
    ResourceNotFound(String),

    /// Invalid parameters
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for MCP server operations.
pub type McpServerResult<T> = Result<T, McpServerError>;

/// Trait for tool implementations.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool definition.
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with given arguments.
    ///
    /// Failures of the n8n API are reported as an error [`ToolResult`];
    /// `Err` is reserved for bad arguments.
    async fn execute(&self, args: Value, context: &ToolContext) -> McpServerResult<ToolResult>;
}

/// Trait for read-only resources.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Get the resource definition.
    fn definition(&self) -> ResourceDefinition;

    /// Area name used in read failure messages, e.g. `workflows`.
    fn area(&self) -> &'static str;

    /// Build the current resource document.
    async fn read(&self) -> ApiResult<Value>;
}

/// Context for tool execution.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Request correlation ID
    pub correlation_id: String,

    /// When the call was received
    pub started_at: DateTime<Utc>,
}

impl ToolContext {
    /// Create a context for a new call.
    pub fn new() -> Self {
        Self {
            correlation_id: uuid::Uuid::now_v7().to_string(),
            started_at: Utc::now(),
        }
    }
}

impl Default for ToolContext {
    fn default() -> Self {
        Self::new()
    }
}

/// n8n MCP server.
///
/// Holds the registered tools and resources and answers JSON-RPC requests.
pub struct McpServer {
    /// Server info
    info: ServerInfo,

    /// Server capabilities
    capabilities: ServerCapabilities,

    /// Registered tools
    tools: Arc<RwLock<HashMap<String, Arc<dyn Tool>>>>,

    /// Registered resources, by URI
    resources: Arc<RwLock<HashMap<String, Arc<dyn Resource>>>>,

    /// Tool categories
    categories: Arc<RwLock<Vec<String>>>,
}

impl McpServer {
    /// Create a new MCP server.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            info: ServerInfo {
                name: name.into(),
                version: version.into(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ToolCapabilities {
                    list_changed: false,
                }),
                resources: Some(ResourceCapabilities {
                    subscribe: false,
                    list_changed: false,
                }),
            },
            tools: Arc::new(RwLock::new(HashMap::new())),
            resources: Arc::new(RwLock::new(HashMap::new())),
            categories: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Create with the default n8n server identity.
    pub fn n8n() -> Self {
        Self::new("n8n-mcp-server", env!("CARGO_PKG_VERSION"))
    }

    /// Register a tool.
    pub async fn register_tool(&self, tool: Arc<dyn Tool>) {
        let definition = tool.definition();
        let name = definition.name.clone();

        if let Some(ref category) = definition.category {
            let mut categories = self.categories.write().await;
            if !categories.contains(category) {
                categories.push(category.clone());
            }
        }

        let mut tools = self.tools.write().await;
        if tools.insert(name.clone(), tool).is_some() {
            warn!("Tool {} registered twice, keeping the latest", name);
        }
    }

    /// Register multiple tools.
    pub async fn register_tools(&self, tools: Vec<Arc<dyn Tool>>) {
        for tool in tools {
            self.register_tool(tool).await;
        }
    }

    /// Register a resource.
    pub async fn register_resource(&self, resource: Arc<dyn Resource>) {
        let uri = resource.definition().uri;
        let mut resources = self.resources.write().await;
        resources.insert(uri, resource);
    }

    /// Register multiple resources.
    pub async fn register_resources(&self, resources: Vec<Arc<dyn Resource>>) {
        for resource in resources {
            self.register_resource(resource).await;
        }
    }

    /// Get all tool definitions, sorted by name.
    pub async fn list_tools(&self) -> Vec<ToolDefinition> {
        let tools = self.tools.read().await;
        let mut definitions: Vec<ToolDefinition> = tools.values().map(|t| t.definition()).collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Get tools by category.
    pub async fn list_tools_by_category(&self, category: &str) -> Vec<ToolDefinition> {
        self.list_tools()
            .await
            .into_iter()
            .filter(|d| d.category.as_deref() == Some(category))
            .collect()
    }

    /// Get all categories.
    pub async fn list_categories(&self) -> Vec<String> {
        self.categories.read().await.clone()
    }

    /// Get all resource definitions, sorted by URI.
    pub async fn list_resources(&self) -> Vec<ResourceDefinition> {
        let resources = self.resources.read().await;
        let mut definitions: Vec<ResourceDefinition> =
            resources.values().map(|r| r.definition()).collect();
        definitions.sort_by(|a, b| a.uri.cmp(&b.uri));
        definitions
    }

    /// Execute a tool.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let tool = {
            let tools = self.tools.read().await;
            tools
                .get(name)
                .cloned()
                .ok_or_else(|| McpServerError::ToolNotFound(name.to_string()))?
        };

        let definition = tool.definition();
        if let Some(missing) = missing_argument(&definition, &arguments) {
            return Err(McpServerError::InvalidParams(format!(
                "Missing required parameter: {}",
                missing
            )));
        }

        debug!(
            tool = name,
            correlation_id = %context.correlation_id,
            "Calling tool"
        );
        tool.execute(arguments, context).await
    }

    /// Read a resource document.
    pub async fn read_resource(&self, uri: &str) -> McpServerResult<ResourceContents> {
        let resource = {
            let resources = self.resources.read().await;
            resources
                .get(uri)
                .cloned()
                .ok_or_else(|| McpServerError::ResourceNotFound(uri.to_string()))?
        };

        let document = resource.read().await.map_err(|e| {
            error!("Failed to read resource {}: {}", uri, e);
            McpServerError::Internal(format!("Failed to retrieve {}: {}", resource.area(), e))
        })?;

        let text = serde_json::to_string_pretty(&document)
            .map_err(|e| McpServerError::Internal(e.to_string()))?;

        Ok(ResourceContents {
            uri: uri.to_string(),
            mime_type: resource.definition().mime_type,
            text,
        })
    }

    /// Handle an incoming message.
    ///
    /// Notifications get no response.
    pub async fn handle_message(&self, request: McpRequest) -> Option<McpResponse> {
        if request.is_notification() {
            debug!("Received notification {}", request.method);
            return None;
        }
        Some(self.handle_request(request).await)
    }

    /// Handle an MCP request.
    pub async fn handle_request(&self, request: McpRequest) -> McpResponse {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id),
            "ping" => McpResponse::success(request.id, serde_json::json!({})),
            "tools/list" => self.handle_tools_list(request.id).await,
            "tools/call" => self.handle_tools_call(request.id, request.params).await,
            "resources/list" => self.handle_resources_list(request.id).await,
            "resources/read" => self.handle_resources_read(request.id, request.params).await,
            _ => McpResponse::error(request.id, McpError::method_not_found(&request.method)),
        }
    }

    fn handle_initialize(&self, id: RequestId) -> McpResponse {
        McpResponse::success(
            id,
            serde_json::json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": self.capabilities,
                "serverInfo": self.info
            }),
        )
    }

    async fn handle_tools_list(&self, id: RequestId) -> McpResponse {
        let tools = self.list_tools().await;
        McpResponse::success(id, serde_json::json!({ "tools": tools }))
    }

    async fn handle_tools_call(&self, id: RequestId, params: Option<Value>) -> McpResponse {
        let params = match params {
            Some(p) => p,
            None => return McpResponse::error(id, McpError::invalid_params("Missing params")),
        };

        let call: ToolCall = match serde_json::from_value(params) {
            Ok(c) => c,
            Err(e) => return McpResponse::error(id, McpError::invalid_params(e.to_string())),
        };

        let context = ToolContext::new();
        let result = match self.call_tool(&call.name, call.arguments, &context).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Tool call {} rejected: {}", call.name, e);
                format_error(e)
            }
        };

        match serde_json::to_value(result) {
            Ok(value) => McpResponse::success(id, value),
            Err(e) => McpResponse::error(id, McpError::internal_error(e.to_string())),
        }
    }

    async fn handle_resources_list(&self, id: RequestId) -> McpResponse {
        let resources = self.list_resources().await;
        McpResponse::success(id, serde_json::json!({ "resources": resources }))
    }

    async fn handle_resources_read(&self, id: RequestId, params: Option<Value>) -> McpResponse {
        let params: ReadResourceParams = match params.map(serde_json::from_value) {
            Some(Ok(p)) => p,
            Some(Err(e)) => return McpResponse::error(id, McpError::invalid_params(e.to_string())),
            None => return McpResponse::error(id, McpError::invalid_params("Missing params")),
        };

        match self.read_resource(&params.uri).await {
            Ok(contents) => McpResponse::success(id, serde_json::json!({ "contents": [contents] })),
            Err(McpServerError::ResourceNotFound(uri)) => McpResponse::error(
                id,
                McpError::invalid_params(format!("Unknown resource: {}", uri)),
            ),
            Err(McpServerError::Internal(message)) => {
                McpResponse::error(id, McpError::internal_error(message))
            }
            Err(e) => McpResponse::error(id, McpError::internal_error(e.to_string())),
        }
    }
}

/// First required argument that is absent, null or an empty string.
///
/// Properties whose schema sets `minLength: 0` accept the empty string.
fn missing_argument<'a>(definition: &'a ToolDefinition, arguments: &Value) -> Option<&'a str> {
    definition.required_arguments().into_iter().find(|name| {
        match arguments.get(*name) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty() && !definition.accepts_empty(name),
            Some(_) => false,
        }
    })
}
