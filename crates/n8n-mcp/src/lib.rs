//! # n8n MCP
//!
//! An MCP (Model Context Protocol) server exposing the n8n workflow
//! automation API to AI assistants.
//!
//! ## Overview
//!
//! The crate is layered bottom-up:
//! - **Errors**: [`ApiError`] classifies every failed n8n call by kind
//! - **Clients**: one client per n8n area over a shared [`N8nApiClient`]
//! - **Formatting**: [`format_success`] and [`format_error`] turn outcomes
//!   into MCP tool results
//! - **Tools and resources**: MCP handlers built on the clients
//! - **Server and transport**: JSON-RPC dispatch over stdio
//!
//! ## MCP Protocol
//!
//! Supported methods:
//! - `initialize`: Initialize the MCP session
//! - `ping`: Liveness probe
//! - `tools/list`: List available tools
//! - `tools/call`: Execute a tool
//! - `resources/list`: List available resources
//! - `resources/read`: Read a resource
//!
//! ## Tool Categories
//!
//! - `workflow`: list, read, create, update, delete, activate, deactivate
//!   and move workflows, and manage their tags
//! - `execution`: list, inspect, delete and stop executions, run workflows
//!   and webhooks
//! - `tag`, `variable`, `project`, `user`, `credential`
//! - `source_control`: pull from the connected repository
//! - `security_audit`: generate an audit report
//!
//! ## Usage
//!
//! ```rust,no_run
//! use n8n_mcp::{all_resources, all_tools, McpServer, N8nClients, N8nConfig};
//!
//! async fn run() -> Result<(), Box<dyn std::error::Error>> {
//!     let clients = N8nClients::from_config(N8nConfig::from_env()?)?;
//!     let server = McpServer::n8n();
//!     server.register_tools(all_tools(&clients)).await;
//!     server.register_resources(all_resources(&clients)).await;
//!     n8n_mcp::transport::serve_stdio(&server).await?;
//!     Ok(())
//! }
//! ```

pub mod clients;
pub mod error;
pub mod format;
pub mod health;
pub mod resources;
pub mod server;
pub mod tools;
pub mod transport;
pub mod types;

// Re-export main types
pub use error::{ApiError, ApiErrorKind, ApiResult};
pub use format::{format_error, format_message, format_success};
pub use server::{McpServer, McpServerError, McpServerResult, Resource, Tool, ToolContext};
pub use types::{
    ContentBlock, McpError, McpRequest, McpResponse, RequestId, ResourceDefinition,
    ServerCapabilities, ServerInfo, ToolDefinition, ToolResult,
};

// Re-export clients
pub use clients::{ConfigError, N8nApiClient, N8nClients, N8nConfig};

// Re-export tool and resource collections
pub use resources::all_resources;
pub use tools::all_tools;

pub use health::{HealthChecker, HealthReport, HealthStatus};
pub use transport::{serve, serve_stdio, TransportError};
