//! n8n MCP tools
//!
//! One [`Tool`] implementation per exposed operation, grouped by n8n area.
//! Every tool holds the resource client it needs, so the whole set is built
//! from one [`N8nClients`].

pub mod credential;
pub mod execution;
pub mod project;
pub mod security_audit;
pub mod source_control;
pub mod tag;
pub mod user;
pub mod variable;
pub mod workflow;
pub mod workflow_tag;

pub use credential::credential_tools;
pub use execution::execution_tools;
pub use project::project_tools;
pub use security_audit::security_audit_tools;
pub use source_control::source_control_tools;
pub use tag::tag_tools;
pub use user::user_tools;
pub use variable::variable_tools;
pub use workflow::workflow_tools;
pub use workflow_tag::workflow_tag_tools;

use crate::clients::N8nClients;
use crate::server::{McpServerError, McpServerResult, Tool};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Get all available MCP tools.
///
/// # Example
///
/// ```rust,no_run
/// use n8n_mcp::clients::{N8nClients, N8nConfig};
/// use n8n_mcp::tools::all_tools;
///
/// let config = N8nConfig::from_env().unwrap();
/// let clients = N8nClients::from_config(config).unwrap();
/// println!("Available tools: {}", all_tools(&clients).len());
/// ```
pub fn all_tools(clients: &N8nClients) -> Vec<Arc<dyn Tool>> {
    let mut tools = Vec::new();

    // Workflow tools (8)
    tools.extend(workflow_tools(clients));

    // Workflow tag tools (2)
    tools.extend(workflow_tag_tools(clients));

    // Execution tools (6)
    tools.extend(execution_tools(clients));

    // Tag tools (5)
    tools.extend(tag_tools(clients));

    // Variable tools (3)
    tools.extend(variable_tools(clients));

    // Project tools (4)
    tools.extend(project_tools(clients));

    // User tools (5)
    tools.extend(user_tools(clients));

    // Credential tools (3)
    tools.extend(credential_tools(clients));

    // Source control and security audit (1 + 1)
    tools.extend(source_control_tools(clients));
    tools.extend(security_audit_tools(clients));

    tools
}

/// Deserialize tool arguments, treating missing arguments as `{}`.
pub(crate) fn parse_args<T: DeserializeOwned>(args: Value) -> McpServerResult<T> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| McpServerError::InvalidParams(e.to_string()))
}
