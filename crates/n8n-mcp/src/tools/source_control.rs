//! Source control MCP tools

use super::parse_args;
use crate::clients::{N8nClients, SourceControlClient};
use crate::format::{format_error, format_success};
use crate::server::{McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, instrument, warn};

/// Tool to pull changes from the connected Git repository.
pub struct PullSourceControlTool {
    client: SourceControlClient,
}

#[async_trait]
impl Tool for PullSourceControlTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "source_control_pull",
            "Pull workflow and credential changes from the connected Git repository",
        )
        .with_category("source_control")
        .with_schema(json!({
            "type": "object",
            "properties": {
                "force": {
                    "type": "boolean",
                    "description": "Overwrite local changes",
                    "default": false
                }
            },
            "required": []
        }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "source_control_pull"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: PullParams = parse_args(args)?;

        match self.client.pull(params.force).await {
            Ok(result) => {
                if result.has_conflicts {
                    warn!("Source control pull reported conflicts");
                }
                let message = result.describe();
                Ok(format_success(Some(&result), Some(&message)))
            }
            Err(e) => {
                error!("Failed to pull from source control: {}", e);
                Ok(format_error(e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct PullParams {
    #[serde(default)]
    force: bool,
}

/// Get all source control tools.
pub fn source_control_tools(clients: &N8nClients) -> Vec<Arc<dyn Tool>> {
    vec![Arc::new(PullSourceControlTool {
        client: clients.source_control.clone(),
    })]
}
