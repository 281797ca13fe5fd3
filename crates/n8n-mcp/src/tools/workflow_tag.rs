//! Workflow tag MCP tools

use super::parse_args;
use crate::clients::{N8nClients, WorkflowTagClient};
use crate::format::{format_error, format_success};
use crate::server::{McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, instrument};

const CATEGORY: &str = "workflow_tag";

/// Tool to list the tags attached to a workflow.
pub struct ListWorkflowTagsTool {
    client: WorkflowTagClient,
}

#[async_trait]
impl Tool for ListWorkflowTagsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("workflow_tags_list", "List the tags assigned to a workflow")
            .with_category(CATEGORY)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "workflowId": {
                        "type": "string",
                        "description": "ID of the workflow"
                    }
                },
                "required": ["workflowId"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "workflow_tags_list"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: ListParams = parse_args(args)?;

        match self.client.list(&params.workflow_id).await {
            Ok(tags) => {
                let message = format!(
                    "Successfully retrieved {} tags for workflow {}",
                    tags.len(),
                    params.workflow_id
                );
                Ok(format_success(Some(&tags), Some(&message)))
            }
            Err(e) => {
                error!("Failed to list tags of workflow {}: {}", params.workflow_id, e);
                Ok(format_error(e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    workflow_id: String,
}

/// Tool to replace the tags attached to a workflow.
pub struct UpdateWorkflowTagsTool {
    client: WorkflowTagClient,
}

#[async_trait]
impl Tool for UpdateWorkflowTagsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "workflow_tags_update",
            "Replace the set of tags assigned to a workflow",
        )
        .with_category(CATEGORY)
        .with_schema(json!({
            "type": "object",
            "properties": {
                "workflowId": {
                    "type": "string",
                    "description": "ID of the workflow"
                },
                "tagIds": {
                    "type": "array",
                    "description": "IDs of the tags to assign; an empty list removes all tags",
                    "items": { "type": "string" }
                }
            },
            "required": ["workflowId", "tagIds"]
        }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "workflow_tags_update"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: UpdateParams = parse_args(args)?;

        match self.client.update(&params.workflow_id, &params.tag_ids).await {
            Ok(tags) => {
                let message = format!("Successfully updated tags for workflow {}", params.workflow_id);
                Ok(format_success(Some(&tags), Some(&message)))
            }
            Err(e) => {
                error!("Failed to update tags of workflow {}: {}", params.workflow_id, e);
                Ok(format_error(e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateParams {
    workflow_id: String,
    tag_ids: Vec<String>,
}

/// Get all workflow tag tools.
pub fn workflow_tag_tools(clients: &N8nClients) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ListWorkflowTagsTool {
            client: clients.workflow_tags.clone(),
        }),
        Arc::new(UpdateWorkflowTagsTool {
            client: clients.workflow_tags.clone(),
        }),
    ]
}
