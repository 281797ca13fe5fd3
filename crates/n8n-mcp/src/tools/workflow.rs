//! Workflow MCP tools
//!
//! Listing, reading, creating, updating, deleting, activating and moving
//! n8n workflows.

use super::parse_args;
use crate::clients::workflow::{CreateWorkflowRequest, Workflow, WorkflowListParams, WorkflowUpdate};
use crate::clients::{N8nClients, WorkflowClient, WorkflowTagClient};
use crate::format::{format_error, format_success};
use crate::server::{McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

const CATEGORY: &str = "workflow";

/// Short view returned by list, create and activation tools.
fn brief(workflow: &Workflow) -> Value {
    json!({
        "id": workflow.id,
        "name": workflow.name,
        "active": workflow.active,
    })
}

/// Tool to list workflows.
pub struct ListWorkflowsTool {
    client: WorkflowClient,
}

#[async_trait]
impl Tool for ListWorkflowsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "workflow_list",
            "Retrieve a list of all workflows available in n8n",
        )
        .with_category(CATEGORY)
        .with_schema(json!({
            "type": "object",
            "properties": {
                "active": {
                    "type": "boolean",
                    "description": "Optional filter to show only active or inactive workflows"
                }
            },
            "required": []
        }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "workflow_list"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: ListWorkflowsParams = parse_args(args)?;

        match self.client.list(WorkflowListParams::default()).await {
            Ok(workflows) => {
                let listed: Vec<Value> = workflows
                    .iter()
                    .filter(|w| params.active.map_or(true, |active| w.active == active))
                    .map(|w| {
                        json!({
                            "id": w.id,
                            "name": w.name,
                            "active": w.active,
                            "updatedAt": w.updated_at,
                        })
                    })
                    .collect();

                let mut message = format!("Found {} workflow(s)", listed.len());
                if let Some(active) = params.active {
                    message.push_str(&format!(" (filtered by active={})", active));
                }
                Ok(format_success(Some(&listed), Some(&message)))
            }
            Err(e) => {
                error!("Failed to list workflows: {}", e);
                Ok(format_error(e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListWorkflowsParams {
    #[serde(default)]
    active: Option<bool>,
}

/// Tool to read a workflow.
pub struct ReadWorkflowTool {
    client: WorkflowClient,
}

#[async_trait]
impl Tool for ReadWorkflowTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "workflow_read",
            "Retrieve details of a specific workflow by ID",
        )
        .with_category(CATEGORY)
        .with_schema(json!({
            "type": "object",
            "properties": {
                "workflowId": {
                    "type": "string",
                    "description": "ID of the workflow to retrieve"
                }
            },
            "required": ["workflowId"]
        }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "workflow_read"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: WorkflowIdParams = parse_args(args)?;

        match self.client.read(&params.workflow_id).await {
            Ok(workflow) => {
                let message = format!("Retrieved workflow: {}", workflow.name);
                Ok(format_success(Some(&workflow), Some(&message)))
            }
            Err(e) => {
                error!("Failed to read workflow {}: {}", params.workflow_id, e);
                Ok(format_error(e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkflowIdParams {
    workflow_id: String,
}

/// Tool to create a workflow.
///
/// The API treats `active` as read-only on creation, so an active workflow is
/// created first and then activated.
pub struct CreateWorkflowTool {
    client: WorkflowClient,
}

#[async_trait]
impl Tool for CreateWorkflowTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("workflow_create", "Create a new workflow in n8n")
            .with_category(CATEGORY)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Name of the workflow"
                    },
                    "nodes": {
                        "type": "array",
                        "description": "Array of node objects defining the workflow",
                        "items": { "type": "object" }
                    },
                    "connections": {
                        "type": "object",
                        "description": "Connection mappings between nodes"
                    },
                    "active": {
                        "type": "boolean",
                        "description": "Whether the workflow should be active upon creation (defaults to false)"
                    },
                    "settings": {
                        "type": "object",
                        "description": "Workflow settings; defaults are applied when omitted"
                    }
                },
                "required": ["name"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "workflow_create"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: CreateWorkflowParams = parse_args(args)?;
        debug!("Creating workflow: {}", params.name);

        let request = CreateWorkflowRequest::new(
            params.name,
            params.nodes,
            params.connections,
            params.settings,
        );

        let mut workflow = match self.client.create(&request).await {
            Ok(workflow) => workflow,
            Err(e) => {
                error!("Failed to create workflow: {}", e);
                return Ok(format_error(e));
            }
        };

        if params.active == Some(true) {
            match self.client.activate(&workflow.id).await {
                Ok(activated) => workflow.active = activated.active,
                Err(e) => warn!("Workflow {} created but not activated: {}", workflow.id, e),
            }
        }

        Ok(format_success(
            Some(&brief(&workflow)),
            Some("Workflow created successfully"),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct CreateWorkflowParams {
    name: String,
    #[serde(default)]
    nodes: Option<Vec<Value>>,
    #[serde(default)]
    connections: Option<Value>,
    #[serde(default)]
    active: Option<bool>,
    #[serde(default)]
    settings: Option<Value>,
}

/// Tool to update a workflow.
pub struct UpdateWorkflowTool {
    client: WorkflowClient,
    tags: WorkflowTagClient,
}

#[async_trait]
impl Tool for UpdateWorkflowTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("workflow_update", "Update an existing workflow in n8n")
            .with_category(CATEGORY)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "workflowId": {
                        "type": "string",
                        "description": "ID of the workflow to update"
                    },
                    "name": {
                        "type": "string",
                        "description": "New name for the workflow"
                    },
                    "nodes": {
                        "type": "array",
                        "description": "Updated array of node objects that define the workflow",
                        "items": { "type": "object" }
                    },
                    "connections": {
                        "type": "object",
                        "description": "Updated connection mappings between nodes"
                    },
                    "active": {
                        "type": "boolean",
                        "description": "Whether the workflow should be active"
                    },
                    "settings": {
                        "type": "object",
                        "description": "Updated workflow settings"
                    },
                    "tags": {
                        "type": "array",
                        "description": "IDs of the tags to assign to the workflow",
                        "items": { "type": "string" }
                    }
                },
                "required": ["workflowId"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "workflow_update"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: UpdateWorkflowParams = parse_args(args)?;
        let id = params.workflow_id.as_str();

        let current = match self.client.read(id).await {
            Ok(workflow) => workflow,
            Err(e) => {
                error!("Failed to read workflow {} before update: {}", id, e);
                return Ok(format_error(e));
            }
        };

        let update = WorkflowUpdate {
            name: params.name,
            nodes: params.nodes,
            connections: params.connections,
            settings: params.settings,
            active: params.active,
        };

        if update.is_empty() && params.tags.is_none() {
            return Ok(format_success(
                Some(&current),
                Some("No changes requested - workflow unchanged"),
            ));
        }

        let updated = if update.is_empty() {
            current.clone()
        } else {
            match self.client.apply_update(&current, &update).await {
                Ok(workflow) => workflow,
                Err(e) => {
                    error!("Failed to update workflow {}: {}", id, e);
                    return Ok(format_error(e));
                }
            }
        };

        if let Some(ref tags) = params.tags {
            if let Err(e) = self.tags.update(id, tags).await {
                warn!("Failed to update tags for workflow {}: {}", id, e);
            }
        }

        let changes = describe_changes(&current, &update, params.tags.is_some());
        let message = if changes.is_empty() {
            "Workflow updated successfully".to_string()
        } else {
            format!(
                "Workflow updated successfully. Changes applied: {}",
                changes.join(", ")
            )
        };

        Ok(format_success(Some(&brief(&updated)), Some(&message)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateWorkflowParams {
    workflow_id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    nodes: Option<Vec<Value>>,
    #[serde(default)]
    connections: Option<Value>,
    #[serde(default)]
    active: Option<bool>,
    #[serde(default)]
    settings: Option<Value>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

/// Human-readable list of what an update changes.
fn describe_changes(current: &Workflow, update: &WorkflowUpdate, tags: bool) -> Vec<String> {
    let mut changes = Vec::new();
    if let Some(ref name) = update.name {
        if *name != current.name {
            changes.push(format!("name: \"{}\" → \"{}\"", current.name, name));
        }
    }
    if let Some(active) = update.active {
        if active != current.active {
            changes.push(format!("active: {} → {}", current.active, active));
        }
    }
    if update.nodes.is_some() {
        changes.push("nodes updated".to_string());
    }
    if update.connections.is_some() {
        changes.push("connections updated".to_string());
    }
    if update.settings.is_some() {
        changes.push("settings updated".to_string());
    }
    if tags {
        changes.push("tags updated".to_string());
    }
    changes
}

/// Tool to delete a workflow.
pub struct DeleteWorkflowTool {
    client: WorkflowClient,
}

#[async_trait]
impl Tool for DeleteWorkflowTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("workflow_delete", "Delete a workflow from n8n")
            .with_category(CATEGORY)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "workflowId": {
                        "type": "string",
                        "description": "ID of the workflow to delete"
                    }
                },
                "required": ["workflowId"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "workflow_delete"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: WorkflowIdParams = parse_args(args)?;

        match self.client.delete(&params.workflow_id).await {
            Ok(_) => {
                let message = format!("Workflow {} deleted successfully", params.workflow_id);
                Ok(format_success(
                    Some(&json!({ "id": params.workflow_id, "deleted": true })),
                    Some(&message),
                ))
            }
            Err(e) => {
                error!("Failed to delete workflow {}: {}", params.workflow_id, e);
                Ok(format_error(e))
            }
        }
    }
}

/// Tool to activate or deactivate a workflow.
pub struct SetWorkflowActiveTool {
    client: WorkflowClient,
    active: bool,
}

#[async_trait]
impl Tool for SetWorkflowActiveTool {
    fn definition(&self) -> ToolDefinition {
        let (name, description) = if self.active {
            ("workflow_activate", "Activate a workflow so its triggers run")
        } else {
            ("workflow_deactivate", "Deactivate a workflow so its triggers stop")
        };
        ToolDefinition::new(name, description)
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

    #[instrument(skip(self, args, _context), fields(active = self.active))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: WorkflowIdParams = parse_args(args)?;

        let (result, verb) = if self.active {
            (self.client.activate(&params.workflow_id).await, "activated")
        } else {
            (self.client.deactivate(&params.workflow_id).await, "deactivated")
        };

        match result {
            Ok(workflow) => {
                let message = format!("Workflow \"{}\" {}", workflow.name, verb);
                Ok(format_success(Some(&brief(&workflow)), Some(&message)))
            }
            Err(e) => {
                error!("Failed to change workflow {} state: {}", params.workflow_id, e);
                Ok(format_error(e))
            }
        }
    }
}

/// Tool to move a workflow to another project.
pub struct MoveWorkflowTool {
    client: WorkflowClient,
}

#[async_trait]
impl Tool for MoveWorkflowTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("workflow_move", "Move a workflow to a different project")
            .with_category(CATEGORY)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "workflowId": {
                        "type": "string",
                        "description": "ID of the workflow to move"
                    },
                    "destinationProjectId": {
                        "type": "string",
                        "description": "ID of the project to move the workflow to"
                    }
                },
                "required": ["workflowId", "destinationProjectId"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "workflow_move"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: MoveWorkflowParams = parse_args(args)?;

        match self
            .client
            .transfer(&params.workflow_id, &params.destination_project_id)
            .await
        {
            Ok(result) => {
                let message = format!(
                    "Workflow {} moved to project {}",
                    params.workflow_id, params.destination_project_id
                );
                Ok(format_success(Some(&result), Some(&message)))
            }
            Err(e) => {
                error!("Failed to move workflow {}: {}", params.workflow_id, e);
                Ok(format_error(e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveWorkflowParams {
    workflow_id: String,
    destination_project_id: String,
}

/// Get all workflow tools.
pub fn workflow_tools(clients: &N8nClients) -> Vec<Arc<dyn Tool>> {
    let client = &clients.workflows;
    vec![
        Arc::new(ListWorkflowsTool {
            client: client.clone(),
        }),
        Arc::new(ReadWorkflowTool {
            client: client.clone(),
        }),
        Arc::new(CreateWorkflowTool {
            client: client.clone(),
        }),
        Arc::new(UpdateWorkflowTool {
            client: client.clone(),
            tags: clients.workflow_tags.clone(),
        }),
        Arc::new(DeleteWorkflowTool {
            client: client.clone(),
        }),
        Arc::new(SetWorkflowActiveTool {
            client: client.clone(),
            active: true,
        }),
        Arc::new(SetWorkflowActiveTool {
            client: client.clone(),
            active: false,
        }),
        Arc::new(MoveWorkflowTool {
            client: client.clone(),
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workflow() -> Workflow {
        serde_json::from_value(json!({
            "id": "wf-1",
            "name": "Nightly",
            "active": false,
            "nodes": [],
            "connections": {}
        }))
        .unwrap()
    }

    #[test]
    fn test_describe_changes() {
        let update = WorkflowUpdate {
            name: Some("Hourly".to_string()),
            active: Some(true),
            nodes: Some(Vec::new()),
            ..Default::default()
        };
        let changes = describe_changes(&workflow(), &update, true);
        assert_eq!(
            changes,
            vec![
                "name: \"Nightly\" → \"Hourly\"",
                "active: false → true",
                "nodes updated",
                "tags updated",
            ]
        );
    }

    #[test]
    fn test_describe_changes_ignores_same_values() {
        let update = WorkflowUpdate {
            name: Some("Nightly".to_string()),
            active: Some(false),
            ..Default::default()
        };
        assert!(describe_changes(&workflow(), &update, false).is_empty());
    }

    #[test]
    fn test_update_params_require_workflow_id() {
        let err = parse_args::<UpdateWorkflowParams>(json!({"name": "x"})).unwrap_err();
        assert!(err.to_string().contains("workflowId"));
    }
}
