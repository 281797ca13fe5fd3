//! Project MCP tools

use super::parse_args;
use crate::clients::project::{ProjectListParams, ProjectStatus, ProjectUpdate};
use crate::clients::{N8nClients, ProjectClient};
use crate::format::{format_error, format_success};
use crate::server::{McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, instrument};

const CATEGORY: &str = "project";

const PROJECT_STATUSES: [&str; 4] = ["active", "archived", "draft", "completed"];

/// Tool to list projects.
pub struct ListProjectsTool {
    client: ProjectClient,
}

#[async_trait]
impl Tool for ListProjectsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("project_list", "List projects")
            .with_category(CATEGORY)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "status": {
                        "type": "string",
                        "enum": PROJECT_STATUSES,
                        "description": "Only projects with this status"
                    },
                    "ownerId": {
                        "type": "string",
                        "description": "Only projects owned by this user"
                    },
                    "limit": {
                        "type": "number",
                        "description": "Maximum number of projects to return"
                    },
                    "offset": {
                        "type": "number",
                        "description": "Number of projects to skip"
                    }
                },
                "required": []
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "project_list"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: ListProjectsParams = parse_args(args)?;
        let status = params.status;

        let filters = ProjectListParams {
            status: params.status,
            owner_id: params.owner_id,
            limit: params.limit,
            offset: params.offset,
        };

        match self.client.list(filters).await {
            Ok(projects) => {
                let message = match status {
                    Some(status) => {
                        format!("Found {} project(s) with status: {}.", projects.len(), status)
                    }
                    None => format!("Found {} project(s).", projects.len()),
                };
                Ok(format_success(Some(&projects), Some(&message)))
            }
            Err(e) => {
                error!("Failed to list projects: {}", e);
                Ok(format_error(e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListProjectsParams {
    #[serde(default)]
    status: Option<ProjectStatus>,
    #[serde(default)]
    owner_id: Option<String>,
    #[serde(default)]
    limit: Option<u32>,
    #[serde(default)]
    offset: Option<u32>,
}

/// Tool to create a project.
pub struct CreateProjectTool {
    client: ProjectClient,
}

#[async_trait]
impl Tool for CreateProjectTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("project_create", "Create a new project")
            .with_category(CATEGORY)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Project name"
                    },
                    "description": {
                        "type": "string",
                        "description": "Project description"
                    },
                    "status": {
                        "type": "string",
                        "enum": PROJECT_STATUSES,
                        "description": "Initial status"
                    },
                    "metadata": {
                        "type": "object",
                        "description": "Free-form metadata"
                    }
                },
                "required": ["name"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "project_create"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: CreateProjectParams = parse_args(args)?;

        match self.client.create(&params.name).await {
            Ok(project) => {
                let message = format!(
                    "Project \"{}\" created successfully with ID: {}",
                    project.name, project.id
                );
                Ok(format_success(Some(&project), Some(&message)))
            }
            Err(e) => {
                error!("Failed to create project {}: {}", params.name, e);
                Ok(format_error(e))
            }
        }
    }
}

// The API only accepts a name on creation; the rest is validated and dropped.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct CreateProjectParams {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<ProjectStatus>,
    #[serde(default)]
    metadata: Option<Value>,
}

/// Tool to update a project.
pub struct UpdateProjectTool {
    client: ProjectClient,
}

#[async_trait]
impl Tool for UpdateProjectTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("project_update", "Update a project")
            .with_category(CATEGORY)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "id": {
                        "type": "string",
                        "description": "ID of the project to update"
                    },
                    "name": {
                        "type": "string",
                        "description": "New name"
                    },
                    "description": {
                        "type": "string",
                        "description": "New description"
                    },
                    "status": {
                        "type": "string",
                        "enum": PROJECT_STATUSES,
                        "description": "New status"
                    },
                    "metadata": {
                        "type": "object",
                        "description": "Replacement metadata"
                    }
                },
                "required": ["id"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "project_update"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: UpdateProjectParams = parse_args(args)?;
        let update = ProjectUpdate {
            name: params.name.clone(),
            description: params.description,
            status: params.status,
            metadata: params.metadata,
        };

        match self.client.update(&params.id, &update).await {
            Ok(project) => {
                let name = project
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .or(params.name)
                    .unwrap_or_else(|| params.id.clone());
                let message = format!("Project \"{}\" ({}) updated successfully", name, params.id);
                Ok(format_success(Some(&project), Some(&message)))
            }
            Err(e) => {
                error!("Failed to update project {}: {}", params.id, e);
                Ok(format_error(e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct UpdateProjectParams {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<ProjectStatus>,
    #[serde(default)]
    metadata: Option<Value>,
}

/// Tool to delete a project.
pub struct DeleteProjectTool {
    client: ProjectClient,
}

#[async_trait]
impl Tool for DeleteProjectTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("project_delete", "Delete a project")
            .with_category(CATEGORY)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "id": {
                        "type": "string",
                        "description": "ID of the project to delete"
                    },
                    "force": {
                        "type": "boolean",
                        "description": "Delete the project even if it still contains workflows or credentials",
                        "default": false
                    }
                },
                "required": ["id"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "project_delete"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: DeleteProjectParams = parse_args(args)?;

        match self.client.delete(&params.id, params.force).await {
            Ok(()) => {
                let message = format!(
                    "Project with ID \"{}\" {}deleted successfully",
                    params.id,
                    if params.force { "force " } else { "" }
                );
                Ok(format_success(
                    Some(&json!({ "id": params.id, "deleted": true })),
                    Some(&message),
                ))
            }
            Err(e) => {
                error!("Failed to delete project {}: {}", params.id, e);
                Ok(format_error(e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct DeleteProjectParams {
    id: String,
    #[serde(default)]
    force: bool,
}

/// Get all project tools.
pub fn project_tools(clients: &N8nClients) -> Vec<Arc<dyn Tool>> {
    let client = &clients.projects;
    vec![
        Arc::new(ListProjectsTool {
            client: client.clone(),
        }),
        Arc::new(CreateProjectTool {
            client: client.clone(),
        }),
        Arc::new(UpdateProjectTool {
            client: client.clone(),
        }),
        Arc::new(DeleteProjectTool {
            client: client.clone(),
        }),
    ]
}
