//! Variable MCP tools
//!
//! Variables need a licensed n8n instance; the client turns licence failures
//! into empty lists or explicit messages, so these tools stay thin.

use super::parse_args;
use crate::clients::variable::{VariableListParams, VariableType};
use crate::clients::{N8nClients, VariableClient};
use crate::format::{format_error, format_success};
use crate::server::{McpServerError, McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, instrument};

const CATEGORY: &str = "variable";

const VARIABLE_TYPES: [&str; 8] = [
    "string",
    "number",
    "boolean",
    "credential",
    "secret",
    "expression",
    "configuration",
    "custom",
];

/// Tool to list variables.
pub struct ListVariablesTool {
    client: VariableClient,
}

#[async_trait]
impl Tool for ListVariablesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("variable_list", "List environment variables defined in n8n")
            .with_category(CATEGORY)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "projectId": {
                        "type": "string",
                        "description": "Only variables of this project"
                    },
                    "type": {
                        "type": "string",
                        "enum": VARIABLE_TYPES,
                        "description": "Only variables of this type"
                    },
                    "includeSystem": {
                        "type": "boolean",
                        "description": "Include system variables"
                    },
                    "includeValues": {
                        "type": "boolean",
                        "description": "Include variable values"
                    },
                    "limit": {
                        "type": "number",
                        "description": "Maximum number of variables to return"
                    },
                    "offset": {
                        "type": "number",
                        "description": "Number of variables to skip"
                    }
                },
                "required": []
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "variable_list"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: ListVariablesParams = parse_args(args)?;

        let mut suffix = String::new();
        if let Some(ref project_id) = params.project_id {
            suffix.push_str(&format!(" for project {}", project_id));
        }
        if let Some(kind) = params.kind {
            suffix.push_str(&format!(" of type {}", kind));
        }

        let filters = VariableListParams {
            project_id: params.project_id,
            kind: params.kind,
            include_system: params.include_system,
            include_values: params.include_values,
            limit: params.limit,
            offset: params.offset,
        };

        match self.client.list(filters).await {
            Ok(variables) => {
                let message = format!("Found {} variable(s){}.", variables.len(), suffix);
                Ok(format_success(Some(&variables), Some(&message)))
            }
            Err(e) => {
                error!("Failed to list variables: {}", e);
                Ok(format_error(e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListVariablesParams {
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<VariableType>,
    #[serde(default)]
    include_system: Option<bool>,
    #[serde(default)]
    include_values: Option<bool>,
    #[serde(default)]
    limit: Option<u32>,
    #[serde(default)]
    offset: Option<u32>,
}

/// Tool to create a variable.
///
/// Only `key` and `value` reach the API; the other arguments are accepted
/// for compatibility and logged.
pub struct CreateVariableTool {
    client: VariableClient,
}

#[async_trait]
impl Tool for CreateVariableTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("variable_create", "Create a new environment variable")
            .with_category(CATEGORY)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "key": {
                        "type": "string",
                        "description": "Variable key"
                    },
                    "value": {
                        "type": "string",
                        "minLength": 0,
                        "description": "Variable value, may be empty"
                    },
                    "description": {
                        "type": "string",
                        "description": "Description of the variable"
                    },
                    "type": {
                        "type": "string",
                        "enum": VARIABLE_TYPES,
                        "description": "Variable type"
                    },
                    "projectId": {
                        "type": "string",
                        "description": "Project the variable belongs to"
                    }
                },
                "required": ["key", "value"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "variable_create"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: CreateVariableParams = parse_args(args)?;
        if params.description.is_some() || params.kind.is_some() || params.project_id.is_some() {
            debug!("Ignoring description, type and projectId for variable {}", params.key);
        }

        match self.client.create(&params.key, &params.value).await {
            Ok(variable) => {
                let message = format!("Variable \"{}\" created successfully", params.key);
                Ok(format_success(Some(&variable), Some(&message)))
            }
            Err(e) => {
                error!("Failed to create variable {}: {}", params.key, e);
                Ok(format_error(e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateVariableParams {
    key: String,
    value: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<VariableType>,
    #[serde(default)]
    project_id: Option<String>,
}

/// Tool to delete a variable by ID or by key.
pub struct DeleteVariableTool {
    client: VariableClient,
}

#[async_trait]
impl Tool for DeleteVariableTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("variable_delete", "Delete an environment variable by ID or key")
            .with_category(CATEGORY)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "id": {
                        "type": "string",
                        "description": "ID of the variable to delete"
                    },
                    "key": {
                        "type": "string",
                        "description": "Key of the variable to delete, used when no ID is given"
                    },
                    "projectId": {
                        "type": "string",
                        "description": "Project to search when deleting by key"
                    }
                },
                "required": []
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "variable_delete"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: DeleteVariableParams = parse_args(args)?;

        let (result, target) = match (params.id.as_deref(), params.key.as_deref()) {
            (Some(id), _) if !id.is_empty() => (
                self.client.delete(id).await.map(|_| id.to_string()),
                format!("with ID {}", id),
            ),
            (_, Some(key)) if !key.is_empty() => (
                self.client
                    .delete_by_key(key, params.project_id.as_deref())
                    .await,
                format!("with key \"{}\"", key),
            ),
            _ => {
                return Err(McpServerError::InvalidParams(
                    "Either variable ID or key is required".to_string(),
                ))
            }
        };

        match result {
            Ok(id) => {
                let message = format!("Variable {} deleted successfully", target);
                Ok(format_success(
                    Some(&json!({ "id": id, "deleted": true })),
                    Some(&message),
                ))
            }
            Err(e) => {
                error!("Failed to delete variable {}: {}", target, e);
                Ok(format_error(e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteVariableParams {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    project_id: Option<String>,
}

/// Get all variable tools.
pub fn variable_tools(clients: &N8nClients) -> Vec<Arc<dyn Tool>> {
    let client = &clients.variables;
    vec![
        Arc::new(ListVariablesTool {
            client: client.clone(),
        }),
        Arc::new(CreateVariableTool {
            client: client.clone(),
        }),
        Arc::new(DeleteVariableTool {
            client: client.clone(),
        }),
    ]
}
