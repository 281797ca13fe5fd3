//! Credential MCP tools

use super::parse_args;
use crate::clients::credential::CreateCredentialRequest;
use crate::clients::{CredentialClient, N8nClients};
use crate::format::{format_error, format_success};
use crate::server::{McpServerError, McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, instrument};

const CATEGORY: &str = "credential";

/// Tool to create a credential.
pub struct CreateCredentialTool {
    client: CredentialClient,
}

#[async_trait]
impl Tool for CreateCredentialTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("credential_create", "Create a new credential")
            .with_category(CATEGORY)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Credential name"
                    },
                    "type": {
                        "type": "string",
                        "description": "Credential type, e.g. githubApi or httpBasicAuth"
                    },
                    "data": {
                        "type": "object",
                        "description": "Type-specific credential data"
                    },
                    "sharedWithUsers": {
                        "type": "array",
                        "description": "IDs of users to share the credential with",
                        "items": { "type": "string" }
                    }
                },
                "required": ["name", "type", "data"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "credential_create"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: CreateCredentialParams = parse_args(args)?;
        if !params.data.is_object() {
            return Err(McpServerError::InvalidParams(
                "Credential data must be an object".to_string(),
            ));
        }

        let request = CreateCredentialRequest {
            name: params.name,
            kind: params.kind,
            data: params.data,
            shared_with: params.shared_with_users,
        };

        match self.client.create(&request).await {
            Ok(credential) => {
                let message = format!("Successfully created credential \"{}\"", request.name);
                Ok(format_success(Some(&credential), Some(&message)))
            }
            Err(e) => {
                error!("Failed to create credential {}: {}", request.name, e);
                Ok(format_error(e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCredentialParams {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    data: Value,
    #[serde(default)]
    shared_with_users: Vec<String>,
}

/// Tool to move or share a credential.
pub struct MoveCredentialTool {
    client: CredentialClient,
}

#[async_trait]
impl Tool for MoveCredentialTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("credential_move", "Move or share a credential with another user")
            .with_category(CATEGORY)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "id": {
                        "type": "string",
                        "description": "ID of the credential"
                    },
                    "newOwnerId": {
                        "type": "string",
                        "description": "ID of the user receiving the credential"
                    }
                },
                "required": ["id", "newOwnerId"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "credential_move"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: MoveCredentialParams = parse_args(args)?;

        match self.client.share(&params.id, &params.new_owner_id).await {
            Ok(result) => {
                let message = format!("Successfully moved/shared credential with ID {}", params.id);
                Ok(format_success(Some(&result), Some(&message)))
            }
            Err(e) => {
                error!("Failed to move credential {}: {}", params.id, e);
                Ok(format_error(e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveCredentialParams {
    id: String,
    new_owner_id: String,
}

/// Tool to delete a credential.
pub struct DeleteCredentialTool {
    client: CredentialClient,
}

#[async_trait]
impl Tool for DeleteCredentialTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("credential_delete", "Delete a credential")
            .with_category(CATEGORY)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "id": {
                        "type": "string",
                        "description": "ID of the credential to delete"
                    }
                },
                "required": ["id"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "credential_delete"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: DeleteCredentialParams = parse_args(args)?;

        match self.client.delete(&params.id).await {
            Ok(result) => {
                let message = format!("Successfully deleted credential with ID {}", params.id);
                Ok(format_success(Some(&result), Some(&message)))
            }
            Err(e) => {
                error!("Failed to delete credential {}: {}", params.id, e);
                Ok(format_error(e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct DeleteCredentialParams {
    id: String,
}

/// Get all credential tools.
pub fn credential_tools(clients: &N8nClients) -> Vec<Arc<dyn Tool>> {
    let client = &clients.credentials;
    vec![
        Arc::new(CreateCredentialTool {
            client: client.clone(),
        }),
        Arc::new(MoveCredentialTool {
            client: client.clone(),
        }),
        Arc::new(DeleteCredentialTool {
            client: client.clone(),
        }),
    ]
}
