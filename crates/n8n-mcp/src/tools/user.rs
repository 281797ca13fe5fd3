//! User MCP tools
//!
//! Responses go through [`User::public_view`] so settings and other
//! sensitive fields never reach the host.

use super::parse_args;
use crate::clients::user::{CreateUserRequest, User, UserRole};
use crate::clients::{N8nClients, UserClient};
use crate::error::ApiErrorKind;
use crate::format::{format_error, format_success};
use crate::server::{McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, instrument};

const CATEGORY: &str = "user";

fn id_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": {
                "type": "string",
                "description": description
            }
        },
        "required": ["id"]
    })
}

#[derive(Debug, Deserialize)]
struct UserIdParams {
    id: String,
}

/// Tool to list users.
pub struct ListUsersTool {
    client: UserClient,
}

#[async_trait]
impl Tool for ListUsersTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("user_list", "List users of the n8n instance")
            .with_category(CATEGORY)
    }

    #[instrument(skip(self, _args, _context), fields(tool = "user_list"))]
    async fn execute(&self, _args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        match self.client.list().await {
            Ok(users) => {
                let listed: Vec<Value> = users.iter().map(User::public_view).collect();
                let message = format!("Found {} user(s)", listed.len());
                Ok(format_success(Some(&listed), Some(&message)))
            }
            Err(e) => {
                error!("Failed to list users: {}", e);
                Ok(format_error(e))
            }
        }
    }
}

/// Tool to read a user.
pub struct ReadUserTool {
    client: UserClient,
}

#[async_trait]
impl Tool for ReadUserTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("user_read", "Retrieve a user by ID or email")
            .with_category(CATEGORY)
            .with_schema(id_schema("User ID or email address"))
    }

    #[instrument(skip(self, args, _context), fields(tool = "user_read"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: UserIdParams = parse_args(args)?;

        match self.client.read(&params.id).await {
            Ok(user) => {
                let message = format!("Retrieved information for user {}", user.email);
                Ok(format_success(Some(&user.public_view()), Some(&message)))
            }
            Err(e) => {
                error!("Failed to read user {}: {}", params.id, e);
                Ok(format_error(e))
            }
        }
    }
}

/// Tool to create a user.
pub struct CreateUserTool {
    client: UserClient,
}

#[async_trait]
impl Tool for CreateUserTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("user_create", "Create (invite) a new user")
            .with_category(CATEGORY)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "email": {
                        "type": "string",
                        "description": "Email address"
                    },
                    "firstName": {
                        "type": "string",
                        "description": "First name"
                    },
                    "lastName": {
                        "type": "string",
                        "description": "Last name"
                    },
                    "role": {
                        "type": "string",
                        "enum": ["owner", "admin", "member"],
                        "description": "Role of the new user"
                    },
                    "password": {
                        "type": "string",
                        "description": "Initial password"
                    }
                },
                "required": ["email", "firstName", "lastName", "role"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "user_create"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let request: CreateUserRequest = parse_args(args)?;

        match self.client.create(&request).await {
            Ok(user) => {
                let message = format!("User {} created successfully", user.email);
                Ok(format_success(Some(&user.public_view()), Some(&message)))
            }
            Err(e) => {
                error!("Failed to create user {}: {}", request.email, e);
                Ok(format_error(e))
            }
        }
    }
}

/// Tool to change a user's global role.
pub struct ChangeUserRoleTool {
    client: UserClient,
}

#[async_trait]
impl Tool for ChangeUserRoleTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("user_change_role", "Change the global role of a user")
            .with_category(CATEGORY)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "id": {
                        "type": "string",
                        "description": "ID of the user"
                    },
                    "role": {
                        "type": "string",
                        "enum": ["admin", "member"],
                        "description": "New role; the owner role cannot be assigned"
                    }
                },
                "required": ["id", "role"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "user_change_role"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: ChangeRoleParams = parse_args(args)?;

        let Some(role_name) = params.role.global_role_name() else {
            return Ok(format_error("Owner role cannot be changed via API"));
        };

        match self.client.change_role(&params.id, role_name).await {
            Ok(user) => {
                let message = format!("User role changed to {} successfully", params.role);
                let data = match user {
                    Some(user) => user.public_view(),
                    None => json!({ "id": params.id, "role": role_name }),
                };
                Ok(format_success(Some(&data), Some(&message)))
            }
            Err(e) => {
                error!("Failed to change role of user {}: {}", params.id, e);
                Ok(format_error(e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChangeRoleParams {
    id: String,
    role: UserRole,
}

/// Tool to delete a user.
pub struct DeleteUserTool {
    client: UserClient,
}

#[async_trait]
impl Tool for DeleteUserTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("user_delete", "Delete a user")
            .with_category(CATEGORY)
            .with_schema(id_schema("ID of the user to delete"))
    }

    #[instrument(skip(self, args, _context), fields(tool = "user_delete"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: UserIdParams = parse_args(args)?;

        let user = match self.client.read(&params.id).await {
            Ok(user) => user,
            Err(e) if e.kind == ApiErrorKind::NotFound => {
                return Ok(format_error(
                    e.with_message(format!("User with ID {} not found", params.id)),
                ));
            }
            Err(e) => {
                error!("Failed to read user {} before delete: {}", params.id, e);
                return Ok(format_error(e));
            }
        };

        match self.client.delete(&params.id).await {
            Ok(_) => {
                let message = format!("User {} deleted successfully", user.email);
                Ok(format_success(
                    Some(&json!({ "id": params.id, "email": user.email, "deleted": true })),
                    Some(&message),
                ))
            }
            Err(e) => {
                error!("Failed to delete user {}: {}", params.id, e);
                Ok(format_error(e))
            }
        }
    }
}

/// Get all user tools.
pub fn user_tools(clients: &N8nClients) -> Vec<Arc<dyn Tool>> {
    let client = &clients.users;
    vec![
        Arc::new(ListUsersTool {
            client: client.clone(),
        }),
        Arc::new(ReadUserTool {
            client: client.clone(),
        }),
        Arc::new(CreateUserTool {
            client: client.clone(),
        }),
        Arc::new(ChangeUserRoleTool {
            client: client.clone(),
        }),
        Arc::new(DeleteUserTool {
            client: client.clone(),
        }),
    ]
}
