//! Tag MCP tools

use super::parse_args;
use crate::clients::tag::{TagListParams, TagRequest};
use crate::clients::{N8nClients, TagClient};
use crate::format::{format_error, format_success};
use crate::server::{McpServerError, McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, instrument};

const CATEGORY: &str = "tag";

/// Tool to list tags.
pub struct ListTagsTool {
    client: TagClient,
}

#[async_trait]
impl Tool for ListTagsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("tag_list", "List tags, optionally filtered by name")
            .with_category(CATEGORY)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "search": {
                        "type": "string",
                        "description": "Filter tags by name"
                    },
                    "limit": {
                        "type": "number",
                        "description": "Maximum number of tags to return"
                    },
                    "offset": {
                        "type": "number",
                        "description": "Number of tags to skip"
                    }
                },
                "required": []
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "tag_list"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: ListTagsParams = parse_args(args)?;
        let search = params.search.clone();

        match self
            .client
            .list(TagListParams {
                search: params.search,
                limit: params.limit,
                offset: params.offset,
            })
            .await
        {
            Ok(tags) => {
                let mut message = format!("Found {} tag(s)", tags.len());
                if let Some(search) = search {
                    message.push_str(&format!(" matching \"{}\"", search));
                }
                message.push('.');
                Ok(format_success(Some(&tags), Some(&message)))
            }
            Err(e) => {
                error!("Failed to list tags: {}", e);
                Ok(format_error(e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListTagsParams {
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    limit: Option<u32>,
    #[serde(default)]
    offset: Option<u32>,
}

/// Tool to read a tag.
pub struct ReadTagTool {
    client: TagClient,
}

#[async_trait]
impl Tool for ReadTagTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("tag_read", "Retrieve a tag by ID")
            .with_category(CATEGORY)
            .with_schema(id_schema("ID of the tag to retrieve"))
    }

    #[instrument(skip(self, args, _context), fields(tool = "tag_read"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: TagIdParams = parse_args(args)?;

        match self.client.read(&params.id).await {
            Ok(tag) => {
                let message = format!("Retrieved tag: {} ({})", tag.name, tag.id);
                Ok(format_success(Some(&tag), Some(&message)))
            }
            Err(e) => {
                error!("Failed to read tag {}: {}", params.id, e);
                Ok(format_error(e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct TagIdParams {
    id: String,
}

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

/// Tool to create a tag.
pub struct CreateTagTool {
    client: TagClient,
}

#[async_trait]
impl Tool for CreateTagTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("tag_create", "Create a new tag")
            .with_category(CATEGORY)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Name of the tag"
                    },
                    "color": {
                        "type": "string",
                        "description": "Display colour, e.g. #ff0000"
                    }
                },
                "required": ["name"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "tag_create"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: CreateTagParams = parse_args(args)?;

        match self.client.create(&params.name, params.color.as_deref()).await {
            Ok(tag) => {
                let message = format!(
                    "Tag \"{}\" created successfully with ID: {}",
                    tag.name, tag.id
                );
                Ok(format_success(Some(&tag), Some(&message)))
            }
            Err(e) => {
                error!("Failed to create tag {}: {}", params.name, e);
                Ok(format_error(e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateTagParams {
    name: String,
    #[serde(default)]
    color: Option<String>,
}

/// Tool to update a tag.
pub struct UpdateTagTool {
    client: TagClient,
}

#[async_trait]
impl Tool for UpdateTagTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("tag_update", "Update the name or colour of a tag")
            .with_category(CATEGORY)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "id": {
                        "type": "string",
                        "description": "ID of the tag to update"
                    },
                    "name": {
                        "type": "string",
                        "description": "New name"
                    },
                    "color": {
                        "type": "string",
                        "description": "New display colour"
                    }
                },
                "required": ["id"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "tag_update"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: UpdateTagParams = parse_args(args)?;
        if params.name.is_none() && params.color.is_none() {
            return Err(McpServerError::InvalidParams(
                "At least one field to update is required".to_string(),
            ));
        }

        let request = TagRequest {
            name: params.name,
            color: params.color,
        };
        match self.client.update(&params.id, &request).await {
            Ok(tag) => {
                let message = format!("Tag \"{}\" updated successfully", tag.name);
                Ok(format_success(Some(&tag), Some(&message)))
            }
            Err(e) => {
                error!("Failed to update tag {}: {}", params.id, e);
                Ok(format_error(e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct UpdateTagParams {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    color: Option<String>,
}

/// Tool to delete a tag.
///
/// The tag is read first so the confirmation can name it.
pub struct DeleteTagTool {
    client: TagClient,
}

#[async_trait]
impl Tool for DeleteTagTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("tag_delete", "Delete a tag")
            .with_category(CATEGORY)
            .with_schema(id_schema("ID of the tag to delete"))
    }

    #[instrument(skip(self, args, _context), fields(tool = "tag_delete"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: TagIdParams = parse_args(args)?;

        let result = match self.client.read(&params.id).await {
            Ok(tag) => self.client.delete(&params.id).await.map(|_| tag),
            Err(e) => Err(e),
        };

        match result {
            Ok(tag) => {
                let message = format!("Tag \"{}\" ({}) deleted successfully", tag.name, params.id);
                Ok(format_success(
                    Some(&json!({ "id": params.id, "deleted": true })),
                    Some(&message),
                ))
            }
            Err(e) => {
                error!("Failed to delete tag {}: {}", params.id, e);
                Ok(format_error(e))
            }
        }
    }
}

/// Get all tag tools.
pub fn tag_tools(clients: &N8nClients) -> Vec<Arc<dyn Tool>> {
    let client = &clients.tags;
    vec![
        Arc::new(ListTagsTool {
            client: client.clone(),
        }),
        Arc::new(ReadTagTool {
            client: client.clone(),
        }),
        Arc::new(CreateTagTool {
            client: client.clone(),
        }),
        Arc::new(UpdateTagTool {
            client: client.clone(),
        }),
        Arc::new(DeleteTagTool {
            client: client.clone(),
        }),
    ]
}
