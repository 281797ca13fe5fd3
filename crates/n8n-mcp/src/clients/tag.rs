//! Tag client.

use super::api::{unwrap_list, N8nApiClient, QueryParams};
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{instrument, warn};

/// An n8n tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    /// Tag ID.
    #[serde(default)]
    pub id: String,

    /// Tag name.
    #[serde(default)]
    pub name: String,

    /// Display colour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// Last update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Body of `POST /tags` and `PUT /tags/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagRequest {
    /// Tag name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Display colour.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Filters for `GET /tags`.
#[derive(Debug, Clone, Default)]
pub struct TagListParams {
    /// Name search.
    pub search: Option<String>,

    /// Page size.
    pub limit: Option<u32>,

    /// Page offset.
    pub offset: Option<u32>,
}

/// Tag API client.
#[derive(Debug, Clone)]
pub struct TagClient {
    api: Arc<N8nApiClient>,
}

impl TagClient {
    /// Create a new tag client.
    pub fn new(api: Arc<N8nApiClient>) -> Self {
        Self { api }
    }

    /// List tags.
    #[instrument(skip(self))]
    pub async fn list(&self, params: TagListParams) -> ApiResult<Vec<Tag>> {
        let query = QueryParams::new()
            .push_opt("search", params.search)
            .push_opt("limit", params.limit)
            .push_opt("offset", params.offset);

        let context = "Failed to get tags";
        let body: Value = self.api.get_with_query("/tags", &query, context).await?;
        unwrap_list(body, context)
    }

    /// Read a tag.
    #[instrument(skip(self), fields(tag_id = %id))]
    pub async fn read(&self, id: &str) -> ApiResult<Tag> {
        self.api
            .get(&format!("/tags/{}", id), &format!("Failed to get tag {}", id))
            .await
    }

    /// Create a tag. Only `name` and `color` are sent.
    #[instrument(skip(self))]
    pub async fn create(&self, name: &str, color: Option<&str>) -> ApiResult<Tag> {
        let body = TagRequest {
            name: Some(name.to_string()),
            color: color.map(str::to_string),
        };
        self.api
            .post("/tags", &body, "Failed to create tag")
            .await
            .map_err(rewrite_create_error)
    }

    /// Update a tag.
    #[instrument(skip(self, request), fields(tag_id = %id))]
    pub async fn update(&self, id: &str, request: &TagRequest) -> ApiResult<Tag> {
        self.api
            .put(
                &format!("/tags/{}", id),
                request,
                &format!("Failed to update tag {}", id),
            )
            .await
            .map_err(rewrite_update_error)
    }

    /// Delete a tag.
    #[instrument(skip(self), fields(tag_id = %id))]
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        let _: Value = self
            .api
            .delete(&format!("/tags/{}", id), &format!("Failed to delete tag {}", id))
            .await?;
        Ok(())
    }
}

fn rewrite_create_error(e: ApiError) -> ApiError {
    match e.server_message().map(str::to_string) {
        Some(message) if e.has_status(400) => {
            warn!("Tag validation failed: {}", message);
            e.with_message(format!("Tag creation failed due to validation: {}", message))
        }
        _ => e,
    }
}

fn rewrite_update_error(e: ApiError) -> ApiError {
    if e.has_status(405) {
        return e.with_message("Tag update operation not supported by the n8n API");
    }
    let server_message = e.server_message().map(str::to_string);
    match server_message {
        Some(message) if e.has_status(409) && message.contains("already exists") => {
            e.with_message(format!("Tag update failed: {}", message))
        }
        Some(message) if e.has_status(400) => {
            e.with_message(format!("Tag update failed due to validation: {}", message))
        }
        _ => e,
    }
}
