//! Workflow tag client.
//!
//! Reads and replaces the set of tags attached to one workflow.

use super::api::{unwrap_list, N8nApiClient};
use super::tag::Tag;
use crate::error::{ApiError, ApiResult};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

/// Tag reference in the `PUT /workflows/{id}/tags` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagRef<'a> {
    pub id: &'a str,
}

/// Workflow tag API client.
#[derive(Debug, Clone)]
pub struct WorkflowTagClient {
    api: Arc<N8nApiClient>,
}

impl WorkflowTagClient {
    /// Create a new workflow tag client.
    pub fn new(api: Arc<N8nApiClient>) -> Self {
        Self { api }
    }

    /// List the tags of a workflow.
    #[instrument(skip(self), fields(workflow_id = %workflow_id))]
    pub async fn list(&self, workflow_id: &str) -> ApiResult<Vec<Tag>> {
        let context = format!("Failed to get tags for workflow {}", workflow_id);
        let body: Value = self
            .api
            .get(&format!("/workflows/{}/tags", workflow_id), &context)
            .await?;
        unwrap_list(body, &context)
    }

    /// Replace the tags of a workflow.
    #[instrument(skip(self, tag_ids), fields(workflow_id = %workflow_id, count = tag_ids.len()))]
    pub async fn update(&self, workflow_id: &str, tag_ids: &[String]) -> ApiResult<Vec<Tag>> {
        let body: Vec<TagRef<'_>> = tag_ids.iter().map(|id| TagRef { id }).collect();
        let context = format!("Failed to update tags for workflow {}", workflow_id);

        let response: Value = self
            .api
            .put(&format!("/workflows/{}/tags", workflow_id), &body, &context)
            .await
            .map_err(rewrite_update_error)?;
        unwrap_list(response, &context)
    }
}

fn rewrite_update_error(e: ApiError) -> ApiError {
    match e.server_message().map(str::to_string) {
        Some(message) if e.has_status(400) => e.with_message(format!(
            "Workflow tags update failed due to validation: {}",
            message
        )),
        _ => e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tag_ref_body() {
        let ids = vec!["t1".to_string(), "t2".to_string()];
        let body: Vec<TagRef<'_>> = ids.iter().map(|id| TagRef { id }).collect();
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!([{"id": "t1"}, {"id": "t2"}])
        );
    }

    #[test]
    fn test_rewrite_update_error() {
        let e = rewrite_update_error(ApiError::from_status(
            "bad",
            400,
            Some(json!({"message": "Tag t9 not found"})),
        ));
        assert_eq!(
            e.message,
            "Workflow tags update failed due to validation: Tag t9 not found"
        );

        let e = rewrite_update_error(ApiError::from_status("Not Found", 404, None));
        assert_eq!(e.message, "Not Found");
    }
}
