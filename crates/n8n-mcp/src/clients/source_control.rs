//! Source control client.

use super::api::N8nApiClient;
use crate::error::ApiResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

/// Outcome of `POST /source-control/pull`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceControlPullResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub files_updated: u64,
    #[serde(default)]
    pub has_conflicts: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflicts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceControlPullResult {
    /// One-line description of the pull for MCP hosts.
    pub fn describe(&self) -> String {
        let mut message = if self.success {
            format!(
                "Successfully pulled changes. {} files updated.",
                self.files_updated
            )
        } else {
            "Failed to pull changes.".to_string()
        };
        if self.has_conflicts {
            let count = self.conflicts.as_ref().map(Vec::len).unwrap_or(0);
            message.push_str(&format!(" Conflicts detected in {} file(s).", count));
        }
        message
    }
}

/// Source control API client.
#[derive(Debug, Clone)]
pub struct SourceControlClient {
    api: Arc<N8nApiClient>,
}

impl SourceControlClient {
    /// Create a new source control client.
    pub fn new(api: Arc<N8nApiClient>) -> Self {
        Self { api }
    }

    /// Pull changes from the connected repository.
    #[instrument(skip(self))]
    pub async fn pull(&self, force: bool) -> ApiResult<SourceControlPullResult> {
        self.api
            .post(
                "/source-control/pull",
                &serde_json::json!({ "force": force }),
                "Failed to pull changes from source control",
            )
            .await
    }
}
