//! Workflow client.
//!
//! CRUD, activation, project transfer and manual execution of n8n workflows.

use super::api::{unwrap_list, N8nApiClient, QueryParams};
use crate::error::ApiResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Settings keys accepted by `PUT /workflows/{id}`.
pub const ALLOWED_SETTINGS_KEYS: [&str; 7] = [
    "executionOrder",
    "saveExecutionProgress",
    "saveManualExecutions",
    "saveDataErrorExecution",
    "saveDataSuccessExecution",
    "executionTimeout",
    "timezone",
];

/// An n8n workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    /// Workflow ID.
    #[serde(default)]
    pub id: String,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Whether triggers are enabled.
    #[serde(default)]
    pub active: bool,

    /// Node definitions.
    #[serde(default)]
    pub nodes: Vec<Value>,

    /// Connections between nodes.
    #[serde(default)]
    pub connections: Value,

    /// Workflow settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,

    /// Tags assigned to the workflow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Value>>,

    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// Last update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `POST /workflows`.
///
/// Read-only fields (`id`, `active`, `tags`, timestamps) are never sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkflowRequest {
    /// Display name.
    pub name: String,

    /// Node definitions.
    pub nodes: Vec<Value>,

    /// Connections between nodes.
    pub connections: Value,

    /// Workflow settings.
    pub settings: Value,
}

impl CreateWorkflowRequest {
    /// Build a create request, filling in default settings when none are given.
    pub fn new(
        name: impl Into<String>,
        nodes: Option<Vec<Value>>,
        connections: Option<Value>,
        settings: Option<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            nodes: nodes.unwrap_or_default(),
            connections: connections.unwrap_or_else(|| Value::Object(Map::new())),
            settings: settings
                .filter(|s| !s.is_null())
                .unwrap_or_else(default_settings),
        }
    }
}

/// Requested changes for `PUT /workflows/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowUpdate {
    /// New name.
    pub name: Option<String>,

    /// Replacement nodes.
    pub nodes: Option<Vec<Value>>,

    /// Replacement connections.
    pub connections: Option<Value>,

    /// Replacement settings.
    pub settings: Option<Value>,

    /// New active flag.
    pub active: Option<bool>,
}

impl WorkflowUpdate {
    /// Whether no field is being changed.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.nodes.is_none()
            && self.connections.is_none()
            && self.settings.is_none()
            && self.active.is_none()
    }
}

/// Filters for `GET /workflows`.
#[derive(Debug, Clone, Default)]
pub struct WorkflowListParams {
    /// Tag ID filter.
    pub tags: Option<String>,

    /// Name search.
    pub search: Option<String>,

    /// Page size.
    pub limit: Option<u32>,

    /// Page offset.
    pub offset: Option<u32>,
}

/// Settings applied to new workflows that specify none.
pub fn default_settings() -> Value {
    serde_json::json!({
        "saveExecutionProgress": true,
        "saveManualExecutions": true,
        "saveDataErrorExecution": "all",
        "saveDataSuccessExecution": "all",
        "executionTimeout": 3600,
        "timezone": "UTC"
    })
}

/// Keep only the settings keys the update endpoint accepts.
pub fn filter_settings(settings: Option<&Value>) -> Value {
    let mut filtered = Map::new();
    if let Some(Value::Object(map)) = settings {
        for key in ALLOWED_SETTINGS_KEYS {
            if let Some(value) = map.get(key) {
                if !value.is_null() {
                    filtered.insert(key.to_string(), value.clone());
                }
            }
        }
    }
    Value::Object(filtered)
}

/// Workflow API client.
#[derive(Debug, Clone)]
pub struct WorkflowClient {
    api: Arc<N8nApiClient>,
}

impl WorkflowClient {
    /// Create a new workflow client.
    pub fn new(api: Arc<N8nApiClient>) -> Self {
        Self { api }
    }

    /// List workflows.
    #[instrument(skip(self))]
    pub async fn list(&self, params: WorkflowListParams) -> ApiResult<Vec<Workflow>> {
        let query = QueryParams::new()
            .push_opt("tags", params.tags)
            .push_opt("search", params.search)
            .push_opt("limit", params.limit)
            .push_opt("offset", params.offset);

        let context = "Failed to list workflows";
        let body: Value = self.api.get_with_query("/workflows", &query, context).await?;
        unwrap_list(body, context)
    }

    /// Read a workflow.
    #[instrument(skip(self), fields(workflow_id = %id))]
    pub async fn read(&self, id: &str) -> ApiResult<Workflow> {
        debug!("Fetching workflow {}", id);
        self.api
            .get(
                &format!("/workflows/{}", id),
                &format!("Failed to read workflow {}", id),
            )
            .await
    }

    /// Create a workflow.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(&self, request: &CreateWorkflowRequest) -> ApiResult<Workflow> {
        self.api
            .post("/workflows", request, "Failed to create workflow")
            .await
    }

    /// Update a workflow.
    ///
    /// The endpoint requires the full workflow, so the current version is
    /// read first and unchanged fields are carried over.
    #[instrument(skip(self, update), fields(workflow_id = %id))]
    pub async fn update(&self, id: &str, update: &WorkflowUpdate) -> ApiResult<Workflow> {
        let current = self.read(id).await?;
        self.apply_update(&current, update).await
    }

    /// Apply changes on top of an already fetched workflow.
    #[instrument(skip(self, current, update), fields(workflow_id = %current.id))]
    pub async fn apply_update(&self, current: &Workflow, update: &WorkflowUpdate) -> ApiResult<Workflow> {
        let id = current.id.as_str();
        let body = merge_update(current, update);

        debug!("Sending full workflow update for {}", id);
        self.api
            .put(
                &format!("/workflows/{}", id),
                &body,
                &format!("Failed to update workflow {}", id),
            )
            .await
    }

    /// Delete a workflow.
    #[instrument(skip(self), fields(workflow_id = %id))]
    pub async fn delete(&self, id: &str) -> ApiResult<Value> {
        self.api
            .delete(
                &format!("/workflows/{}", id),
                &format!("Failed to delete workflow {}", id),
            )
            .await
    }

    /// Activate a workflow.
    #[instrument(skip(self), fields(workflow_id = %id))]
    pub async fn activate(&self, id: &str) -> ApiResult<Workflow> {
        self.api
            .post_empty(
                &format!("/workflows/{}/activate", id),
                &format!("Failed to activate workflow {}", id),
            )
            .await
    }

    /// Deactivate a workflow.
    #[instrument(skip(self), fields(workflow_id = %id))]
    pub async fn deactivate(&self, id: &str) -> ApiResult<Workflow> {
        self.api
            .post_empty(
                &format!("/workflows/{}/deactivate", id),
                &format!("Failed to deactivate workflow {}", id),
            )
            .await
    }

    /// Transfer a workflow to another project.
    #[instrument(skip(self), fields(workflow_id = %id))]
    pub async fn transfer(&self, id: &str, destination_project_id: &str) -> ApiResult<Value> {
        self.api
            .put(
                &format!("/workflows/{}/transfer", id),
                &serde_json::json!({ "destinationProjectId": destination_project_id }),
                &format!(
                    "Failed to transfer workflow {} to project {}",
                    id, destination_project_id
                ),
            )
            .await
    }

    /// Start a manual execution of a workflow.
    #[instrument(skip(self, data), fields(workflow_id = %id))]
    pub async fn execute(&self, id: &str, data: Option<&Value>) -> ApiResult<Value> {
        let empty = Value::Object(Map::new());
        let body = data.unwrap_or(&empty);
        self.api
            .post(
                &format!("/workflows/{}/execute", id),
                body,
                &format!("Failed to execute workflow {}", id),
            )
            .await
    }
}

/// Build the full update body from the current workflow and requested changes.
pub fn merge_update(current: &Workflow, update: &WorkflowUpdate) -> Value {
    let mut body = Map::new();
    body.insert(
        "name".to_string(),
        Value::String(update.name.clone().unwrap_or_else(|| current.name.clone())),
    );
    body.insert(
        "nodes".to_string(),
        Value::Array(update.nodes.clone().unwrap_or_else(|| current.nodes.clone())),
    );
    body.insert(
        "connections".to_string(),
        update
            .connections
            .clone()
            .unwrap_or_else(|| current.connections.clone()),
    );
    let settings = match update.settings.as_ref() {
        Some(s) => filter_settings(Some(s)),
        None => filter_settings(current.settings.as_ref()),
    };
    body.insert("settings".to_string(), settings);
    if let Some(active) = update.active {
        body.insert("active".to_string(), Value::Bool(active));
    }
    Value::Object(body)
}
