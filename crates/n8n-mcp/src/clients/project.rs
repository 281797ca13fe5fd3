//! Project client.
//!
//! Projects need an n8n licence tier that community editions lack; the
//! licence failures are surfaced with explicit messages, and listing degrades
//! to an empty result.

use super::api::{unwrap_list, N8nApiClient, QueryParams};
use super::id_string;
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{instrument, warn};

/// Project lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    Archived,
    Draft,
    Completed,
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Active => "active",
            Self::Archived => "archived",
            Self::Draft => "draft",
            Self::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// An n8n project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Project ID.
    #[serde(default, deserialize_with = "id_string")]
    pub id: String,

    /// Project name.
    #[serde(default)]
    pub name: String,

    /// Project type (personal, team).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Filters for `GET /projects`.
#[derive(Debug, Clone, Default)]
pub struct ProjectListParams {
    pub status: Option<ProjectStatus>,
    pub owner_id: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Body of `PATCH /projects/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Project API client.
#[derive(Debug, Clone)]
pub struct ProjectClient {
    api: Arc<N8nApiClient>,
}

impl ProjectClient {
    /// Create a new project client.
    pub fn new(api: Arc<N8nApiClient>) -> Self {
        Self { api }
    }

    /// List projects.
    ///
    /// A 403 whose message mentions the licence yields an empty list.
    #[instrument(skip(self))]
    pub async fn list(&self, params: ProjectListParams) -> ApiResult<Vec<Project>> {
        let query = QueryParams::new()
            .push_opt("status", params.status)
            .push_opt("ownerId", params.owner_id)
            .push_opt("limit", params.limit)
            .push_opt("offset", params.offset);

        let context = "Failed to get projects";
        match self.api.get_with_query::<Value>("/projects", &query, context).await {
            Ok(body) => unwrap_list(body, context),
            Err(e) if is_license_error(&e) => {
                warn!(
                    "Projects not available in current license: {}",
                    e.server_message().unwrap_or("License restriction")
                );
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Create a project. Only `name` is sent.
    #[instrument(skip(self))]
    pub async fn create(&self, name: &str) -> ApiResult<Project> {
        self.api
            .post(
                "/projects",
                &serde_json::json!({ "name": name }),
                "Failed to create project",
            )
            .await
            .map_err(|e| {
                if is_license_error(&e) {
                    return e.with_message("Project creation not available in current license tier");
                }
                match e.server_message().map(str::to_string) {
                    Some(message) if e.has_status(400) => e.with_message(format!(
                        "Project creation failed due to validation: {}",
                        message
                    )),
                    _ => e,
                }
            })
    }

    /// Update a project.
    #[instrument(skip(self, update), fields(project_id = %id))]
    pub async fn update(&self, id: &str, update: &ProjectUpdate) -> ApiResult<Value> {
        self.api
            .patch(
                &format!("/projects/{}", id),
                update,
                &format!("Failed to update project {}", id),
            )
            .await
            .map_err(|e| {
                if is_license_error(&e) {
                    e.with_message("Project update not available in current license tier")
                } else {
                    e
                }
            })
    }

    /// Delete a project, optionally forcing removal of its contents.
    #[instrument(skip(self), fields(project_id = %id))]
    pub async fn delete(&self, id: &str, force: bool) -> ApiResult<()> {
        let query = if force {
            QueryParams::new().push("force", true)
        } else {
            QueryParams::new()
        };

        let _: Value = self
            .api
            .delete_with_query(
                &format!("/projects/{}", id),
                &query,
                &format!("Failed to delete project {}", id),
            )
            .await
            .map_err(|e| {
                if is_license_error(&e) {
                    e.with_message("Project deletion not available in current license tier")
                } else {
                    e
                }
            })?;
        Ok(())
    }
}

/// A 403 whose server message mentions the licence.
fn is_license_error(e: &ApiError) -> bool {
    e.has_status(403) && e.server_message_contains("license")
}
