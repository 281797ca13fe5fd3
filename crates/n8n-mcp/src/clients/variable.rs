//! Variable client.
//!
//! Variables are a licensed n8n feature, so this client downgrades or
//! rewrites the licence and permission failures the API reports.

use super::api::{unwrap_list, N8nApiClient, QueryParams};
use super::id_string;
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{instrument, warn};

/// Variable categories accepted as filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    String,
    Number,
    Boolean,
    Credential,
    Secret,
    Expression,
    Configuration,
    Custom,
}

impl VariableType {
    /// Wire name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Credential => "credential",
            Self::Secret => "secret",
            Self::Expression => "expression",
            Self::Configuration => "configuration",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An n8n variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    /// Variable ID.
    #[serde(default, deserialize_with = "id_string")]
    pub id: String,

    /// Variable key.
    #[serde(default)]
    pub key: String,

    /// Value, omitted by the server unless requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Variable type.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Owning project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

/// Filters for `GET /variables`.
#[derive(Debug, Clone, Default)]
pub struct VariableListParams {
    pub project_id: Option<String>,
    pub kind: Option<VariableType>,
    pub include_system: Option<bool>,
    pub include_values: Option<bool>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Body of `POST /variables`. The API accepts only key and value.
#[derive(Debug, Clone, Serialize)]
struct CreateVariableRequest<'a> {
    key: &'a str,
    value: &'a str,
}

/// Variable API client.
#[derive(Debug, Clone)]
pub struct VariableClient {
    api: Arc<N8nApiClient>,
}

impl VariableClient {
    /// Create a new variable client.
    pub fn new(api: Arc<N8nApiClient>) -> Self {
        Self { api }
    }

    /// List variables.
    ///
    /// A 403 (feature not licensed) yields an empty list.
    #[instrument(skip(self))]
    pub async fn list(&self, params: VariableListParams) -> ApiResult<Vec<Variable>> {
        let query = QueryParams::new()
            .push_opt("projectId", params.project_id)
            .push_opt("type", params.kind)
            .push_opt("includeSystem", params.include_system)
            .push_opt("includeValues", params.include_values)
            .push_opt("limit", params.limit)
            .push_opt("offset", params.offset);

        let context = "Failed to get variables";
        match self.api.get_with_query::<Value>("/variables", &query, context).await {
            Ok(body) => unwrap_list(body, context),
            Err(e) if e.has_status(403) => {
                warn!("Variables not available (403), returning empty list");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Create a variable.
    #[instrument(skip(self, value))]
    pub async fn create(&self, key: &str, value: &str) -> ApiResult<Variable> {
        self.api
            .post(
                "/variables",
                &CreateVariableRequest { key, value },
                "Failed to create variable",
            )
            .await
            .map_err(rewrite_create_error)
    }

    /// Delete a variable by ID.
    #[instrument(skip(self), fields(variable_id = %id))]
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        let _: Value = self
            .api
            .delete(
                &format!("/variables/{}", id),
                &format!("Failed to delete variable {}", id),
            )
            .await
            .map_err(|e| {
                if e.has_status(403) {
                    e.with_message(
                        "Variable deletion not available in current license or permission level",
                    )
                } else {
                    e
                }
            })?;
        Ok(())
    }

    /// Delete a variable by key, returning the deleted variable's ID.
    #[instrument(skip(self))]
    pub async fn delete_by_key(&self, key: &str, project_id: Option<&str>) -> ApiResult<String> {
        let variables = self
            .list(VariableListParams {
                project_id: project_id.map(str::to_string),
                ..Default::default()
            })
            .await?;

        let variable = variables
            .into_iter()
            .find(|v| v.key == key)
            .ok_or_else(|| ApiError::not_found(format!("Variable with key \"{}\" not found", key)))?;

        self.delete(&variable.id).await?;
        Ok(variable.id)
    }
}

fn rewrite_create_error(e: ApiError) -> ApiError {
    if e.has_status(400) {
        if let Some(message) = e.server_message().map(str::to_string) {
            return e.with_message(format!(
                "Variable creation failed due to validation: {}",
                message
            ));
        }
    }
    if e.has_status(402) {
        return e.with_message(
            "Variables feature requires enterprise license and is not available in the community edition",
        );
    }
    if e.has_status(403) {
        return e.with_message(
            "Insufficient permissions to manage variables. Variables may require enterprise features or specific roles.",
        );
    }
    e
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiErrorKind;
    use serde_json::json;

    #[test]
    fn test_variable_type_wire_names() {
        assert_eq!(VariableType::Secret.to_string(), "secret");
        let parsed: VariableType = serde_json::from_value(json!("configuration")).unwrap();
        assert_eq!(parsed, VariableType::Configuration);
    }

    #[test]
    fn test_create_body_has_only_key_and_value() {
        let body = serde_json::to_value(CreateVariableRequest {
            key: "API_HOST",
            value: "example.com",
        })
        .unwrap();
        assert_eq!(body, json!({"key": "API_HOST", "value": "example.com"}));
    }

    #[test]
    fn test_rewrite_create_error() {
        let e = rewrite_create_error(ApiError::from_status("x", 402, None));
        assert!(e.message.contains("enterprise license"));
        assert_eq!(e.kind, ApiErrorKind::InvalidRequest);

        let e = rewrite_create_error(ApiError::from_status("x", 403, None));
        assert!(e.message.starts_with("Insufficient permissions to manage variables"));
        assert_eq!(e.kind, ApiErrorKind::Authentication);

        let e = rewrite_create_error(ApiError::from_status(
            "x",
            400,
            Some(json!({"message": "key must be unique"})),
        ));
        assert_eq!(
            e.message,
            "Variable creation failed due to validation: key must be unique"
        );

        let e = rewrite_create_error(ApiError::from_status("Failed to create variable", 500, None));
        assert_eq!(e.message, "Failed to create variable");
    }
}
