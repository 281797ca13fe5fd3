//! Credential client.
//!
//! The public API does not expose credential reads, so only create, share
//! and delete are offered.

use super::api::N8nApiClient;
use crate::error::ApiResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

/// Body of `POST /credentials`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCredentialRequest {
    /// Credential name.
    pub name: String,

    /// Credential type, e.g. `githubApi`.
    #[serde(rename = "type")]
    pub kind: String,

    /// Type-specific secret data.
    pub data: Value,

    /// User IDs the credential is shared with.
    #[serde(default)]
    pub shared_with: Vec<String>,
}

/// Credential API client.
#[derive(Debug, Clone)]
pub struct CredentialClient {
    api: Arc<N8nApiClient>,
}

impl CredentialClient {
    /// Create a new credential client.
    pub fn new(api: Arc<N8nApiClient>) -> Self {
        Self { api }
    }

    /// Create a credential.
    #[instrument(skip(self, request), fields(name = %request.name, kind = %request.kind))]
    pub async fn create(&self, request: &CreateCredentialRequest) -> ApiResult<Value> {
        self.api
            .post("/credentials", request, "Failed to create credential")
            .await
    }

    /// Share a credential with a new owner.
    #[instrument(skip(self), fields(credential_id = %id))]
    pub async fn share(&self, id: &str, new_owner_id: &str) -> ApiResult<Value> {
        self.api
            .post(
                &format!("/credentials/{}/share", id),
                &serde_json::json!({ "shareWithId": new_owner_id }),
                &format!("Failed to move credential {}", id),
            )
            .await
    }

    /// Delete a credential.
    #[instrument(skip(self), fields(credential_id = %id))]
    pub async fn delete(&self, id: &str) -> ApiResult<Value> {
        self.api
            .delete(
                &format!("/credentials/{}", id),
                &format!("Failed to delete credential {}", id),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_request_body() {
        let body = serde_json::to_value(CreateCredentialRequest {
            name: "GitHub".to_string(),
            kind: "githubApi".to_string(),
            data: json!({"accessToken": "secret"}),
            shared_with: Vec::new(),
        })
        .unwrap();
        assert_eq!(
            body,
            json!({
                "name": "GitHub",
                "type": "githubApi",
                "data": {"accessToken": "secret"},
                "sharedWith": []
            })
        );
    }
}
