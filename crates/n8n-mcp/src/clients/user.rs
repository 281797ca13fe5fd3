//! User client.

use super::api::{unwrap_list, unwrap_record, N8nApiClient};
use super::id_string;
use crate::error::ApiResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::instrument;

/// Instance-level user roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Owner,
    Admin,
    Member,
}

impl UserRole {
    /// Role name expected by `PATCH /users/{id}/role`.
    ///
    /// The owner role cannot be assigned through the API.
    pub fn global_role_name(&self) -> Option<&'static str> {
        match self {
            Self::Owner => None,
            Self::Admin => Some("global:admin"),
            Self::Member => Some("global:member"),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Member => "member",
        };
        f.write_str(name)
    }
}

/// An n8n user.
///
/// `role` is kept as sent by the server, which may be a global role name
/// such as `global:member`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub is_pending: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl User {
    /// Public view without settings or other sensitive fields.
    pub fn public_view(&self) -> Value {
        serde_json::json!({
            "id": self.id,
            "email": self.email,
            "firstName": self.first_name,
            "lastName": self.last_name,
            "role": self.role,
            "isPending": self.is_pending,
            "createdAt": self.created_at,
        })
    }
}

/// Body of `POST /users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// User API client.
#[derive(Debug, Clone)]
pub struct UserClient {
    api: Arc<N8nApiClient>,
}

impl UserClient {
    /// Create a new user client.
    pub fn new(api: Arc<N8nApiClient>) -> Self {
        Self { api }
    }

    /// List users.
    #[instrument(skip(self))]
    pub async fn list(&self) -> ApiResult<Vec<User>> {
        let context = "Failed to list users";
        let body: Value = self.api.get("/users", context).await?;
        unwrap_list(body, context)
    }

    /// Read a user by ID or email.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn read(&self, id: &str) -> ApiResult<User> {
        let context = format!("Failed to get user {}", id);
        let body: Value = self.api.get(&format!("/users/{}", id), &context).await?;
        unwrap_record(body, &context)
    }

    /// Create a user.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn create(&self, request: &CreateUserRequest) -> ApiResult<User> {
        let context = "Failed to create user";
        let body: Value = self.api.post("/users", request, context).await?;
        unwrap_record(body, context)
    }

    /// Change a user's global role.
    ///
    /// n8n answers with an empty body, so the updated user is only returned
    /// when the server sends one back.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn change_role(&self, id: &str, role_name: &str) -> ApiResult<Option<User>> {
        let context = format!("Failed to change role for user {}", id);
        let body: Value = self
            .api
            .patch(
                &format!("/users/{}/role", id),
                &serde_json::json!({ "newRoleName": role_name }),
                &context,
            )
            .await?;
        let body = match body {
            Value::Object(ref map) if map.get("data").map(Value::is_null).unwrap_or(false) => {
                Value::Null
            }
            other => other,
        };
        let user: Option<User> = unwrap_record(body, &context)?;
        Ok(user.filter(|user| !user.id.is_empty()))
    }

    /// Delete a user.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn delete(&self, id: &str) -> ApiResult<Value> {
        self.api
            .delete(&format!("/users/{}", id), &format!("Failed to delete user {}", id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_global_role_names() {
        assert_eq!(UserRole::Admin.global_role_name(), Some("global:admin"));
        assert_eq!(UserRole::Member.global_role_name(), Some("global:member"));
        assert_eq!(UserRole::Owner.global_role_name(), None);
    }

    #[test]
    fn test_public_view_omits_settings() {
        let user: User = serde_json::from_value(json!({
            "id": "u1",
            "email": "ada@example.com",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "role": "global:member",
            "isPending": false,
            "settings": {"theme": "dark"}
        }))
        .unwrap();
        let view = user.public_view();
        assert_eq!(view["email"], "ada@example.com");
        assert_eq!(view["role"], "global:member");
        assert!(view.get("settings").is_none());
    }

    #[test]
    fn test_create_request_body() {
        let body = serde_json::to_value(CreateUserRequest {
            email: "ada@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            role: UserRole::Member,
            password: None,
        })
        .unwrap();
        assert_eq!(
            body,
            json!({"email": "ada@example.com", "firstName": "Ada", "lastName": "Lovelace", "role": "member"})
        );
    }
}
