//! n8n API clients.
//!
//! [`N8nApiClient`] owns the HTTP connection and error classification. The
//! resource clients wrap it per n8n area:
//! - Workflows, workflow tags and executions
//! - Tags, variables and projects
//! - Users and credentials
//! - Source control and security audits
//! - Webhook invocation
//!
//! All of them take the shared client as an `Arc`, so one configured
//! connection pool serves every tool.

pub mod api;
pub mod config;
pub mod credential;
pub mod execution;
pub mod project;
pub mod security_audit;
pub mod source_control;
pub mod tag;
pub mod user;
pub mod variable;
pub mod webhook;
pub mod workflow;
pub mod workflow_tag;

pub use api::{N8nApiClient, QueryParams};
pub use config::{ConfigError, N8nConfig};
pub use credential::CredentialClient;
pub use execution::ExecutionClient;
pub use project::ProjectClient;
pub use security_audit::SecurityAuditClient;
pub use source_control::SourceControlClient;
pub use tag::TagClient;
pub use user::UserClient;
pub use variable::VariableClient;
pub use webhook::WebhookClient;
pub use workflow::WorkflowClient;
pub use workflow_tag::WorkflowTagClient;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize an ID that n8n may send as a string, a number or null.
pub(crate) fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// Every resource client built over one shared API client.
#[derive(Debug, Clone)]
pub struct N8nClients {
    pub api: std::sync::Arc<N8nApiClient>,
    pub workflows: WorkflowClient,
    pub workflow_tags: WorkflowTagClient,
    pub executions: ExecutionClient,
    pub tags: TagClient,
    pub variables: VariableClient,
    pub projects: ProjectClient,
    pub users: UserClient,
    pub credentials: CredentialClient,
    pub source_control: SourceControlClient,
    pub security_audit: SecurityAuditClient,
    pub webhooks: WebhookClient,
}

impl N8nClients {
    /// Build all resource clients over `api`.
    pub fn new(api: std::sync::Arc<N8nApiClient>) -> Self {
        Self {
            workflows: WorkflowClient::new(api.clone()),
            workflow_tags: WorkflowTagClient::new(api.clone()),
            executions: ExecutionClient::new(api.clone()),
            tags: TagClient::new(api.clone()),
            variables: VariableClient::new(api.clone()),
            projects: ProjectClient::new(api.clone()),
            users: UserClient::new(api.clone()),
            credentials: CredentialClient::new(api.clone()),
            source_control: SourceControlClient::new(api.clone()),
            security_audit: SecurityAuditClient::new(api.clone()),
            webhooks: WebhookClient::new(api.clone()),
            api,
        }
    }

    /// Build the API client from configuration, then all resource clients.
    pub fn from_config(config: N8nConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(std::sync::Arc::new(N8nApiClient::new(config)?)))
    }
}
