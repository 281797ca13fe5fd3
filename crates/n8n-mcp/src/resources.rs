//! Read-only `n8n://` resources.
//!
//! Each resource fetches its area from the API and renders a summary
//! document carrying `resourceType`, `_links.self` and `lastUpdated`.

use crate::clients::project::ProjectListParams;
use crate::clients::tag::{Tag, TagListParams};
use crate::clients::user::User;
use crate::clients::variable::VariableListParams;
use crate::clients::workflow::{Workflow, WorkflowListParams};
use crate::clients::{
    N8nClients, ProjectClient, SecurityAuditClient, TagClient, UserClient, VariableClient,
    WorkflowClient,
};
use crate::error::ApiResult;
use crate::server::Resource;
use crate::types::ResourceDefinition;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;

/// Number of tags listed in the tags resource.
const RECENT_TAGS: usize = 10;

/// Number of issues listed in the security audit resource.
const AUDIT_ISSUES: usize = 5;

/// Wrap a resource body with the common envelope fields.
fn envelope(resource_type: &str, uri: &str, body: Value) -> Value {
    let mut document = Map::new();
    document.insert("resourceType".to_string(), json!(resource_type));
    if let Value::Object(fields) = body {
        document.extend(fields);
    }
    document.insert("_links".to_string(), json!({ "self": uri }));
    document
        .entry("lastUpdated")
        .or_insert_with(|| json!(Utc::now().to_rfc3339()));
    Value::Object(document)
}

fn count_by<I, K>(keys: I) -> BTreeMap<K, usize>
where
    I: IntoIterator<Item = K>,
    K: Ord,
{
    let mut counts = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

/// `n8n://workflows`
pub struct WorkflowsResource {
    client: WorkflowClient,
}

impl WorkflowsResource {
    pub const URI: &'static str = "n8n://workflows";

    fn render(workflows: &[Workflow]) -> Value {
        let active = workflows.iter().filter(|w| w.active).count();
        let listed: Vec<Value> = workflows
            .iter()
            .map(|w| {
                json!({
                    "id": w.id,
                    "name": w.name,
                    "active": w.active,
                    "updatedAt": w.updated_at,
                })
            })
            .collect();

        envelope(
            "workflows",
            Self::URI,
            json!({
                "count": workflows.len(),
                "summary": {
                    "active": active,
                    "inactive": workflows.len() - active,
                },
                "workflows": listed,
            }),
        )
    }
}

#[async_trait]
impl Resource for WorkflowsResource {
    fn definition(&self) -> ResourceDefinition {
        ResourceDefinition::json(
            Self::URI,
            "n8n Workflows",
            "Workflows of the n8n instance with their activation state",
        )
    }

    fn area(&self) -> &'static str {
        "workflows"
    }

    #[instrument(skip(self), fields(resource = "n8n://workflows"))]
    async fn read(&self) -> ApiResult<Value> {
        let workflows = self.client.list(WorkflowListParams::default()).await?;
        Ok(Self::render(&workflows))
    }
}

/// `n8n://tags`
pub struct TagsResource {
    client: TagClient,
}

impl TagsResource {
    pub const URI: &'static str = "n8n://tags";

    fn render(tags: &[Tag]) -> Value {
        let by_color = count_by(
            tags.iter()
                .map(|t| t.color.clone().unwrap_or_else(|| "no-color".to_string())),
        );

        let mut recent: Vec<&Tag> = tags.iter().collect();
        // ISO-8601 timestamps order lexically; tags without one sort last.
        recent.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        let recent: Vec<Value> = recent
            .into_iter()
            .take(RECENT_TAGS)
            .map(|t| json!({ "id": t.id, "name": t.name, "color": t.color }))
            .collect();

        envelope(
            "tags",
            Self::URI,
            json!({
                "count": tags.len(),
                "summary": { "byColor": by_color },
                "recentTags": recent,
            }),
        )
    }
}

#[async_trait]
impl Resource for TagsResource {
    fn definition(&self) -> ResourceDefinition {
        ResourceDefinition::json(Self::URI, "n8n Tags", "Tags available in the n8n instance")
    }

    fn area(&self) -> &'static str {
        "tags"
    }

    #[instrument(skip(self), fields(resource = "n8n://tags"))]
    async fn read(&self) -> ApiResult<Value> {
        let tags = self.client.list(TagListParams::default()).await?;
        Ok(Self::render(&tags))
    }
}

/// `n8n://variables`
///
/// Lists keys only. Values are never requested.
pub struct VariablesResource {
    client: VariableClient,
}

impl VariablesResource {
    pub const URI: &'static str = "n8n://variables";
}

#[async_trait]
impl Resource for VariablesResource {
    fn definition(&self) -> ResourceDefinition {
        ResourceDefinition::json(
            Self::URI,
            "n8n Variables",
            "Variable keys defined in the n8n instance",
        )
    }

    fn area(&self) -> &'static str {
        "variables"
    }

    #[instrument(skip(self), fields(resource = "n8n://variables"))]
    async fn read(&self) -> ApiResult<Value> {
        let params = VariableListParams {
            include_values: Some(false),
            ..Default::default()
        };
        let variables = self.client.list(params).await?;
        let keys: Vec<&str> = variables.iter().map(|v| v.key.as_str()).collect();

        Ok(envelope(
            "variables",
            Self::URI,
            json!({ "count": variables.len(), "keys": keys }),
        ))
    }
}

/// `n8n://projects`
pub struct ProjectsResource {
    client: ProjectClient,
}

impl ProjectsResource {
    pub const URI: &'static str = "n8n://projects";
}

#[async_trait]
impl Resource for ProjectsResource {
    fn definition(&self) -> ResourceDefinition {
        ResourceDefinition::json(
            Self::URI,
            "n8n Projects",
            "Projects available in the n8n instance",
        )
    }

    fn area(&self) -> &'static str {
        "projects"
    }

    #[instrument(skip(self), fields(resource = "n8n://projects"))]
    async fn read(&self) -> ApiResult<Value> {
        let projects = self.client.list(ProjectListParams::default()).await?;
        let listed: Vec<Value> = projects
            .iter()
            .map(|p| json!({ "id": p.id, "name": p.name }))
            .collect();

        Ok(envelope(
            "projects",
            Self::URI,
            json!({ "count": projects.len(), "projects": listed }),
        ))
    }
}

/// `n8n://users`
pub struct UsersResource {
    client: UserClient,
}

impl UsersResource {
    pub const URI: &'static str = "n8n://users";

    fn render(users: &[User]) -> Value {
        let by_role = count_by(
            users
                .iter()
                .map(|u| u.role.clone().unwrap_or_else(|| "unknown".to_string())),
        );
        let listed: Vec<Value> = users
            .iter()
            .map(|u| json!({ "id": u.id, "email": u.email, "role": u.role }))
            .collect();

        envelope(
            "users",
            Self::URI,
            json!({
                "count": users.len(),
                "summary": { "byRole": by_role },
                "users": listed,
            }),
        )
    }
}

#[async_trait]
impl Resource for UsersResource {
    fn definition(&self) -> ResourceDefinition {
        ResourceDefinition::json(
            Self::URI,
            "n8n Users",
            "Users of the n8n instance with their roles",
        )
    }

    fn area(&self) -> &'static str {
        "users"
    }

    #[instrument(skip(self), fields(resource = "n8n://users"))]
    async fn read(&self) -> ApiResult<Value> {
        let users = self.client.list().await?;
        Ok(Self::render(&users))
    }
}

/// `n8n://security-audit`
///
/// Generates a fresh audit on every read.
pub struct SecurityAuditResource {
    client: SecurityAuditClient,
}

impl SecurityAuditResource {
    pub const URI: &'static str = "n8n://security-audit";
}

#[async_trait]
impl Resource for SecurityAuditResource {
    fn definition(&self) -> ResourceDefinition {
        ResourceDefinition::json(
            Self::URI,
            "n8n Security Audit",
            "Security audit status and summary for the n8n instance",
        )
    }

    fn area(&self) -> &'static str {
        "security audit"
    }

    #[instrument(skip(self), fields(resource = "n8n://security-audit"))]
    async fn read(&self) -> ApiResult<Value> {
        let audit = self.client.generate(&[]).await?;
        let summary = &audit.summary;

        let issues: Vec<Value> = audit
            .ranked_issues()
            .into_iter()
            .take(AUDIT_ISSUES)
            .map(|(workflow, issue)| {
                json!({
                    "id": issue.id,
                    "workflowId": workflow.workflow_id,
                    "workflowName": workflow.workflow_name,
                    "title": issue.title,
                    "severity": issue.severity,
                    "nodeName": issue.node_name.as_deref().unwrap_or("Unknown"),
                })
            })
            .collect();

        let mut body = json!({
            "status": audit.status(),
            "summary": {
                "totalWorkflows": summary.total_workflows,
                "totalIssues": summary.issues_found,
                "criticalIssues": summary.critical_issues,
                "highIssues": summary.high_issues,
                "mediumIssues": summary.medium_issues,
                "lowIssues": summary.low_issues,
            },
            "issues": issues,
        });
        if !audit.audit_date.is_empty() {
            body["lastUpdated"] = json!(audit.audit_date);
        }

        Ok(envelope("securityAudit", Self::URI, body))
    }
}

/// Get all resources.
pub fn all_resources(clients: &N8nClients) -> Vec<Arc<dyn Resource>> {
    vec![
        Arc::new(WorkflowsResource {
            client: clients.workflows.clone(),
        }),
        Arc::new(TagsResource {
            client: clients.tags.clone(),
        }),
        Arc::new(VariablesResource {
            client: clients.variables.clone(),
        }),
        Arc::new(ProjectsResource {
            client: clients.projects.clone(),
        }),
        Arc::new(UsersResource {
            client: clients.users.clone(),
        }),
        Arc::new(SecurityAuditResource {
            client: clients.security_audit.clone(),
        }),
    ]
}
