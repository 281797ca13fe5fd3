//! Security audit client.

use super::api::{N8nApiClient, QueryParams};
use crate::error::ApiResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

/// Endpoint generating a security audit.
pub const AUDIT_PATH: &str = "/security/audit/generate";

/// Issue severities, most severe first.
pub const SEVERITIES: [&str; 4] = ["critical", "high", "medium", "low"];

/// Result of a security audit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityAuditResult {
    #[serde(default)]
    pub audit_date: String,
    #[serde(default)]
    pub summary: AuditSummary,
    #[serde(default)]
    pub workflow_results: Vec<WorkflowAuditResult>,
}

/// Issue counts across the audited workflows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummary {
    #[serde(default)]
    pub total_workflows: u64,
    #[serde(default)]
    pub issues_found: u64,
    #[serde(default)]
    pub critical_issues: u64,
    #[serde(default)]
    pub high_issues: u64,
    #[serde(default)]
    pub medium_issues: u64,
    #[serde(default)]
    pub low_issues: u64,
}

/// Issues found in one workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowAuditResult {
    #[serde(default)]
    pub workflow_id: String,
    #[serde(default)]
    pub workflow_name: String,
    #[serde(default)]
    pub issues: Vec<SecurityIssue>,
}

/// A single audit finding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityIssue {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl SecurityAuditResult {
    /// Overall status: the most severe level with issues, or `secure`.
    pub fn status(&self) -> &'static str {
        let s = &self.summary;
        if s.critical_issues > 0 {
            "critical"
        } else if s.high_issues > 0 {
            "high"
        } else if s.medium_issues > 0 {
            "medium"
        } else if s.low_issues > 0 {
            "low"
        } else {
            "secure"
        }
    }

    /// Issues from every workflow, most severe first, tagged with their workflow.
    pub fn ranked_issues(&self) -> Vec<(&WorkflowAuditResult, &SecurityIssue)> {
        let mut issues: Vec<_> = self
            .workflow_results
            .iter()
            .flat_map(|w| w.issues.iter().map(move |i| (w, i)))
            .collect();
        issues.sort_by_key(|(_, i)| {
            SEVERITIES
                .iter()
                .position(|s| *s == i.severity)
                .unwrap_or(SEVERITIES.len())
        });
        issues
    }
}

/// Security audit API client.
#[derive(Debug, Clone)]
pub struct SecurityAuditClient {
    api: Arc<N8nApiClient>,
}

impl SecurityAuditClient {
    /// Create a new security audit client.
    pub fn new(api: Arc<N8nApiClient>) -> Self {
        Self { api }
    }

    /// Generate an audit, optionally restricted to some workflows.
    #[instrument(skip(self, workflow_ids), fields(workflows = workflow_ids.len()))]
    pub async fn generate(&self, workflow_ids: &[String]) -> ApiResult<SecurityAuditResult> {
        let query = if workflow_ids.is_empty() {
            QueryParams::new()
        } else {
            QueryParams::new().push("workflowIds", workflow_ids.join(","))
        };

        self.api
            .post_with_query(
                AUDIT_PATH,
                &query,
                &serde_json::json!({}),
                "Failed to generate security audit",
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn audit() -> SecurityAuditResult {
        serde_json::from_value(json!({
            "auditDate": "2024-05-01T00:00:00Z",
            "summary": {
                "totalWorkflows": 2,
                "issuesFound": 2,
                "criticalIssues": 0,
                "highIssues": 1,
                "mediumIssues": 0,
                "lowIssues": 1
            },
            "workflowResults": [
                {"workflowId": "w1", "workflowName": "One", "issues": [
                    {"id": "i1", "severity": "low", "title": "Unused credential", "description": "d"}
                ]},
                {"workflowId": "w2", "workflowName": "Two", "issues": [
                    {"id": "i2", "severity": "high", "title": "Open webhook", "description": "d"}
                ]}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_status() {
        assert_eq!(audit().status(), "high");
        assert_eq!(SecurityAuditResult::default().status(), "secure");
    }

    #[test]
    fn test_ranked_issues() {
        let audit = audit();
        let ranked = audit.ranked_issues();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].1.id, "i2");
        assert_eq!(ranked[0].0.workflow_name, "Two");
        assert_eq!(ranked[1].1.id, "i1");
    }
}
