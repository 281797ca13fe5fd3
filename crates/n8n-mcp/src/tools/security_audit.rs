//! Security audit MCP tools

use super::parse_args;
use crate::clients::{N8nClients, SecurityAuditClient};
use crate::format::{format_error, format_success};
use crate::server::{McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Tool to generate a security audit.
pub struct GenerateSecurityAuditTool {
    client: SecurityAuditClient,
}

#[async_trait]
impl Tool for GenerateSecurityAuditTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "security_audit_generate",
            "Generate a security audit of workflows, credentials and nodes",
        )
        .with_category("security_audit")
        .with_schema(json!({
            "type": "object",
            "properties": {
                "workflowIds": {
                    "type": "array",
                    "description": "Restrict the audit to these workflows; all workflows when omitted",
                    "items": { "type": "string" }
                }
            },
            "required": []
        }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "security_audit_generate"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: GenerateAuditParams = parse_args(args)?;

        match self.client.generate(&params.workflow_ids).await {
            Ok(audit) => {
                info!(
                    status = audit.status(),
                    issues = audit.summary.issues_found,
                    "Security audit generated"
                );
                let message = format!(
                    "Successfully generated security audit for {} workflows",
                    audit.summary.total_workflows
                );
                Ok(format_success(Some(&audit), Some(&message)))
            }
            Err(e) => {
                error!("Failed to generate security audit: {}", e);
                Ok(format_error(e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateAuditParams {
    #[serde(default)]
    workflow_ids: Vec<String>,
}

/// Get all security audit tools.
pub fn security_audit_tools(clients: &N8nClients) -> Vec<Arc<dyn Tool>> {
    vec![Arc::new(GenerateSecurityAuditTool {
        client: clients.security_audit.clone(),
    })]
}
