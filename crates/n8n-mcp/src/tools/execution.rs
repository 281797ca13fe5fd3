//! Execution MCP tools
//!
//! Tools for inspecting and managing workflow executions, and for starting
//! new runs either through the API or through a workflow's webhook.

use super::parse_args;
use crate::clients::execution::{summarize_executions, ExecutionListParams, ExecutionStatus, SUMMARY_WINDOW};
use crate::clients::{ExecutionClient, N8nClients, WebhookClient, WorkflowClient};
use crate::format::{format_error, format_success};
use crate::server::{McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, instrument};

const CATEGORY: &str = "execution";

/// Tool to list executions.
///
/// Filters are applied to the fetched page locally; the optional summary is
/// computed over the unfiltered executions.
pub struct ListExecutionsTool {
    client: ExecutionClient,
}

#[async_trait]
impl Tool for ListExecutionsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "execution_list",
            "Retrieve a list of workflow executions from n8n, with optional filtering",
        )
        .with_category(CATEGORY)
        .with_schema(json!({
            "type": "object",
            "properties": {
                "workflowId": {
                    "type": "string",
                    "description": "Optional ID of workflow to filter executions by"
                },
                "status": {
                    "type": "string",
                    "enum": ["success", "error", "waiting", "running", "canceled"],
                    "description": "Optional status to filter by"
                },
                "limit": {
                    "type": "number",
                    "description": "Maximum number of executions to return (default: all matching)"
                },
                "includeSummary": {
                    "type": "boolean",
                    "description": "Include summary statistics about all executions (before filtering/limiting)",
                    "default": false
                }
            },
            "required": []
        }))
    }

    #[instrument(skip(self, args, context), fields(tool = "execution_list"))]
    async fn execute(&self, args: Value, context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: ListExecutionsParams = parse_args(args)?;

        let executions = match self.client.list(ExecutionListParams::default()).await {
            Ok(executions) => executions,
            Err(e) => {
                error!("Failed to list executions: {}", e);
                return Ok(format_error(e));
            }
        };

        let limit = result_limit(params.limit);
        let summaries: Vec<_> = executions
            .iter()
            .filter(|e| {
                params
                    .workflow_id
                    .as_deref()
                    .map_or(true, |id| e.workflow_id == id)
            })
            .filter(|e| params.status.map_or(true, |s| e.has_status(s)))
            .take(limit.unwrap_or(usize::MAX))
            .map(|e| e.summary(context.started_at))
            .collect();

        let count = summaries.len();
        let filters_applied = params.workflow_id.is_some() || params.status.is_some();
        let mut data = json!({
            "executions": summaries,
            "count": count,
            "filtersApplied": filters_applied,
            "totalAvailable": executions.len(),
        });
        if params.include_summary {
            data["summary"] = json!(summarize_executions(&executions, SUMMARY_WINDOW));
        }

        let message = format!(
            "Found {} execution(s){}",
            count,
            if filters_applied { " matching filters." } else { "." }
        );
        Ok(format_success(Some(&data), Some(&message)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListExecutionsParams {
    #[serde(default)]
    workflow_id: Option<String>,
    #[serde(default)]
    status: Option<ExecutionStatus>,
    #[serde(default)]
    limit: Option<f64>,
    #[serde(default)]
    include_summary: bool,
}

/// Number of executions to keep. Zero, negative or absent means all.
fn result_limit(limit: Option<f64>) -> Option<usize> {
    limit.filter(|l| *l > 0.0).map(|l| l.trunc() as usize)
}

/// Tool to read one execution in detail.
pub struct ReadExecutionTool {
    client: ExecutionClient,
}

#[async_trait]
impl Tool for ReadExecutionTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "execution_read",
            "Retrieve details of a specific execution, including per-node results",
        )
        .with_category(CATEGORY)
        .with_schema(json!({
            "type": "object",
            "properties": {
                "executionId": {
                    "type": "string",
                    "description": "ID of the execution to retrieve"
                }
            },
            "required": ["executionId"]
        }))
    }

    #[instrument(skip(self, args, context), fields(tool = "execution_read"))]
    async fn execute(&self, args: Value, context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: ExecutionIdParams = parse_args(args)?;

        match self.client.read(&params.execution_id).await {
            Ok(execution) => {
                let message = format!("Retrieved execution {}", params.execution_id);
                Ok(format_success(
                    Some(&execution.details(context.started_at)),
                    Some(&message),
                ))
            }
            Err(e) => {
                error!("Failed to read execution {}: {}", params.execution_id, e);
                Ok(format_error(e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecutionIdParams {
    execution_id: String,
}

/// Tool to delete an execution.
pub struct DeleteExecutionTool {
    client: ExecutionClient,
}

#[async_trait]
impl Tool for DeleteExecutionTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("execution_delete", "Delete an execution record")
            .with_category(CATEGORY)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "executionId": {
                        "type": "string",
                        "description": "ID of the execution to delete"
                    }
                },
                "required": ["executionId"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "execution_delete"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: ExecutionIdParams = parse_args(args)?;

        match self.client.delete(&params.execution_id).await {
            Ok(_) => {
                let message = format!("Execution {} deleted successfully", params.execution_id);
                Ok(format_success(
                    Some(&json!({ "id": params.execution_id, "deleted": true })),
                    Some(&message),
                ))
            }
            Err(e) => {
                error!("Failed to delete execution {}: {}", params.execution_id, e);
                Ok(format_error(e))
            }
        }
    }
}

/// Tool to stop a running execution.
pub struct StopExecutionTool {
    client: ExecutionClient,
}

#[async_trait]
impl Tool for StopExecutionTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("execution_stop", "Stop a running execution")
            .with_category(CATEGORY)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "executionId": {
                        "type": "string",
                        "description": "ID of the execution to stop"
                    }
                },
                "required": ["executionId"]
            }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "execution_stop"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: ExecutionIdParams = parse_args(args)?;

        match self.client.stop(&params.execution_id).await {
            Ok(_) => {
                let message = format!("Execution {} stopped successfully", params.execution_id);
                Ok(format_success(Some(&json!({ "success": true })), Some(&message)))
            }
            Err(e) => {
                error!("Failed to stop execution {}: {}", params.execution_id, e);
                Ok(format_error(e))
            }
        }
    }
}

/// Tool to start a workflow run through the API.
pub struct RunWorkflowTool {
    client: WorkflowClient,
}

#[async_trait]
impl Tool for RunWorkflowTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("execution_run", "Execute a workflow by ID")
            .with_category(CATEGORY)
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "workflowId": {
                        "type": "string",
                        "description": "ID of the workflow to execute"
                    },
                    "data": {
                        "type": "object",
                        "description": "Input data passed to the workflow"
                    }
                },
                "required": ["workflowId"]
            }))
    }

    #[instrument(skip(self, args, context), fields(tool = "execution_run"))]
    async fn execute(&self, args: Value, context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: RunWorkflowParams = parse_args(args)?;
        debug!("Executing workflow {}", params.workflow_id);

        match self
            .client
            .execute(&params.workflow_id, params.data.as_ref())
            .await
        {
            Ok(result) => {
                let record = started_execution(&params.workflow_id, context, result);
                let message = format!(
                    "Workflow execution started with ID: {}",
                    record["id"].as_str().unwrap_or("unknown")
                );
                Ok(format_success(Some(&record), Some(&message)))
            }
            Err(e) => {
                error!("Failed to execute workflow {}: {}", params.workflow_id, e);
                Ok(format_error(e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunWorkflowParams {
    workflow_id: String,
    #[serde(default)]
    data: Option<Value>,
}

/// Execution record for a run that was just started, overlaid with whatever
/// the server returned.
fn started_execution(workflow_id: &str, context: &ToolContext, result: Value) -> Value {
    let mut record = Map::new();
    record.insert("workflowId".into(), json!(workflow_id));
    record.insert("finished".into(), json!(false));
    record.insert("status".into(), json!("running"));
    record.insert("mode".into(), json!("manual"));
    record.insert("data".into(), json!({ "resultData": {} }));
    record.insert("startedAt".into(), json!(context.started_at.to_rfc3339()));
    record.insert("stoppedAt".into(), json!(""));

    let id = id_of(result.get("executionId")).or_else(|| id_of(result.get("id")));
    if let Value::Object(fields) = result {
        record.extend(fields);
    }
    record.insert("id".into(), json!(id));
    Value::Object(record)
}

fn id_of(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Tool to call a workflow's webhook.
pub struct RunWebhookTool {
    client: WebhookClient,
}

#[async_trait]
impl Tool for RunWebhookTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "execution_run_webhook",
            "Execute a workflow via its webhook with optional input data",
        )
        .with_category(CATEGORY)
        .with_schema(json!({
            "type": "object",
            "properties": {
                "workflowName": {
                    "type": "string",
                    "description": "Name of the workflow webhook (e.g. \"hello-world\")"
                },
                "data": {
                    "type": "object",
                    "description": "Input data to pass to the webhook"
                },
                "headers": {
                    "type": "object",
                    "description": "Additional headers to send with the request",
                    "additionalProperties": { "type": "string" }
                }
            },
            "required": ["workflowName"]
        }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "execution_run_webhook"))]
    async fn execute(&self, args: Value, _context: &ToolContext) -> McpServerResult<ToolResult> {
        let params: RunWebhookParams = parse_args(args)?;

        match self
            .client
            .run(
                &params.workflow_name,
                params.data.as_ref(),
                params.headers.as_ref(),
            )
            .await
        {
            Ok(response) => Ok(format_success(
                Some(&response),
                Some("Webhook executed successfully"),
            )),
            Err(e) => {
                error!("Webhook {} failed: {}", params.workflow_name, e);
                Ok(format_error(e))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunWebhookParams {
    workflow_name: String,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    headers: Option<HashMap<String, String>>,
}

/// Get all execution tools.
pub fn execution_tools(clients: &N8nClients) -> Vec<Arc<dyn Tool>> {
    let client = &clients.executions;
    vec![
        Arc::new(ListExecutionsTool {
            client: client.clone(),
        }),
        Arc::new(ReadExecutionTool {
            client: client.clone(),
        }),
        Arc::new(DeleteExecutionTool {
            client: client.clone(),
        }),
        Arc::new(StopExecutionTool {
            client: client.clone(),
        }),
        Arc::new(RunWorkflowTool {
            client: clients.workflows.clone(),
        }),
        Arc::new(RunWebhookTool {
            client: clients.webhooks.clone(),
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_limit_accepts_any_number() {
        let params: ListExecutionsParams = parse_args(json!({"limit": 5.0})).unwrap();
        assert_eq!(result_limit(params.limit), Some(5));

        let params: ListExecutionsParams = parse_args(json!({"limit": -1})).unwrap();
        assert_eq!(result_limit(params.limit), None);

        assert_eq!(result_limit(Some(0.0)), None);
        assert_eq!(result_limit(Some(3.0)), Some(3));
        assert_eq!(result_limit(None), None);
    }

    #[test]
    fn test_started_execution_prefers_execution_id() {
        let context = ToolContext::new();
        let record = started_execution("wf-1", &context, json!({"executionId": 42, "mode": "trigger"}));
        assert_eq!(record["id"], "42");
        assert_eq!(record["workflowId"], "wf-1");
        assert_eq!(record["mode"], "trigger");
        assert_eq!(record["status"], "running");
    }

    #[test]
    fn test_started_execution_without_id() {
        let context = ToolContext::new();
        let record = started_execution("wf-1", &context, Value::Null);
        assert!(record["id"].is_null());
        assert_eq!(record["finished"], false);
    }

    #[test]
    fn test_list_params_reject_unknown_status() {
        assert!(parse_args::<ListExecutionsParams>(json!({"status": "exploded"})).is_err());
        let params: ListExecutionsParams = parse_args(json!({"status": "error", "includeSummary": true})).unwrap();
        assert_eq!(params.status, Some(ExecutionStatus::Error));
        assert!(params.include_summary);
    }
}
