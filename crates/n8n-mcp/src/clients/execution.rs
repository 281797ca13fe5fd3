//! Execution client.
//!
//! Listing, inspection, deletion and stopping of workflow executions, plus
//! the condensed views returned to MCP hosts.

use super::api::{unwrap_list, N8nApiClient, QueryParams};
use super::id_string;
use crate::error::ApiResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;

/// Number of output items included in a node's data preview.
const PREVIEW_ITEMS: usize = 3;

/// Default number of executions covered by [`summarize_executions`].
pub const SUMMARY_WINDOW: usize = 10;

/// Execution states reported by n8n.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Success,
    Error,
    Waiting,
    Running,
    Canceled,
}

impl ExecutionStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Waiting => "waiting",
            Self::Running => "running",
            Self::Canceled => "canceled",
        }
    }
}

/// A workflow execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    /// Execution ID.
    #[serde(default, deserialize_with = "id_string")]
    pub id: String,

    /// ID of the executed workflow.
    #[serde(default, deserialize_with = "id_string")]
    pub workflow_id: String,

    /// Whether the execution has finished.
    #[serde(default)]
    pub finished: bool,

    /// Trigger mode (manual, trigger, webhook, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// Status (success, error, waiting, running, canceled).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Start timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,

    /// Stop timestamp, absent while running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<String>,

    /// Run data, only present when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Filters for `GET /executions`.
#[derive(Debug, Clone, Default)]
pub struct ExecutionListParams {
    /// Workflow ID filter.
    pub workflow_id: Option<String>,

    /// Status filter.
    pub status: Option<String>,

    /// Page size.
    pub limit: Option<u32>,

    /// Page offset.
    pub offset: Option<u32>,
}

/// Execution API client.
#[derive(Debug, Clone)]
pub struct ExecutionClient {
    api: Arc<N8nApiClient>,
}

impl ExecutionClient {
    /// Create a new execution client.
    pub fn new(api: Arc<N8nApiClient>) -> Self {
        Self { api }
    }

    /// List executions.
    #[instrument(skip(self))]
    pub async fn list(&self, params: ExecutionListParams) -> ApiResult<Vec<Execution>> {
        let query = QueryParams::new()
            .push_opt("workflowId", params.workflow_id)
            .push_opt("status", params.status)
            .push_opt("limit", params.limit)
            .push_opt("offset", params.offset);

        let context = "Failed to list executions";
        let body: Value = self.api.get_with_query("/executions", &query, context).await?;
        unwrap_list(body, context)
    }

    /// Read an execution.
    #[instrument(skip(self), fields(execution_id = %id))]
    pub async fn read(&self, id: &str) -> ApiResult<Execution> {
        self.api
            .get(
                &format!("/executions/{}", id),
                &format!("Failed to read execution {}", id),
            )
            .await
    }

    /// Delete an execution.
    #[instrument(skip(self), fields(execution_id = %id))]
    pub async fn delete(&self, id: &str) -> ApiResult<Value> {
        self.api
            .delete(
                &format!("/executions/{}", id),
                &format!("Failed to delete execution {}", id),
            )
            .await
    }

    /// Stop a running execution.
    #[instrument(skip(self), fields(execution_id = %id))]
    pub async fn stop(&self, id: &str) -> ApiResult<Value> {
        self.api
            .post_empty(
                &format!("/executions/{}/stop", id),
                &format!("Failed to stop execution {}", id),
            )
            .await
    }
}

/// Condensed view of an execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSummary {
    pub id: String,
    pub workflow_id: String,
    /// Status prefixed with its indicator, e.g. `✅ success`.
    pub status: String,
    pub started_at: Option<String>,
    /// Stop timestamp or `In progress`.
    pub stopped_at: String,
    /// Whole seconds between start and stop (or now), e.g. `12s`.
    pub duration: String,
    pub finished: bool,
}

/// Last run of a single node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeResult {
    pub status: String,
    pub items: usize,
    pub data_preview: Vec<Value>,
}

/// Error recorded on a failed execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionFailure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Detailed view of an execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionDetails {
    #[serde(flatten)]
    pub summary: ExecutionSummary,
    pub mode: Option<String>,
    pub node_results: BTreeMap<String, NodeResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ExecutionFailure>,
}

/// Count of executions with one status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: String,
    pub count: usize,
    pub percentage: u32,
}

/// Aggregate statistics over a window of executions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStats {
    pub total: usize,
    pub by_status: Vec<StatusCount>,
    pub success_rate: String,
    pub displayed: usize,
    pub total_available: usize,
}

/// Indicator shown in front of an execution status.
pub fn status_indicator(status: &str) -> &'static str {
    match status {
        "success" => "✅",
        "error" => "❌",
        "waiting" => "⏳",
        _ => "⏱️",
    }
}

fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn percentage(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u32
}

impl Execution {
    /// Status, or `unknown` when the server omitted it.
    pub fn status_or_unknown(&self) -> &str {
        self.status.as_deref().unwrap_or("unknown")
    }

    /// Whether the execution has the given status.
    pub fn has_status(&self, status: ExecutionStatus) -> bool {
        self.status.as_deref() == Some(status.as_str())
    }

    /// Condensed view; running executions are measured up to `now`.
    pub fn summary(&self, now: DateTime<Utc>) -> ExecutionSummary {
        let stopped = self.stopped_at.as_deref().filter(|s| !s.is_empty());
        let duration = match parse_timestamp(self.started_at.as_deref()) {
            Some(start) => {
                let end = parse_timestamp(stopped).unwrap_or(now);
                let secs = (end - start).num_milliseconds() as f64 / 1000.0;
                format!("{}s", secs.round() as i64)
            }
            None => "unknown".to_string(),
        };

        let status = self.status_or_unknown();
        ExecutionSummary {
            id: self.id.clone(),
            workflow_id: self.workflow_id.clone(),
            status: format!("{} {}", status_indicator(status), status),
            started_at: self.started_at.clone(),
            stopped_at: stopped.unwrap_or("In progress").to_string(),
            duration,
            finished: self.finished,
        }
    }

    /// Detailed view with per-node results and error information.
    pub fn details(&self, now: DateTime<Utc>) -> ExecutionDetails {
        let result_data = self.data.as_ref().and_then(|d| d.get("resultData"));

        let mut node_results = BTreeMap::new();
        if let Some(Value::Object(run_data)) = result_data.and_then(|r| r.get("runData")) {
            for (node, runs) in run_data {
                node_results.insert(node.clone(), node_result(runs));
            }
        }

        let error = result_data
            .and_then(|r| r.get("error"))
            .filter(|e| !e.is_null())
            .map(|e| ExecutionFailure {
                message: e.get("message").and_then(Value::as_str).map(str::to_string),
                stack: e.get("stack").and_then(Value::as_str).map(str::to_string),
            });

        ExecutionDetails {
            summary: self.summary(now),
            mode: self.mode.clone(),
            node_results,
            error,
        }
    }
}

/// Reduce a node's run history to its last run.
fn node_result(runs: &Value) -> NodeResult {
    let last = runs.as_array().and_then(|r| r.last());
    let status = last
        .and_then(|l| l.get("executionStatus").or_else(|| l.get("status")))
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();

    let items = last
        .and_then(|l| l.get("data"))
        .and_then(|d| d.get("main"))
        .and_then(Value::as_array)
        .and_then(|main| main.first())
        .and_then(Value::as_array);

    match items {
        Some(items) => NodeResult {
            status,
            items: items.len(),
            data_preview: items.iter().take(PREVIEW_ITEMS).cloned().collect(),
        },
        None => NodeResult {
            status,
            items: 0,
            data_preview: Vec::new(),
        },
    }
}

/// Statistics over the first `window` executions.
pub fn summarize_executions(executions: &[Execution], window: usize) -> ExecutionStats {
    let limited = &executions[..executions.len().min(window)];
    let total = limited.len();

    // Preserve first-seen order of statuses.
    let mut counts: Vec<(String, usize)> = Vec::new();
    for execution in limited {
        let status = execution.status_or_unknown();
        match counts.iter_mut().find(|(s, _)| s == status) {
            Some((_, count)) => *count += 1,
            None => counts.push((status.to_string(), 1)),
        }
    }

    let success = counts
        .iter()
        .find(|(s, _)| s == "success")
        .map(|(_, c)| *c)
        .unwrap_or(0);

    ExecutionStats {
        total,
        by_status: counts
            .into_iter()
            .map(|(status, count)| StatusCount {
                status: format!("{} {}", status_indicator(&status), status),
                count,
                percentage: percentage(count, total),
            })
            .collect(),
        success_rate: format!("{}%", percentage(success, total)),
        displayed: total,
        total_available: executions.len(),
    }
}
