//! Startup connectivity check against the n8n API.
//!
//! The binary runs [`HealthChecker::check`] once before serving, unless
//! `--skip-connectivity-check` is given. A failed check is reported but
//! the server still starts, so hosts can surface tool errors themselves.

use crate::clients::N8nApiClient;
use crate::error::ApiErrorKind;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// Connectivity status of the n8n API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Reachable and answering in time.
    Up,
    /// Reachable but slower than the threshold.
    Degraded,
    /// Unreachable or rejecting the key.
    Down,
}

/// Result of a connectivity check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthStatus,

    /// API base URL.
    pub url: String,

    /// Round-trip latency in milliseconds.
    pub latency_ms: u64,

    /// Timestamp of the check (RFC 3339).
    pub timestamp: String,

    /// Failure category when down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ApiErrorKind>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthReport {
    pub fn is_up(&self) -> bool {
        self.status != HealthStatus::Down
    }
}

/// Checks that the n8n API is reachable with the configured key.
pub struct HealthChecker {
    api: Arc<N8nApiClient>,

    /// Latency above which the API is reported as degraded.
    degraded_threshold: Duration,
}

impl HealthChecker {
    /// Create a checker with a one second degraded threshold.
    pub fn new(api: Arc<N8nApiClient>) -> Self {
        Self {
            api,
            degraded_threshold: Duration::from_millis(1000),
        }
    }

    /// Override the degraded threshold.
    pub fn with_degraded_threshold(mut self, threshold: Duration) -> Self {
        self.degraded_threshold = threshold;
        self
    }

    /// Run one connectivity check.
    #[instrument(skip(self))]
    pub async fn check(&self) -> HealthReport {
        let start = Instant::now();
        let outcome = self.api.check_connectivity().await;
        let latency = start.elapsed();
        let url = self.api.config().api_url.clone();

        let (status, error_kind, error) = match outcome {
            Ok(()) if latency > self.degraded_threshold => {
                warn!(
                    latency_ms = latency.as_millis() as u64,
                    "n8n API response time exceeds threshold"
                );
                (HealthStatus::Degraded, None, None)
            }
            Ok(()) => (HealthStatus::Up, None, None),
            Err(e) => {
                warn!(kind = %e.kind, "n8n API connectivity check failed: {}", e.message);
                (HealthStatus::Down, Some(e.kind), Some(e.message))
            }
        };

        info!(status = ?status, latency_ms = latency.as_millis() as u64, "Connectivity check complete");

        HealthReport {
            status,
            url,
            latency_ms: latency.as_millis() as u64,
            timestamp: chrono::Utc::now().to_rfc3339(),
            error_kind,
            error,
        }
    }
}
