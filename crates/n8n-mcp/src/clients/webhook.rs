//! Webhook invocation.
//!
//! Webhooks live outside the API prefix: `/api/v1` is stripped from the
//! configured URL and the request goes to `<base>/webhook/<name>`, with basic
//! auth when webhook credentials are configured.

use super::api::N8nApiClient;
use crate::error::{classify, ApiError, ApiResult, TransportFailure};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Response of a webhook call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    /// HTTP status code.
    pub status: u16,

    /// Canonical reason phrase for the status.
    pub status_text: String,

    /// Response body, parsed as JSON when possible.
    pub data: Value,
}

/// Webhook client.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    api: Arc<N8nApiClient>,
}

impl WebhookClient {
    /// Create a new webhook client.
    pub fn new(api: Arc<N8nApiClient>) -> Self {
        Self { api }
    }

    /// Full URL of the webhook registered under `workflow_name`.
    ///
    /// Slashes in the name are removed.
    pub fn webhook_url(&self, workflow_name: &str) -> String {
        format!(
            "{}/webhook/{}",
            self.api.config().webhook_base_url(),
            workflow_name.replace('/', "")
        )
    }

    /// POST `data` (or `{}`) to a workflow's webhook.
    #[instrument(skip(self, data, headers))]
    pub async fn run(
        &self,
        workflow_name: &str,
        data: Option<&Value>,
        headers: Option<&HashMap<String, String>>,
    ) -> ApiResult<WebhookResponse> {
        let config = self.api.config();
        let url = self.webhook_url(workflow_name);
        debug!("Calling webhook {}", url);

        let empty = Value::Object(Default::default());
        let mut request = self
            .api
            .http()
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(data.unwrap_or(&empty));

        if let Some(headers) = headers {
            for (name, value) in headers {
                request = request.header(name.as_str(), value.as_str());
            }
        }

        if let (Some(user), Some(password)) = (&config.webhook_username, &config.webhook_password) {
            request = request.basic_auth(user, Some(password));
        }

        let response = request.send().await.map_err(|e| {
            let failure = TransportFailure::from(&e);
            classify(failure, "Webhook execution failed")
                .with_message(format!("Webhook execution failed: {}", e))
        })?;

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or("").to_string();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::internal(format!("Webhook execution failed: {}", e)))?;
        let data = parse_webhook_body(text);

        if !status.is_success() {
            warn!("Webhook {} returned {}", workflow_name, status.as_u16());
            return Err(ApiError::from_status(
                failure_message(status.as_u16(), &status_text, &data),
                status.as_u16(),
                None,
            ));
        }

        Ok(WebhookResponse {
            status: status.as_u16(),
            status_text,
            data,
        })
    }
}

fn parse_webhook_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

fn failure_message(status: u16, status_text: &str, body: &Value) -> String {
    let mut message = format!(
        "Webhook execution failed with status {}: {}",
        status, status_text
    );
    if !body.is_null() {
        let rendered = match body {
            Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_default(),
        };
        message.push_str("\n\n");
        message.push_str(&rendered);
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::N8nConfig;
    use serde_json::json;

    fn client(url: &str) -> WebhookClient {
        let api = N8nApiClient::new(N8nConfig::new(url, "key")).unwrap();
        WebhookClient::new(Arc::new(api))
    }

    #[test]
    fn test_webhook_url_strips_api_prefix() {
        let client = client("https://n8n.example.com/api/v1");
        assert_eq!(
            client.webhook_url("orders/new"),
            "https://n8n.example.com/webhook/ordersnew"
        );
    }

    #[test]
    fn test_parse_webhook_body() {
        assert_eq!(parse_webhook_body(String::new()), Value::Null);
        assert_eq!(parse_webhook_body("{\"ok\":true}".into()), json!({"ok": true}));
        assert_eq!(parse_webhook_body("accepted".into()), json!("accepted"));
    }

    #[test]
    fn test_failure_message_includes_body() {
        let message = failure_message(404, "Not Found", &json!({"message": "no webhook"}));
        assert!(message.starts_with("Webhook execution failed with status 404: Not Found\n\n"));
        assert!(message.contains("\"message\": \"no webhook\""));

        assert_eq!(
            failure_message(500, "Internal Server Error", &Value::Null),
            "Webhook execution failed with status 500: Internal Server Error"
        );
    }
}
