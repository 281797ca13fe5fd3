//! Core HTTP client for the n8n public API.
//!
//! Holds the shared connection pool, base URL, API key header and timeout.
//! Resource clients go through the typed helpers here, so every failure is
//! classified in one place.

use super::config::{ConfigError, N8nConfig};
use crate::error::{classify, ApiResult, TransportFailure, DEFAULT_ERROR_MESSAGE};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

/// Header carrying the n8n API key.
pub const API_KEY_HEADER: &str = "X-N8N-API-KEY";

/// Query string parameters, skipping unset values.
#[derive(Debug, Clone, Default)]
pub struct QueryParams(Vec<(&'static str, String)>);

impl QueryParams {
    /// Create an empty parameter list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter.
    pub fn push(mut self, key: &'static str, value: impl ToString) -> Self {
        self.0.push((key, value.to_string()));
        self
    }

    /// Add a parameter when a value is present.
    pub fn push_opt<T: ToString>(self, key: &'static str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.push(key, v),
            None => self,
        }
    }

    /// Whether no parameters were added.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The collected key/value pairs.
    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.0
    }
}

/// Shared n8n API client.
///
/// Cheap to share behind an `Arc`; the inner reqwest client pools
/// connections.
#[derive(Debug, Clone)]
pub struct N8nApiClient {
    /// HTTP client carrying the API key header.
    client: Client,

    /// HTTP client without API headers, for webhook calls.
    plain: Client,

    /// Connection settings.
    config: N8nConfig,
}

impl N8nApiClient {
    /// Create a new client from validated configuration.
    pub fn new(config: N8nConfig) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.api_key).map_err(|e| ConfigError::InvalidValue {
            key: "N8N_API_KEY".to_string(),
            message: e.to_string(),
        })?;
        headers.insert(API_KEY_HEADER, key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        let plain = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            plain,
            config,
        })
    }

    /// Connection settings.
    pub fn config(&self) -> &N8nConfig {
        &self.config
    }

    /// HTTP client for calls outside the API, without the API key header.
    pub fn http(&self) -> &Client {
        &self.plain
    }

    /// Verify that the API is reachable with the configured key.
    #[instrument(skip(self), fields(api_url = %self.config.api_url))]
    pub async fn check_connectivity(&self) -> ApiResult<()> {
        let _: Value = self
            .get("/workflows", "Failed to connect to n8n API")
            .await?;
        debug!("n8n API reachable");
        Ok(())
    }

    /// GET a path.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, context: &str) -> ApiResult<T> {
        self.send(self.request(Method::GET, path), context).await
    }

    /// GET a path with query parameters.
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &QueryParams,
        context: &str,
    ) -> ApiResult<T> {
        let request = self.request(Method::GET, path).query(query.pairs());
        self.send(request, context).await
    }

    /// POST a JSON body.
    pub async fn post<B, T>(&self, path: &str, body: &B, context: &str) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.request(Method::POST, path).json(body), context)
            .await
    }

    /// POST a JSON body with query parameters.
    pub async fn post_with_query<B, T>(
        &self,
        path: &str,
        query: &QueryParams,
        body: &B,
        context: &str,
    ) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .request(Method::POST, path)
            .query(query.pairs())
            .json(body);
        self.send(request, context).await
    }

    /// POST without a body.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str, context: &str) -> ApiResult<T> {
        self.send(self.request(Method::POST, path), context).await
    }

    /// PUT a JSON body.
    pub async fn put<B, T>(&self, path: &str, body: &B, context: &str) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.request(Method::PUT, path).json(body), context)
            .await
    }

    /// PATCH a JSON body.
    pub async fn patch<B, T>(&self, path: &str, body: &B, context: &str) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.request(Method::PATCH, path).json(body), context)
            .await
    }

    /// DELETE a path.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str, context: &str) -> ApiResult<T> {
        self.send(self.request(Method::DELETE, path), context).await
    }

    /// DELETE a path with query parameters.
    pub async fn delete_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &QueryParams,
        context: &str,
    ) -> ApiResult<T> {
        let request = self.request(Method::DELETE, path).query(query.pairs());
        self.send(request, context).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.config.url(path);
        if self.config.debug {
            debug!("n8n API request: {} {}", method, url);
        }
        self.client.request(method, url)
    }

    /// Send a request and decode its JSON body.
    ///
    /// `context` is the message used when the failure carries none. An empty
    /// success body decodes as JSON `null`.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, context: &str) -> ApiResult<T> {
        let context = if context.is_empty() {
            DEFAULT_ERROR_MESSAGE
        } else {
            context
        };

        let response = request
            .send()
            .await
            .map_err(|e| classify(TransportFailure::from(&e), context))?;

        let status = response.status();
        if self.config.debug {
            debug!("n8n API response: {} {}", status.as_u16(), response.url());
        }

        let text = response
            .text()
            .await
            .map_err(|e| classify(TransportFailure::from(&e), context))?;

        if !status.is_success() {
            warn!("n8n API error ({}): {}", status.as_u16(), context);
            let body = parse_body(text);
            return Err(classify(
                TransportFailure::Response {
                    status: status.as_u16(),
                    body,
                },
                context,
            ));
        }

        let payload: &str = if text.trim().is_empty() { "null" } else { &text };
        serde_json::from_str(payload).map_err(|e| {
            classify(
                TransportFailure::Other {
                    message: Some(format!("Invalid response from n8n API: {}", e)),
                },
                context,
            )
        })
    }
}

/// Parse an error body as JSON, keeping non-JSON bodies as a string.
fn parse_body(text: String) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}

/// Unwrap the `{ "data": [...] }` envelope of n8n list endpoints.
///
/// A missing or null `data` field yields an empty list.
pub(crate) fn unwrap_list<T: DeserializeOwned>(envelope: Value, context: &str) -> ApiResult<Vec<T>> {
    let data = match envelope {
        Value::Object(mut map) => map.remove("data").unwrap_or(Value::Null),
        Value::Array(items) => Value::Array(items),
        _ => Value::Null,
    };
    if data.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(data).map_err(|e| {
        classify(
            TransportFailure::Other {
                message: Some(format!("Invalid response from n8n API: {}", e)),
            },
            context,
        )
    })
}

/// Unwrap an optional `{ "data": {...} }` envelope around a single record.
pub(crate) fn unwrap_record<T: DeserializeOwned>(body: Value, context: &str) -> ApiResult<T> {
    let inner = match body {
        Value::Object(mut map) if map.get("data").map(Value::is_object).unwrap_or(false) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };
    serde_json::from_value(inner).map_err(|e| {
        classify(
            TransportFailure::Other {
                message: Some(format!("Invalid response from n8n API: {}", e)),
            },
            context,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_params_skip_none() {
        let query = QueryParams::new()
            .push_opt("limit", Some(10))
            .push_opt::<String>("search", None)
            .push("includeSystem", true);
        assert_eq!(
            query.pairs(),
            &[("limit", "10".to_string()), ("includeSystem", "true".to_string())]
        );
        assert!(QueryParams::new().is_empty());
    }

    #[test]
    fn test_client_creation() {
        let config = N8nConfig::new("http://localhost:5678/api/v1", "test-key");
        let client = N8nApiClient::new(config).unwrap();
        assert_eq!(client.config().api_key, "test-key");
    }

    #[test]
    fn test_client_rejects_invalid_key() {
        let config = N8nConfig::new("http://localhost:5678/api/v1", "bad\nkey");
        assert!(matches!(
            N8nApiClient::new(config),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(String::new()), None);
        assert_eq!(parse_body("{\"message\":\"x\"}".into()), Some(json!({"message": "x"})));
        assert_eq!(parse_body("Bad Gateway".into()), Some(json!("Bad Gateway")));
    }

    #[test]
    fn test_unwrap_list() {
        let items: Vec<Value> = unwrap_list(json!({"data": [{"id": "1"}], "nextCursor": null}), "x").unwrap();
        assert_eq!(items.len(), 1);

        let items: Vec<Value> = unwrap_list(json!({"nextCursor": null}), "x").unwrap();
        assert!(items.is_empty());

        let items: Vec<Value> = unwrap_list(json!([{"id": "1"}, {"id": "2"}]), "x").unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_unwrap_record() {
        let user: Value = unwrap_record(json!({"data": {"id": "u1"}}), "x").unwrap();
        assert_eq!(user["id"], "u1");

        let user: Value = unwrap_record(json!({"id": "u2"}), "x").unwrap();
        assert_eq!(user["id"], "u2");
    }
}
