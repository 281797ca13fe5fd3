//! Error classification for n8n API calls.
//!
//! Every failed HTTP call to n8n is turned into an [`ApiError`] here, with a
//! [`ApiErrorKind`] that depends only on the transport outcome. Clients may
//! rewrite the message of an error for specific endpoints, but the kind and
//! status code stay as classified.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Default message used when a failure carries no usable message.
pub const DEFAULT_ERROR_MESSAGE: &str = "n8n API request failed";

/// Message used when a request was sent but no response came back.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error connecting to n8n API";

/// Category of an API failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// The server rejected the credentials (401 or 403).
    Authentication,
    /// The requested entity does not exist (404).
    NotFound,
    /// Any other client error (4xx).
    InvalidRequest,
    /// Server errors and local failures.
    Internal,
    /// The request was sent but no response was received.
    Network,
}

impl ApiErrorKind {
    /// Classify an HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Authentication,
            404 => Self::NotFound,
            400..=499 => Self::InvalidRequest,
            _ => Self::Internal,
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Authentication => "authentication",
            Self::NotFound => "not_found",
            Self::InvalidRequest => "invalid_request",
            Self::Internal => "internal",
            Self::Network => "network",
        };
        f.write_str(name)
    }
}

/// A failed call to the n8n API.
///
/// Rendered as `<message> (Status: <code>)` followed by a `Details:` block
/// when the server returned a body.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", self.render())]
pub struct ApiError {
    /// Failure category.
    pub kind: ApiErrorKind,

    /// Human-readable message.
    pub message: String,

    /// HTTP status code, when the server responded.
    pub status_code: Option<u16>,

    /// Raw error payload returned by the server, or the transport message.
    pub details: Option<Value>,
}

/// Result type for n8n API operations.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Create an error of the given kind with no status or details.
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
            details: None,
        }
    }

    /// Create an error from an HTTP status, deriving the kind from it.
    pub fn from_status(message: impl Into<String>, status: u16, details: Option<Value>) -> Self {
        Self {
            kind: ApiErrorKind::from_status(status),
            message: message.into(),
            status_code: Some(status),
            details,
        }
    }

    /// Shorthand for an [`ApiErrorKind::Internal`] error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Internal, message)
    }

    /// Shorthand for an [`ApiErrorKind::InvalidRequest`] error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::InvalidRequest, message)
    }

    /// Shorthand for an [`ApiErrorKind::NotFound`] error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::NotFound, message)
    }

    /// Attach the raw server payload.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Replace the message, keeping kind and status code.
    ///
    /// The server payload is dropped since the new message already
    /// explains the failure.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self.details = None;
        self
    }

    /// Whether the server responded with the given status.
    pub fn has_status(&self, status: u16) -> bool {
        self.status_code == Some(status)
    }

    /// The `message` field of the server's JSON error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        self.details
            .as_ref()
            .and_then(|d| d.get("message"))
            .and_then(Value::as_str)
    }

    /// Whether the server's message mentions the given text.
    pub fn server_message_contains(&self, needle: &str) -> bool {
        self.server_message()
            .map(|m| m.contains(needle))
            .unwrap_or(false)
    }

    fn render(&self) -> String {
        let mut rendered = self.message.clone();
        if let Some(status) = self.status_code {
            rendered.push_str(&format!(" (Status: {})", status));
        }
        if let Some(details) = self.rendered_details() {
            rendered.push_str(&format!("\nDetails: {}", details));
        }
        rendered
    }

    fn rendered_details(&self) -> Option<String> {
        match self.details.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => serde_json::to_string_pretty(other).ok(),
        }
    }
}

/// Outcome of a failed transport call, before classification.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportFailure {
    /// The server responded with a non-success status.
    Response {
        /// HTTP status code.
        status: u16,
        /// Response body, parsed as JSON when possible.
        body: Option<Value>,
    },

    /// The request was sent but no response came back.
    NoResponse {
        /// Transport-level description (connect refused, timeout, ...).
        message: String,
    },

    /// Anything else: request building, body decoding, local bugs.
    Other {
        /// The failure's own message, if it has one.
        message: Option<String>,
    },
}

impl From<&reqwest::Error> for TransportFailure {
    fn from(err: &reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::Response {
                status: status.as_u16(),
                body: None,
            };
        }
        if err.is_connect() || err.is_timeout() || err.is_request() {
            return Self::NoResponse {
                message: err.to_string(),
            };
        }
        Self::Other {
            message: Some(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for TransportFailure {
    fn from(err: reqwest::Error) -> Self {
        Self::from(&err)
    }
}

/// Classify a transport failure into an [`ApiError`].
///
/// `default_message` is used when the failure carries no message of its own.
pub fn classify(failure: TransportFailure, default_message: &str) -> ApiError {
    match failure {
        TransportFailure::Response { status, body } => {
            let message = body
                .as_ref()
                .and_then(|b| b.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| default_message.to_string());
            ApiError::from_status(message, status, body)
        }
        TransportFailure::NoResponse { message } => {
            ApiError::new(ApiErrorKind::Network, NETWORK_ERROR_MESSAGE)
                .with_details(Value::String(message))
        }
        TransportFailure::Other { message } => ApiError::internal(
            message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| default_message.to_string()),
        ),
    }
}
