//! Uniform tool result envelopes.
//!
//! Every tool answers with [`format_success`] or [`format_error`], so hosts
//! always see the same shape: a human-readable first text block and, on
//! success, an optional second block holding the data as pretty JSON.

use crate::types::ToolResult;
use serde::Serialize;
use std::fmt::Display;
use tracing::warn;

/// Message used when a success carries no message of its own.
pub const DEFAULT_SUCCESS_MESSAGE: &str = "Operation completed successfully";

/// Build a success result.
pub fn format_success<T>(data: Option<&T>, message: Option<&str>) -> ToolResult
where
    T: Serialize + ?Sized,
{
    let result = ToolResult::text(message.unwrap_or(DEFAULT_SUCCESS_MESSAGE));

    let Some(data) = data else {
        return result;
    };

    match serde_json::to_string_pretty(data) {
        Ok(json) => result.with_text(json),
        Err(e) => {
            warn!("Failed to serialize tool result data: {}", e);
            result
        }
    }
}

/// Build a success result that carries only a message.
pub fn format_message(message: &str) -> ToolResult {
    format_success::<()>(None, Some(message))
}

/// Build an error result with text `Error: <message>`.
pub fn format_error(error: impl Display) -> ToolResult {
    ToolResult::error(format!("Error: {}", error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, ApiErrorKind};
    use serde_json::json;

    #[test]
    fn test_format_success_with_data() {
        let data = json!({"id": "wf-1", "name": "Nightly sync", "active": true});
        let result = format_success(Some(&data), Some("Workflow created successfully"));

        assert!(!result.is_error);
        assert_eq!(result.content.len(), 2);
        assert_eq!(result.text_at(0), Some("Workflow created successfully"));

        let parsed: serde_json::Value = serde_json::from_str(result.text_at(1).unwrap()).unwrap();
        assert_eq!(parsed, data);
    }

    #[test]
    fn test_format_success_defaults() {
        let result = format_success::<()>(None, None);
        assert!(!result.is_error);
        assert_eq!(result.content.len(), 1);
        assert_eq!(result.text_at(0), Some(DEFAULT_SUCCESS_MESSAGE));
    }

    #[test]
    fn test_format_message() {
        let result = format_message("Done");
        assert_eq!(result.content.len(), 1);
        assert_eq!(result.text_at(0), Some("Done"));
    }

    #[test]
    fn test_format_error_from_api_error() {
        let err = ApiError::from_status("Tag not found", 404, None);
        assert_eq!(err.kind, ApiErrorKind::NotFound);

        let result = format_error(&err);
        assert!(result.is_error);
        assert_eq!(result.content.len(), 1);
        assert_eq!(result.text_at(0), Some("Error: Tag not found (Status: 404)"));
    }

    #[test]
    fn test_format_error_from_str() {
        let result = format_error("Workflow ID is required");
        assert!(result.is_error);
        assert_eq!(result.text_at(0), Some("Error: Workflow ID is required"));
    }
}
