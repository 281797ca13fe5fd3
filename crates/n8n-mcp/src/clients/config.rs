//! Configuration for the n8n API connection.
//!
//! Configuration is loaded once from environment variables and handed to
//! [`N8nApiClient::new`](super::N8nApiClient::new), which every resource
//! client then shares.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required environment variable.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Connection settings for an n8n instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct N8nConfig {
    /// Base URL of the public API, e.g. `https://n8n.example.com/api/v1`.
    pub api_url: String,

    /// API key sent in the `X-N8N-API-KEY` header.
    pub api_key: String,

    /// Basic auth username for webhook calls.
    pub webhook_username: Option<String>,

    /// Basic auth password for webhook calls.
    pub webhook_password: Option<String>,

    /// Verbose request logging.
    pub debug: bool,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl N8nConfig {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

    /// Create a configuration with defaults for everything but URL and key.
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            webhook_username: None,
            webhook_password: None,
            debug: false,
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `N8N_API_URL`: API base URL (required)
    /// - `N8N_API_KEY`: API key (required)
    /// - `N8N_WEBHOOK_USERNAME`: webhook basic auth username
    /// - `N8N_WEBHOOK_PASSWORD`: webhook basic auth password
    /// - `N8N_DEBUG` or `DEBUG`: verbose logging (default: false)
    /// - `N8N_TIMEOUT_SECS`: request timeout in seconds (default: 10)
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = required_var("N8N_API_URL")?;
        let api_key = required_var("N8N_API_KEY")?;

        let timeout_secs = match std::env::var("N8N_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "N8N_TIMEOUT_SECS".to_string(),
                message: format!("expected a number of seconds, got '{}'", raw),
            })?,
            Err(_) => Self::DEFAULT_TIMEOUT_SECS,
        };

        let config = Self {
            api_url,
            api_key,
            webhook_username: optional_var("N8N_WEBHOOK_USERNAME"),
            webhook_password: optional_var("N8N_WEBHOOK_PASSWORD"),
            debug: optional_var("N8N_DEBUG")
                .or_else(|| optional_var("DEBUG"))
                .map(|s| is_truthy(&s))
                .unwrap_or(false),
            timeout_secs,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can be used to reach n8n.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar("N8N_API_URL".to_string()));
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar("N8N_API_KEY".to_string()));
        }

        let url = reqwest::Url::parse(&self.api_url).map_err(|e| ConfigError::InvalidValue {
            key: "N8N_API_URL".to_string(),
            message: e.to_string(),
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidValue {
                key: "N8N_API_URL".to_string(),
                message: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "N8N_TIMEOUT_SECS".to_string(),
                message: "timeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Get the request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build a full API URL by appending a path to the base URL.
    pub fn url(&self, path: &str) -> String {
        let base = self.api_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// Base URL for webhooks: the API URL without its `/api/v1` suffix.
    pub fn webhook_base_url(&self) -> String {
        let base = self.api_url.trim_end_matches('/');
        base.strip_suffix("/api/v1").unwrap_or(base).to_string()
    }

    /// Check if webhook basic auth credentials are configured.
    pub fn has_webhook_auth(&self) -> bool {
        self.webhook_username.is_some() && self.webhook_password.is_some()
    }
}

fn required_var(key: &str) -> Result<String, ConfigError> {
    optional_var(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

fn optional_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults() {
        let config = N8nConfig::new("http://localhost:5678/api/v1", "key");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(!config.debug);
        assert!(!config.has_webhook_auth());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_url() {
        let config = N8nConfig::new("http://localhost:5678/api/v1/", "key");
        assert_eq!(config.url("/workflows"), "http://localhost:5678/api/v1/workflows");
        assert_eq!(config.url("tags/1"), "http://localhost:5678/api/v1/tags/1");
    }

    #[test]
    fn test_webhook_base_url() {
        let config = N8nConfig::new("https://n8n.example.com/api/v1", "key");
        assert_eq!(config.webhook_base_url(), "https://n8n.example.com");

        let config = N8nConfig::new("https://n8n.example.com/api/v1/", "key");
        assert_eq!(config.webhook_base_url(), "https://n8n.example.com");

        let config = N8nConfig::new("https://n8n.example.com", "key");
        assert_eq!(config.webhook_base_url(), "https://n8n.example.com");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(matches!(
            N8nConfig::new("", "key").validate(),
            Err(ConfigError::MissingEnvVar(_))
        ));
        assert!(matches!(
            N8nConfig::new("http://localhost:5678", " ").validate(),
            Err(ConfigError::MissingEnvVar(_))
        ));
        assert!(matches!(
            N8nConfig::new("not a url", "key").validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            N8nConfig::new("ftp://example.com", "key").validate(),
            Err(ConfigError::InvalidValue { .. })
        ));

        let mut config = N8nConfig::new("http://localhost:5678", "key");
        config.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy("true"));
        assert!(is_truthy("1"));
        assert!(is_truthy(" YES "));
        assert!(!is_truthy("false"));
        assert!(!is_truthy(""));
    }
}
