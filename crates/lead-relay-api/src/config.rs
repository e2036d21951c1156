//! Configuration types for the HTTP service.

use lead_relay_core::config::{CrmConfig, CrmConfigError};
use serde::{Deserialize, Serialize};

// ============================================================================
// ServiceConfig
// ============================================================================

/// Service configuration.
///
/// Every section carries serde defaults, so a partial (or absent)
/// configuration file deserializes into a complete config. The CRM API base
/// URL has no sensible default and must be supplied; [`ServiceConfig::validate`]
/// enforces it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings.
    pub server: ServerConfig,

    /// Outbound CRM API settings.
    pub crm_api: CrmApiConfig,

    /// CRM field mapping.
    pub crm: CrmConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Validate the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                message: "server.port must be non-zero".to_string(),
            });
        }

        if self.server.timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                message: "server.timeout_seconds must be non-zero".to_string(),
            });
        }

        if self.crm_api.base_url.is_empty() {
            return Err(ConfigError::Missing {
                key: "crm_api.base_url".to_string(),
            });
        }

        let parsed = url::Url::parse(&self.crm_api.base_url).map_err(|e| ConfigError::Invalid {
            message: format!("crm_api.base_url is not a valid URL: {e}"),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                message: format!(
                    "crm_api.base_url must use http or https, got '{}'",
                    parsed.scheme()
                ),
            });
        }

        if self.crm_api.timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                message: "crm_api.timeout_seconds must be non-zero".to_string(),
            });
        }

        self.crm.validate()?;

        Ok(())
    }
}

// ============================================================================
// Sections
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// Request timeout in seconds.
    pub timeout_seconds: u64,

    /// Graceful shutdown timeout in seconds.
    pub shutdown_timeout_seconds: u64,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,

    /// Enable permissive CORS.
    pub enable_cors: bool,

    /// Include upstream failure detail in 500 response bodies.
    ///
    /// Verbosity knob, not a contract: the outer error/message pair is fixed
    /// either way.
    pub expose_error_details: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            timeout_seconds: 30,
            shutdown_timeout_seconds: 30,
            max_body_size: 1024 * 1024, // 1MB; lead payloads are small
            enable_cors: false,
            expose_error_details: false,
        }
    }
}

/// Outbound CRM API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrmApiConfig {
    /// Inbound-webhook base URL of the CRM REST API.
    ///
    /// Required; there is no default CRM instance.
    pub base_url: String,

    /// Per-call timeout in seconds for outbound CRM requests.
    pub timeout_seconds: u64,
}

impl Default for CrmApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_seconds: 30,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter directive when `RUST_LOG` is unset.
    pub level: String,

    /// Emit JSON structured logs instead of human-readable lines.
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

// ============================================================================
// ConfigError
// ============================================================================

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },

    #[error("Invalid CRM mapping configuration: {0}")]
    CrmMapping(#[from] CrmConfigError),
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
