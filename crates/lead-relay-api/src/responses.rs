//! Response body types for the HTTP service.

use serde::Serialize;

/// Success response for a processed lead webhook.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Human-readable outcome, e.g. the created lead id.
    pub message: String,
}

/// Error response body.
///
/// `error` is always present; `message` adds human-readable context and
/// `details` carries upstream failure text when the service is configured to
/// expose it.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    /// An error body with no additional context.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
            details: None,
        }
    }

    /// An error body with a human-readable message.
    pub fn with_message(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: Some(message.into()),
            details: None,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub timestamp: String,
}
