//! Error types for the HTTP service.
//!
//! Dispatch failures are values, not exceptions: they propagate up to a
//! single response-writing boundary in the webhook handler, which converts
//! them to the fixed status/body contract:
//!
//! - `405 Method Not Allowed` — anything but POST on the lead route
//! - `404 Not Found` — missing or unknown `lead_type`
//! - `400 Bad Request` — unparseable body, or a payload rejected by a
//!   handler before any CRM call
//! - `500 Internal Server Error` — CRM write failures and anything
//!   unexpected; detail is logged server-side and only included in the body
//!   when `server.expose_error_details` is set

use crate::responses::ErrorBody;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use lead_relay_core::HandlerError;
use tracing::{error, warn};

// ============================================================================
// DispatchError
// ============================================================================

/// Failures raised while dispatching a lead webhook request.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The request used a method other than POST.
    #[error("Method not allowed: {method}")]
    MethodNotAllowed { method: String },

    /// The `lead_type` parameter was missing or named no supported source.
    #[error("Unknown lead type: {}", .lead_type.as_deref().unwrap_or("<missing>"))]
    UnknownLeadType { lead_type: Option<String> },

    /// The request body was not a JSON object.
    #[error("Request body is not a JSON object")]
    InvalidJson,

    /// The source handler failed.
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

impl DispatchError {
    /// Convert to the fixed HTTP response contract.
    ///
    /// `expose_details` controls whether 500 bodies carry upstream failure
    /// text; the outer error/message pair is fixed regardless.
    pub fn into_response_with(self, expose_details: bool) -> Response {
        match self {
            Self::MethodNotAllowed { ref method } => {
                warn!(method = %method, "Rejected non-POST lead request");
                (
                    StatusCode::METHOD_NOT_ALLOWED,
                    Json(ErrorBody::with_message(
                        "Method Not Allowed",
                        "Only POST requests are accepted",
                    )),
                )
                    .into_response()
            }
            Self::UnknownLeadType { ref lead_type } => {
                warn!(lead_type = lead_type.as_deref(), "Rejected unknown lead type");
                (
                    StatusCode::NOT_FOUND,
                    Json(ErrorBody::with_message(
                        "Not Found",
                        "Invalid lead_type provided",
                    )),
                )
                    .into_response()
            }
            Self::InvalidJson => {
                warn!("Rejected unparseable request body");
                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorBody::new("Invalid JSON data")),
                )
                    .into_response()
            }
            Self::Handler(HandlerError::InvalidPayload { ref message }) => {
                warn!(message = %message, "Rejected invalid lead payload");
                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorBody::with_message(
                        "Invalid lead payload",
                        message.clone(),
                    )),
                )
                    .into_response()
            }
            Self::Handler(ref failure) => {
                // Detailed failure is logged server-side; the client gets the
                // generic contract (plus detail when configured).
                error!(error = %failure, "Lead handling failed");
                let mut body = ErrorBody::with_message(
                    "Internal Server Error",
                    "An unexpected error occurred",
                );
                if expose_details {
                    body.details = Some(failure.to_string());
                }
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        self.into_response_with(false)
    }
}

// ============================================================================
// ServiceError
// ============================================================================

/// Service-level errors.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] crate::config::ConfigError),
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
