//! # Lead-Relay HTTP Service
//!
//! HTTP surface for the lead-relay webhook adapter.
//!
//! This crate provides:
//! - the lead webhook endpoint `POST /?lead_type={source}` with its fixed
//!   status-code/body contract
//! - health and readiness endpoints
//! - request-logging middleware with correlation ids
//! - server startup with graceful shutdown
//!
//! Dispatch is strictly: validate method → resolve [`LeadSource`] → parse the
//! JSON body → invoke the registered source handler → render the response.
//! Every CRM call a handler makes completes before the response is written;
//! nothing continues in the background.

pub mod config;
pub mod errors;
pub mod registry;
pub mod responses;

pub use config::{CrmApiConfig, LoggingConfig, ServerConfig, ServiceConfig};
pub use errors::{DispatchError, ServiceError};
pub use registry::{HandlerRegistry, LeadSource};
pub use responses::{ErrorBody, HealthResponse, ReadinessResponse, WebhookResponse};

use axum::{
    extract::{DefaultBodyLimit, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{any, get},
    Router,
};
use bytes::Bytes;
use lead_relay_core::LeadOutcome;
use serde::Deserialize;
use serde_json::Value;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, instrument, warn};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service.
    pub config: ServiceConfig,

    /// Registered per-source lead handlers.
    pub handlers: HandlerRegistry,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: ServiceConfig, handlers: HandlerRegistry) -> Self {
        Self { config, handlers }
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create the HTTP router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    // The lead route matches every method itself: axum's automatic 405 has
    // an empty body, and the dispatch contract requires a fixed JSON one.
    let lead_routes = Router::new().route("/", any(dispatch_lead));

    let health_routes = Router::new()
        .route("/health", get(handle_health_check))
        .route("/ready", get(handle_readiness_check));

    let max_body_size = state.config.server.max_body_size;
    let enable_cors = state.config.server.enable_cors;

    let mut app = Router::new()
        .merge(lead_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(request_logging_middleware))
                .into_inner(),
        )
        .layer(DefaultBodyLimit::max(max_body_size))
        .with_state(state);

    if enable_cors {
        app = app.layer(CorsLayer::permissive());
    }

    app
}

/// Start the HTTP server and serve until shutdown.
///
/// # Errors
///
/// Returns [`ServiceError::BindFailed`] when the listen address is
/// unavailable and [`ServiceError::ServerFailed`] when serving aborts.
pub async fn start_server(config: ServiceConfig, handlers: HandlerRegistry) -> Result<(), ServiceError> {
    let address = format!("{}:{}", config.server.host, config.server.port);
    let addr: SocketAddr = address.parse().map_err(|e| ServiceError::BindFailed {
        address: address.clone(),
        message: format!("invalid listen address: {e}"),
    })?;

    let state = AppState::new(config, handlers);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ServiceError::BindFailed {
            address: addr.to_string(),
            message: e.to_string(),
        })?;

    info!("Starting HTTP server on {}", addr);

    let shutdown_signal = async {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C signal handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
            },
            _ = terminate => {
                info!("Received SIGTERM, initiating graceful shutdown");
            },
        }
    };

    // In-flight requests complete before the server stops; combined with the
    // dispatcher finishing every CRM call before responding, shutdown never
    // abandons a half-written lead.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        })?;

    info!("HTTP server shutdown complete");
    Ok(())
}

// ============================================================================
// Lead Dispatch
// ============================================================================

/// Query parameters accepted by the lead route.
#[derive(Debug, Deserialize)]
struct LeadQuery {
    lead_type: Option<String>,
}

/// Dispatch a lead webhook request.
///
/// Single response-writing boundary: the inner dispatch returns a result,
/// and this function renders both arms, applying the configured error
/// verbosity.
#[instrument(skip(state, query, body), fields(lead_type))]
async fn dispatch_lead(
    State(state): State<AppState>,
    method: Method,
    Query(query): Query<LeadQuery>,
    body: Bytes,
) -> Response {
    match dispatch_inner(&state, method, query, body).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(WebhookResponse {
                message: outcome.message(),
            }),
        )
            .into_response(),
        Err(failure) => failure.into_response_with(state.config.server.expose_error_details),
    }
}

async fn dispatch_inner(
    state: &AppState,
    method: Method,
    query: LeadQuery,
    body: Bytes,
) -> Result<LeadOutcome, DispatchError> {
    if method != Method::POST {
        return Err(DispatchError::MethodNotAllowed {
            method: method.to_string(),
        });
    }

    let source: LeadSource = query
        .lead_type
        .as_deref()
        .and_then(|value| value.parse().ok())
        .ok_or_else(|| DispatchError::UnknownLeadType {
            lead_type: query.lead_type.clone(),
        })?;

    tracing::Span::current().record("lead_type", source.as_str());

    let handler = state
        .handlers
        .get(source)
        .ok_or_else(|| {
            // A known source without a registered handler is a wiring bug;
            // to the caller it is indistinguishable from an unknown route.
            error!(source = %source, "No handler registered for lead source");
            DispatchError::UnknownLeadType {
                lead_type: Some(source.as_str().to_string()),
            }
        })?;

    let payload: Value =
        serde_json::from_slice(&body).map_err(|_| DispatchError::InvalidJson)?;
    if !payload.is_object() {
        return Err(DispatchError::InvalidJson);
    }

    info!(source = %source, "Dispatching lead webhook");

    let outcome = handler.handle(&payload).await?;
    Ok(outcome)
}

// ============================================================================
// Health Check Handlers
// ============================================================================

/// Basic health check endpoint.
async fn handle_health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check for load balancers.
///
/// The service is stateless; once it answers, it is ready.
async fn handle_readiness_check() -> Json<ReadinessResponse> {
    Json(ReadinessResponse {
        ready: true,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

// ============================================================================
// Middleware
// ============================================================================

/// Request logging middleware with correlation id tracking.
///
/// Extracts or generates a correlation id, logs request start and completion
/// with structured fields, and propagates the id through the response
/// headers.
#[instrument(skip(request, next), fields(
    method = %request.method(),
    uri = %request.uri(),
    correlation_id
))]
async fn request_logging_middleware(
    mut request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let correlation_id = request
        .headers()
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    tracing::Span::current().record("correlation_id", correlation_id.as_str());
    request.extensions_mut().insert(correlation_id.clone());

    let mut response = next.run(request).await;
    let duration = start.elapsed();

    if let Ok(header_value) = correlation_id.parse() {
        response
            .headers_mut()
            .insert("x-correlation-id", header_value);
    }

    let status = response.status();

    if status.is_server_error() {
        error!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with server error"
        );
    } else if status.is_client_error() {
        warn!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with client error"
        );
    } else {
        info!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed successfully"
        );
    }

    response
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
