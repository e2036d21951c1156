//! Router-level tests for the lead dispatch contract.

use super::*;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use lead_relay_core::{HandlerError, SourceHandler};
use lead_relay_core::{CrmError, LeadOutcome};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

// ============================================================================
// Counting mock handler
// ============================================================================

/// Handler returning a fixed outcome and counting invocations.
struct CountingHandler {
    calls: Arc<AtomicUsize>,
    outcome: fn() -> Result<LeadOutcome, HandlerError>,
}

impl CountingHandler {
    fn new(outcome: fn() -> Result<LeadOutcome, HandlerError>) -> (Arc<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Arc::new(Self {
                calls: calls.clone(),
                outcome,
            }),
            calls,
        )
    }
}

#[async_trait]
impl SourceHandler for CountingHandler {
    async fn handle(&self, _payload: &serde_json::Value) -> Result<LeadOutcome, HandlerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.outcome)()
    }
}

fn acknowledged() -> Result<LeadOutcome, HandlerError> {
    Ok(LeadOutcome::Acknowledged)
}

fn lead_created() -> Result<LeadOutcome, HandlerError> {
    Ok(LeadOutcome::LeadCreated { lead_id: 99 })
}

fn crm_write_failure() -> Result<LeadOutcome, HandlerError> {
    Err(HandlerError::CrmWrite(CrmError::Transport {
        message: "timed out".to_string(),
    }))
}

// ============================================================================
// Test fixtures
// ============================================================================

fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.crm_api.base_url = "https://crm.example.com/rest/1/key".to_string();
    config
}

fn app_with(
    outcome: fn() -> Result<LeadOutcome, HandlerError>,
) -> (Router, Arc<AtomicUsize>) {
    let (handler, calls) = CountingHandler::new(outcome);
    let mut registry = HandlerRegistry::new();
    registry.register(LeadSource::BayutWhatsapp, handler.clone());
    registry.register(LeadSource::DubizzleWhatsapp, handler);

    (create_router(AppState::new(test_config(), registry)), calls)
}

fn lead_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// Method contract
// ============================================================================

mod method_tests {
    use super::*;

    /// Verify that non-POST methods get 405 with the fixed body and never
    /// reach a handler.
    #[tokio::test]
    async fn test_non_post_rejected_without_handler_call() {
        for method in ["GET", "PUT", "DELETE", "PATCH"] {
            let (app, calls) = app_with(acknowledged);

            let response = app
                .oneshot(lead_request(method, "/?lead_type=bayut-whatsapp", "{}"))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
            let body = body_json(response).await;
            assert_eq!(body["error"], "Method Not Allowed");
            assert_eq!(body["message"], "Only POST requests are accepted");
            assert_eq!(calls.load(Ordering::SeqCst), 0, "{method} reached a handler");
        }
    }

    /// Verify that error responses are JSON.
    #[tokio::test]
    async fn test_error_responses_are_json() {
        let (app, _) = app_with(acknowledged);

        let response = app
            .oneshot(lead_request("GET", "/", ""))
            .await
            .unwrap();

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("application/json"));
    }
}

// ============================================================================
// Route contract
// ============================================================================

mod route_tests {
    use super::*;

    /// Verify that an unknown lead_type gets 404 without a handler call.
    #[tokio::test]
    async fn test_unknown_lead_type_rejected() {
        let (app, calls) = app_with(acknowledged);

        let response = app
            .oneshot(lead_request("POST", "/?lead_type=nosuch-source", "{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Not Found");
        assert_eq!(body["message"], "Invalid lead_type provided");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    /// Verify that a missing lead_type gets the same 404.
    #[tokio::test]
    async fn test_missing_lead_type_rejected() {
        let (app, calls) = app_with(acknowledged);

        let response = app.oneshot(lead_request("POST", "/", "{}")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    /// Verify that a known source without a registered handler is 404.
    #[tokio::test]
    async fn test_unregistered_source_rejected() {
        let app = create_router(AppState::new(test_config(), HandlerRegistry::new()));

        let response = app
            .oneshot(lead_request("POST", "/?lead_type=bayut-whatsapp", "{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

// ============================================================================
// Body contract
// ============================================================================

mod body_tests {
    use super::*;

    /// Verify that a malformed body gets 400 without a handler call.
    #[tokio::test]
    async fn test_malformed_json_rejected() {
        let (app, calls) = app_with(acknowledged);

        let response = app
            .oneshot(lead_request(
                "POST",
                "/?lead_type=bayut-whatsapp",
                "{invalid json",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid JSON data");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    /// Verify that valid JSON which is not an object is also rejected.
    #[tokio::test]
    async fn test_non_object_json_rejected() {
        let (app, calls) = app_with(acknowledged);

        let response = app
            .oneshot(lead_request("POST", "/?lead_type=bayut-whatsapp", "42"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}

// ============================================================================
// Success and failure paths
// ============================================================================

mod outcome_tests {
    use super::*;

    /// Verify the acknowledgment success message.
    #[tokio::test]
    async fn test_acknowledged_success() {
        let (app, calls) = app_with(acknowledged);

        let response = app
            .oneshot(lead_request("POST", "/?lead_type=bayut-whatsapp", "{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Lead data processed successfully");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    /// Verify the created-lead success message carries the id.
    #[tokio::test]
    async fn test_lead_created_success() {
        let (app, _) = app_with(lead_created);

        let response = app
            .oneshot(lead_request("POST", "/?lead_type=dubizzle-whatsapp", "{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(
            body["message"],
            "Lead data processed successfully and lead created with ID: 99"
        );
    }

    /// Verify that handler payload validation maps to 400.
    #[tokio::test]
    async fn test_invalid_payload_maps_to_400() {
        fn invalid_payload() -> Result<LeadOutcome, HandlerError> {
            Err(HandlerError::InvalidPayload {
                message: "missing enquirer.phone_number".to_string(),
            })
        }
        let (app, _) = app_with(invalid_payload);

        let response = app
            .oneshot(lead_request("POST", "/?lead_type=dubizzle-whatsapp", "{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid lead payload");
    }

    /// Verify that CRM write failures surface as the generic 500 by default.
    #[tokio::test]
    async fn test_crm_failure_maps_to_generic_500() {
        let (app, _) = app_with(crm_write_failure);

        let response = app
            .oneshot(lead_request("POST", "/?lead_type=dubizzle-whatsapp", "{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Internal Server Error");
        assert_eq!(body["message"], "An unexpected error occurred");
        assert!(body.get("details").is_none());
    }

    /// Verify that failure detail appears when configured.
    #[tokio::test]
    async fn test_crm_failure_detail_when_exposed() {
        let (handler, _) = CountingHandler::new(crm_write_failure);
        let mut registry = HandlerRegistry::new();
        registry.register(LeadSource::DubizzleWhatsapp, handler);

        let mut config = test_config();
        config.server.expose_error_details = true;
        let app = create_router(AppState::new(config, registry));

        let response = app
            .oneshot(lead_request("POST", "/?lead_type=dubizzle-whatsapp", "{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["details"].as_str().unwrap().contains("timed out"));
    }
}

// ============================================================================
// Health endpoints
// ============================================================================

mod health_tests {
    use super::*;

    /// Verify the health endpoint answers healthy.
    #[tokio::test]
    async fn test_health_endpoint() {
        let (app, _) = app_with(acknowledged);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
    }

    /// Verify the readiness endpoint answers ready.
    #[tokio::test]
    async fn test_ready_endpoint() {
        let (app, _) = app_with(acknowledged);

        let response = app
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["ready"], true);
    }

    /// Verify that unknown paths fall through to axum's 404.
    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let (app, _) = app_with(acknowledged);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/nonexistent")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
