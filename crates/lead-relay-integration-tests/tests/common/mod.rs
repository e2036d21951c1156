//! Common test utilities for lead-relay integration tests.
//!
//! Builds the real router — production handlers, resolver, and REST CRM
//! client — pointed at a stubbed CRM endpoint.

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use lead_relay_api::{create_router, AppState, HandlerRegistry, LeadSource, ServiceConfig};
use lead_relay_core::handlers::{BayutWhatsappHandler, DubizzleWhatsappHandler};
use lead_relay_core::{CrmApi, ResponsiblePersonResolver, RestCrmClient};
use std::sync::Arc;
use std::time::Duration;

/// Service configuration pointing at the given CRM base URL.
pub fn service_config(crm_base_url: &str) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.crm_api.base_url = crm_base_url.to_string();
    config.crm_api.timeout_seconds = 5;
    config.validate().expect("test configuration must be valid");
    config
}

/// Build the full application router with production wiring.
pub fn build_app(config: ServiceConfig) -> Router {
    let crm_client = Arc::new(
        RestCrmClient::new(
            config.crm_api.base_url.clone(),
            Duration::from_secs(config.crm_api.timeout_seconds),
        )
        .expect("failed to build CRM client"),
    );

    let crm_config = Arc::new(config.crm.clone());
    let crm_api = CrmApi::new(crm_client);
    let resolver = ResponsiblePersonResolver::new(crm_api.clone(), crm_config.clone());

    let mut registry = HandlerRegistry::new();
    registry.register(LeadSource::BayutWhatsapp, Arc::new(BayutWhatsappHandler));
    registry.register(
        LeadSource::DubizzleWhatsapp,
        Arc::new(DubizzleWhatsappHandler::new(crm_api, resolver, crm_config)),
    );

    create_router(AppState::new(config, registry))
}

/// Build a lead webhook request.
#[allow(dead_code)]
pub fn lead_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("response body is not JSON")
}
