//! Outbound CRM REST boundary.
//!
//! The CRM exposes a uniform RPC surface: every operation is a POST of JSON
//! parameters to `{base_url}/{method}.json`, answered by an envelope of the
//! form `{result, error?, error_description?}`. [`CrmClient`] models exactly
//! that single `call` operation; it is the only network egress point in the
//! adapter.
//!
//! Two failure planes are kept distinct on purpose:
//!
//! - **Transport/shape failures** ([`CrmError::Transport`],
//!   [`CrmError::InvalidResponse`]) — the call never produced a usable
//!   envelope.
//! - **API-level failures** — the CRM answered with an `error` field in the
//!   envelope. `call` still returns `Ok`; callers inspect
//!   [`CrmResponse::error`] and decide whether to fall back (lookups) or
//!   abort (writes, via [`CrmApi`] which promotes them to [`CrmError::Api`]).
//!
//! There is no retry, backoff, or circuit breaking here: a request either
//! completes within the configured per-call timeout or fails.

mod rest;

pub use rest::RestCrmClient;

use crate::CrmUserId;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

// ============================================================================
// CrmResponse
// ============================================================================

/// Response envelope returned by every CRM REST method.
#[derive(Debug, Clone, Deserialize)]
pub struct CrmResponse {
    /// Method result; shape depends on the method called.
    #[serde(default)]
    pub result: Value,

    /// Machine-readable error code when the call was rejected.
    #[serde(default)]
    pub error: Option<String>,

    /// Human-readable error detail accompanying `error`.
    #[serde(default)]
    pub error_description: Option<String>,
}

impl CrmResponse {
    /// Whether the envelope carries an API-level error.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

// ============================================================================
// CrmError
// ============================================================================

/// Failures raised by the CRM client.
#[derive(Debug, thiserror::Error)]
pub enum CrmError {
    /// The request never completed: connection failure, timeout, or a
    /// non-success HTTP status without a parseable envelope.
    #[error("CRM request failed: {message}")]
    Transport { message: String },

    /// The CRM answered, but the body was not a valid response envelope.
    #[error("CRM returned an unparseable response: {message}")]
    InvalidResponse { message: String },

    /// The CRM rejected the call with an error envelope.
    #[error("CRM rejected '{method}': {error}")]
    Api {
        method: String,
        error: String,
        description: Option<String>,
    },
}

impl CrmError {
    /// Whether the failure is transient (worth surfacing as such upstream).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

// ============================================================================
// CrmClient
// ============================================================================

/// The CRM RPC boundary: `call(method, params) -> envelope`.
#[async_trait]
pub trait CrmClient: Send + Sync {
    /// Invoke a CRM REST method with JSON parameters.
    ///
    /// API-level rejections are returned as `Ok` envelopes with the `error`
    /// field set; `Err` is reserved for transport and decoding failures.
    async fn call(&self, method: &str, params: Value) -> Result<CrmResponse, CrmError>;
}

// ============================================================================
// CrmApi
// ============================================================================

/// Typed convenience layer over the raw [`CrmClient`] interface.
///
/// Each helper wraps one CRM method used by the adapter, extracts the
/// relevant part of the `result`, and promotes API error envelopes to
/// [`CrmError::Api`] so callers handle a single error type.
#[derive(Clone)]
pub struct CrmApi {
    client: Arc<dyn CrmClient>,
}

impl CrmApi {
    /// Wrap a client implementation.
    pub fn new(client: Arc<dyn CrmClient>) -> Self {
        Self { client }
    }

    /// Look up a single active CRM user matching `filter`.
    ///
    /// The `ACTIVE: Y` constraint is merged into the caller's filter. Returns
    /// the first match, or `None` when the CRM reports no rows (or rows
    /// without a parseable id).
    ///
    /// # Errors
    ///
    /// Returns [`CrmError`] on transport failure or an API error envelope.
    pub async fn find_user(&self, mut filter: Value) -> Result<Option<CrmUserId>, CrmError> {
        if let Some(map) = filter.as_object_mut() {
            map.insert("ACTIVE".to_string(), json!("Y"));
        }

        let response = self.checked_call("user.get", json!({ "filter": filter })).await?;

        let id = response
            .result
            .as_array()
            .and_then(|users| users.first())
            .and_then(|user| user.get("ID"))
            .and_then(CrmUserId::from_value);

        Ok(id)
    }

    /// List items of a smart-process entity matching `filter`.
    ///
    /// Returns the `result.items` array; an envelope without items yields an
    /// empty vector.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError`] on transport failure or an API error envelope.
    pub async fn list_items(
        &self,
        entity_type_id: u32,
        filter: Value,
        select: &[&str],
    ) -> Result<Vec<Value>, CrmError> {
        let response = self
            .checked_call(
                "crm.item.list",
                json!({
                    "entityTypeId": entity_type_id,
                    "filter": filter,
                    "select": select,
                }),
            )
            .await?;

        let items = response
            .result
            .get("items")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(items)
    }

    /// Create a contact and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError`] on transport failure, an API error envelope, or a
    /// `result` that is not an entity id.
    pub async fn create_contact(&self, fields: Value) -> Result<i64, CrmError> {
        self.create_entity("crm.contact.add", fields).await
    }

    /// Create a lead and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError`] on transport failure, an API error envelope, or a
    /// `result` that is not an entity id.
    pub async fn create_lead(&self, fields: Value) -> Result<i64, CrmError> {
        self.create_entity("crm.lead.add", fields).await
    }

    async fn create_entity(&self, method: &str, fields: Value) -> Result<i64, CrmError> {
        let response = self
            .checked_call(method, json!({ "fields": fields }))
            .await?;

        value_as_i64(&response.result).ok_or_else(|| CrmError::InvalidResponse {
            message: format!("'{method}' did not return an entity id"),
        })
    }

    /// Issue a call and promote an API error envelope to [`CrmError::Api`].
    async fn checked_call(&self, method: &str, params: Value) -> Result<CrmResponse, CrmError> {
        debug!(method, "Calling CRM");
        let response = self.client.call(method, params).await?;

        if let Some(error) = response.error {
            return Err(CrmError::Api {
                method: method.to_string(),
                error,
                description: response.error_description,
            });
        }

        Ok(response)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Interpret a JSON value as an integer id.
///
/// The CRM returns ids as numbers or numeric strings depending on the method.
pub(crate) fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
