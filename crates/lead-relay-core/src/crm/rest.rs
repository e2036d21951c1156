//! reqwest-backed [`CrmClient`] implementation.

use super::{CrmClient, CrmError, CrmResponse};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::instrument;

/// CRM client speaking the REST webhook protocol over HTTPS.
///
/// Each call POSTs its parameters as JSON to `{base_url}/{method}.json` and
/// decodes the response envelope. A bounded per-call timeout is applied by
/// the underlying HTTP client; exceeding it surfaces as
/// [`CrmError::Transport`].
#[derive(Debug, Clone)]
pub struct RestCrmClient {
    http: reqwest::Client,
    base_url: String,
}

impl RestCrmClient {
    /// Build a client for the given inbound-webhook base URL.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Transport`] if the underlying HTTP client cannot
    /// be constructed.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CrmError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CrmError::Transport {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// The configured base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CrmClient for RestCrmClient {
    #[instrument(skip(self, params))]
    async fn call(&self, method: &str, params: Value) -> Result<CrmResponse, CrmError> {
        let url = format!("{}/{}.json", self.base_url, method);

        let response = self
            .http
            .post(&url)
            .json(&params)
            .send()
            .await
            .map_err(|e| CrmError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| CrmError::Transport {
            message: e.to_string(),
        })?;

        // The CRM reports API-level rejections with 4xx statuses and a JSON
        // error envelope; decode the body before judging the status so those
        // reach the caller as inspectable envelopes.
        match serde_json::from_slice::<CrmResponse>(&body) {
            Ok(envelope) => Ok(envelope),
            Err(parse_error) if status.is_success() => Err(CrmError::InvalidResponse {
                message: format!("'{method}' returned invalid JSON: {parse_error}"),
            }),
            Err(_) => Err(CrmError::Transport {
                message: format!("'{method}' failed with HTTP status {status}"),
            }),
        }
    }
}

#[cfg(test)]
#[path = "rest_tests.rs"]
mod tests;
