//! Handler for the `bayut-whatsapp` lead source.

use super::{HandlerError, LeadOutcome, SourceHandler};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

/// Acknowledge-only handler for bayut WhatsApp enquiries.
///
/// No CRM field mapping is configured for this source yet; payloads are
/// logged for later inspection and acknowledged. This is intentionally
/// different from [`DubizzleWhatsappHandler`](super::DubizzleWhatsappHandler),
/// which writes CRM records.
pub struct BayutWhatsappHandler;

#[async_trait]
impl SourceHandler for BayutWhatsappHandler {
    async fn handle(&self, payload: &Value) -> Result<LeadOutcome, HandlerError> {
        info!("Received bayut-whatsapp lead; acknowledging without CRM writes");
        debug!(payload = %payload, "bayut-whatsapp payload");
        Ok(LeadOutcome::Acknowledged)
    }
}

#[cfg(test)]
#[path = "bayut_whatsapp_tests.rs"]
mod tests;
