//! Per-source lead handlers.
//!
//! Each supported lead source gets one [`SourceHandler`] implementation that
//! maps the source's payload shape into CRM side effects. Handlers are
//! deliberately asymmetric: sources without a field mapping acknowledge
//! receipt and do nothing, while mapped sources run the full
//! resolve-contact-lead pipeline. That asymmetry is per-source behavior and
//! must not be unified.

pub mod bayut_whatsapp;
pub mod dubizzle_whatsapp;

pub use bayut_whatsapp::BayutWhatsappHandler;
pub use dubizzle_whatsapp::DubizzleWhatsappHandler;

use crate::crm::CrmError;
use async_trait::async_trait;
use serde_json::Value;

// ============================================================================
// LeadOutcome
// ============================================================================

/// Result of successfully handling a lead payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeadOutcome {
    /// A CRM lead was created; `lead_id` is the new record's id.
    LeadCreated { lead_id: i64 },

    /// The payload was received and logged; no CRM records were written.
    Acknowledged,
}

impl LeadOutcome {
    /// The success message reported back to the webhook caller.
    pub fn message(&self) -> String {
        match self {
            Self::LeadCreated { lead_id } => format!(
                "Lead data processed successfully and lead created with ID: {lead_id}"
            ),
            Self::Acknowledged => "Lead data processed successfully".to_string(),
        }
    }
}

// ============================================================================
// HandlerError
// ============================================================================

/// Failures raised while handling a validated payload.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The payload is missing a field the CRM write cannot do without.
    ///
    /// Raised before any CRM call is issued; maps to a client error at the
    /// HTTP boundary.
    #[error("Invalid lead payload: {message}")]
    InvalidPayload { message: String },

    /// A CRM write (or its response) failed; the request aborts.
    #[error("CRM write failed: {0}")]
    CrmWrite(#[from] CrmError),
}

// ============================================================================
// SourceHandler
// ============================================================================

/// A handler bound to one lead source.
///
/// Implementations receive the parsed JSON body of the webhook and perform
/// whatever CRM writes the source requires. All writes complete before the
/// handler returns; there is no background completion.
#[async_trait]
pub trait SourceHandler: Send + Sync {
    /// Handle one incoming lead payload.
    async fn handle(&self, payload: &Value) -> Result<LeadOutcome, HandlerError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
