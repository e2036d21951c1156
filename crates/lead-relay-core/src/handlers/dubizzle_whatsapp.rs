//! Handler for the `dubizzle-whatsapp` lead source.

use super::{HandlerError, LeadOutcome, SourceHandler};
use crate::config::CrmConfig;
use crate::crm::CrmApi;
use crate::resolver::{ResponsiblePersonResolver, SearchKey};
use crate::CrmUserId;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{info, instrument};

const SOURCE_LABEL: &str = "Dubizzle - WhatsApp";
const NO_REFERENCE: &str = "No reference";

/// Full-pipeline handler for dubizzle WhatsApp enquiries.
///
/// For each payload: resolve a responsible person from the listing
/// reference, create a contact for the enquirer, then create a lead linked
/// to that contact carrying the portal fields and the listing's asking price
/// as the opportunity amount.
pub struct DubizzleWhatsappHandler {
    crm: CrmApi,
    resolver: ResponsiblePersonResolver,
    config: Arc<CrmConfig>,
}

impl DubizzleWhatsappHandler {
    /// Create a handler over the given CRM API, resolver, and configuration.
    pub fn new(crm: CrmApi, resolver: ResponsiblePersonResolver, config: Arc<CrmConfig>) -> Self {
        Self {
            crm,
            resolver,
            config,
        }
    }
}

#[async_trait]
impl SourceHandler for DubizzleWhatsappHandler {
    #[instrument(skip(self, payload))]
    async fn handle(&self, payload: &Value) -> Result<LeadOutcome, HandlerError> {
        // The phone number is the one field the contact write cannot do
        // without; reject before any CRM call rather than letting the write
        // fail remotely.
        let phone = non_empty_str(payload, "/enquirer/phone_number").ok_or_else(|| {
            HandlerError::InvalidPayload {
                message: "missing enquirer.phone_number".to_string(),
            }
        })?;

        let reference = non_empty_str(payload, "/listing/reference");

        let assigned_to = match reference {
            Some(reference) => {
                self.resolver
                    .resolve(&SearchKey::Reference(reference.to_string()))
                    .await
            }
            None => Some(self.config.default_responsible_person()),
        };

        let title = format!(
            "{SOURCE_LABEL} - {}",
            reference.unwrap_or(NO_REFERENCE)
        );

        let enquirer_name = non_empty_str(payload, "/enquirer/name");

        let contact_id = self
            .crm
            .create_contact(json!({
                "NAME": enquirer_name.unwrap_or(&title),
                "PHONE": [{ "VALUE": phone, "VALUE_TYPE": "WORK" }],
                "SOURCE_ID": self.config.dubizzle_whatsapp_source_id,
                "ASSIGNED_BY_ID": assigned_value(assigned_to),
            }))
            .await?;

        let opportunity = match reference {
            Some(reference) => self
                .resolver
                .property_price(reference)
                .await
                .unwrap_or_else(|| json!("")),
            None => json!(""),
        };

        let lead_id = self
            .crm
            .create_lead(Value::Object(self.lead_fields(
                payload,
                &title,
                assigned_to,
                opportunity,
                contact_id,
            )))
            .await?;

        info!(lead_id, contact_id, "Created CRM lead from dubizzle-whatsapp enquiry");

        Ok(LeadOutcome::LeadCreated { lead_id })
    }
}

impl DubizzleWhatsappHandler {
    /// Assemble the lead field set: routing fields from configuration plus
    /// the portal fields copied verbatim from the payload.
    fn lead_fields(
        &self,
        payload: &Value,
        title: &str,
        assigned_to: Option<CrmUserId>,
        opportunity: Value,
        contact_id: i64,
    ) -> Map<String, Value> {
        let codes = &self.config.lead_fields;
        let mut fields = Map::new();

        fields.insert("TITLE".to_string(), json!(title));
        fields.insert(
            "CATEGORY_ID".to_string(),
            json!(self.config.secondary_pipeline_id),
        );
        fields.insert("ASSIGNED_BY_ID".to_string(), assigned_value(assigned_to));
        fields.insert(
            "SOURCE_ID".to_string(),
            json!(self.config.dubizzle_whatsapp_source_id),
        );
        fields.insert(
            codes.enquirer_name.clone(),
            payload
                .pointer("/enquirer/name")
                .filter(|name| !name.is_null())
                .cloned()
                .unwrap_or_else(|| json!("Unknown")),
        );
        fields.insert(
            codes.enquirer_phone.clone(),
            copied_field(payload, "/enquirer/phone_number"),
        );
        fields.insert(
            codes.contact_link.clone(),
            copied_field(payload, "/enquirer/contact_link"),
        );
        fields.insert(
            codes.listing_reference.clone(),
            copied_field(payload, "/listing/reference"),
        );
        fields.insert(
            codes.listing_url.clone(),
            copied_field(payload, "/listing/url"),
        );
        fields.insert("OPPORTUNITY".to_string(), opportunity);
        fields.insert("CONTACT_ID".to_string(), json!(contact_id));

        fields
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn non_empty_str<'a>(payload: &'a Value, pointer: &str) -> Option<&'a str> {
    payload
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Copy a payload field verbatim, null when absent.
fn copied_field(payload: &Value, pointer: &str) -> Value {
    payload.pointer(pointer).cloned().unwrap_or(Value::Null)
}

fn assigned_value(assigned_to: Option<CrmUserId>) -> Value {
    match assigned_to {
        Some(id) => json!(id.value()),
        None => Value::Null,
    }
}

#[cfg(test)]
#[path = "dubizzle_whatsapp_tests.rs"]
mod tests;
