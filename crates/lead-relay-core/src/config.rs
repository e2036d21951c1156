//! Static CRM mapping configuration.
//!
//! Everything the adapter needs to know about the target CRM instance lives
//! here: custom-field codes, pipeline and entity identifiers, the source tag
//! attached to created records, and the fallback assignee. The configuration
//! is loaded once at process start and passed explicitly into constructors;
//! nothing reads it from ambient globals.
//!
//! All fields carry serde defaults equal to the production values, so a
//! partially-specified configuration file deserializes into a complete
//! [`CrmConfig`].

use crate::CrmUserId;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

// ============================================================================
// CrmConfig
// ============================================================================

/// CRM mapping configuration, immutable after startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrmConfig {
    /// User id assigned ownership when no lookup produces a better match.
    pub default_responsible_person_id: i64,

    /// System user ids excluded from every responsible-person lookup.
    pub reserved_user_ids: Vec<i64>,

    /// Entity type id of the listings smart-process in the CRM.
    pub listings_entity_type_id: u32,

    /// Lead pipeline (category) receiving WhatsApp enquiries.
    pub secondary_pipeline_id: u32,

    /// `SOURCE_ID` tag stamped on contacts and leads from dubizzle WhatsApp.
    pub dubizzle_whatsapp_source_id: String,

    /// Custom-field codes on the lead entity.
    pub lead_fields: LeadFieldCodes,

    /// Custom-field codes on the listing entity.
    pub listing_fields: ListingFieldCodes,

    /// UTC offset, in minutes, of the reference timezone used for
    /// calendar-day comparisons when rendering timestamps.
    ///
    /// The deployment region (+04:00) observes no daylight saving, so a
    /// fixed offset is sufficient.
    pub reference_utc_offset_minutes: i32,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            default_responsible_person_id: 1,
            reserved_user_ids: vec![3, 268],
            listings_entity_type_id: 1036,
            secondary_pipeline_id: 2,
            dubizzle_whatsapp_source_id: "DUBIZZLE_WHATSAPP".to_string(),
            lead_fields: LeadFieldCodes::default(),
            listing_fields: ListingFieldCodes::default(),
            reference_utc_offset_minutes: 240,
        }
    }
}

impl CrmConfig {
    /// Validate the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`CrmConfigError`] describing the first problem found.
    pub fn validate(&self) -> Result<(), CrmConfigError> {
        self.lead_fields.validate()?;
        self.listing_fields.validate()?;

        if self.dubizzle_whatsapp_source_id.is_empty() {
            return Err(CrmConfigError::EmptyField {
                field: "dubizzle_whatsapp_source_id",
            });
        }

        // chrono rejects offsets of a full day or more
        if self.reference_utc_offset_minutes.abs() >= 24 * 60 {
            return Err(CrmConfigError::InvalidUtcOffset {
                minutes: self.reference_utc_offset_minutes,
            });
        }

        Ok(())
    }

    /// The configured fallback assignee.
    pub fn default_responsible_person(&self) -> CrmUserId {
        CrmUserId::new(self.default_responsible_person_id)
    }

    /// The reference timezone as a fixed UTC offset.
    ///
    /// Falls back to UTC if the configured offset is out of range; a
    /// validated configuration never hits the fallback.
    pub fn reference_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.reference_utc_offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("UTC offset is valid"))
    }
}

// ============================================================================
// Field code tables
// ============================================================================

/// Custom-field codes on the lead entity, copied into every created lead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadFieldCodes {
    /// Enquirer display name.
    pub enquirer_name: String,

    /// Enquirer phone number.
    pub enquirer_phone: String,

    /// Link to the enquirer's chat/contact page on the portal.
    pub contact_link: String,

    /// Listing reference number the enquiry refers to.
    pub listing_reference: String,

    /// Public URL of the listing.
    pub listing_url: String,
}

impl Default for LeadFieldCodes {
    fn default() -> Self {
        Self {
            enquirer_name: "UF_CRM_1721198189214".to_string(),
            enquirer_phone: "UF_CRM_1736406984".to_string(),
            contact_link: "UF_CRM_1739873044322".to_string(),
            listing_reference: "UF_CRM_1739890146108".to_string(),
            listing_url: "UF_CRM_1739945676".to_string(),
        }
    }
}

impl LeadFieldCodes {
    fn validate(&self) -> Result<(), CrmConfigError> {
        for (name, value) in [
            ("lead_fields.enquirer_name", &self.enquirer_name),
            ("lead_fields.enquirer_phone", &self.enquirer_phone),
            ("lead_fields.contact_link", &self.contact_link),
            ("lead_fields.listing_reference", &self.listing_reference),
            ("lead_fields.listing_url", &self.listing_url),
        ] {
            if value.is_empty() {
                return Err(CrmConfigError::EmptyField { field: name });
            }
        }
        Ok(())
    }
}

/// Custom-field codes on the listing entity, read during lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingFieldCodes {
    /// Unique listing reference number.
    pub reference_number: String,

    /// Email address of the listing agent.
    pub agent_email: String,

    /// Free-text name of the listing owner.
    pub owner_name: String,

    /// CRM user id of the listing owner.
    pub owner_id: String,

    /// Asking price of the listing.
    pub price: String,
}

impl Default for ListingFieldCodes {
    fn default() -> Self {
        Self {
            reference_number: "ufCrm37ReferenceNumber".to_string(),
            agent_email: "ufCrm37AgentEmail".to_string(),
            owner_name: "ufCrm37ListingOwner".to_string(),
            owner_id: "ufCrm37OwnerId".to_string(),
            price: "ufCrm37Price".to_string(),
        }
    }
}

impl ListingFieldCodes {
    fn validate(&self) -> Result<(), CrmConfigError> {
        for (name, value) in [
            ("listing_fields.reference_number", &self.reference_number),
            ("listing_fields.agent_email", &self.agent_email),
            ("listing_fields.owner_name", &self.owner_name),
            ("listing_fields.owner_id", &self.owner_id),
            ("listing_fields.price", &self.price),
        ] {
            if value.is_empty() {
                return Err(CrmConfigError::EmptyField { field: name });
            }
        }
        Ok(())
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error returned when a [`CrmConfig`] fails validation.
#[derive(Debug, thiserror::Error)]
pub enum CrmConfigError {
    /// A field code or tag that must be non-empty is empty.
    #[error("Configuration field '{field}' must not be empty")]
    EmptyField { field: &'static str },

    /// The reference UTC offset is outside the representable range.
    #[error("Reference UTC offset of {minutes} minutes is out of range")]
    InvalidUtcOffset { minutes: i32 },
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
