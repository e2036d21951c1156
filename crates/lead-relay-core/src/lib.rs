//! # Lead-Relay Core
//!
//! Domain logic for the lead-relay webhook adapter: mapping incoming lead
//! payloads from classified-ad portals and call-tracking services into CRM
//! contacts and leads.
//!
//! The crate is organised around the request pipeline:
//!
//! - [`config`] — static CRM mapping configuration (field codes, pipeline and
//!   entity identifiers, fallback assignee), loaded once at startup.
//! - [`crm`] — the outbound CRM REST boundary: the [`CrmClient`] trait, its
//!   reqwest-backed implementation, and a thin typed layer over the raw
//!   `call(method, params)` interface.
//! - [`resolver`] — responsible-person resolution through an ordered chain of
//!   CRM lookups.
//! - [`comments`] — pure formatting of call/lead events into human-readable
//!   CRM timeline comments, including relative timestamp rendering.
//! - [`handlers`] — one [`SourceHandler`] per supported lead source.

pub mod comments;
pub mod config;
pub mod crm;
pub mod handlers;
pub mod resolver;

pub use config::CrmConfig;
pub use crm::{CrmApi, CrmClient, CrmError, CrmResponse, RestCrmClient};
pub use handlers::{HandlerError, LeadOutcome, SourceHandler};
pub use resolver::{ResponsiblePersonResolver, SearchKey};

use serde::{Deserialize, Serialize};

// ============================================================================
// CrmUserId
// ============================================================================

/// Identifier of a CRM user account.
///
/// The CRM's REST API returns user ids inconsistently as JSON numbers or
/// numeric strings depending on the endpoint; [`CrmUserId::from_value`]
/// accepts both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrmUserId(i64);

impl CrmUserId {
    /// Create a user id from a raw integer.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Return the raw integer value.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Parse a user id from a JSON value.
    ///
    /// Accepts integers and numeric strings; anything else yields `None`.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        crm::value_as_i64(value).map(Self)
    }
}

impl std::fmt::Display for CrmUserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for CrmUserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
