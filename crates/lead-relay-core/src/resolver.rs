//! Responsible-person resolution.
//!
//! Given a listing reference or a caller phone number, produce the CRM user
//! who should own the resulting lead. Resolution is an ordered fallback
//! chain, not a search: each step either terminates with a result or falls
//! through to the next, and lookup failures degrade to the configured
//! default instead of failing the request.

use crate::config::CrmConfig;
use crate::crm::{CrmApi, CrmError};
use crate::CrmUserId;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

// ============================================================================
// SearchKey
// ============================================================================

/// What to search the CRM by when resolving a responsible person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchKey {
    /// A listing reference number; resolution walks the listing's owner
    /// signals in precedence order.
    Reference(String),

    /// A caller phone number; resolution matches against user mobile numbers.
    Phone(String),
}

// ============================================================================
// ResponsiblePersonResolver
// ============================================================================

/// Resolves lead ownership through a chain of CRM lookups.
///
/// Precedence for [`SearchKey::Reference`]:
/// listing owner id > owner name match > agent email match > configured
/// default. Lookup errors are logged and fall back; they never abort the
/// request.
#[derive(Clone)]
pub struct ResponsiblePersonResolver {
    crm: CrmApi,
    config: Arc<CrmConfig>,
}

impl ResponsiblePersonResolver {
    /// Create a resolver over the given CRM API and mapping configuration.
    pub fn new(crm: CrmApi, config: Arc<CrmConfig>) -> Self {
        Self { crm, config }
    }

    /// Resolve a responsible person for the given search key.
    ///
    /// Returns `None` only when a user lookup legitimately matched nobody
    /// (phone and owner-name searches); every failure path yields the
    /// configured default instead.
    pub async fn resolve(&self, key: &SearchKey) -> Option<CrmUserId> {
        match key {
            SearchKey::Phone(number) => {
                self.find_user_excluding_reserved(json!({ "%PERSONAL_MOBILE": number }))
                    .await
            }
            SearchKey::Reference(reference) => self.resolve_by_reference(reference).await,
        }
    }

    /// Look up the asking price of the listing with the given reference.
    ///
    /// Fail-soft: lookup errors and missing listings yield `None`.
    pub async fn property_price(&self, reference: &str) -> Option<Value> {
        let fields = &self.config.listing_fields;
        let result = self
            .crm
            .list_items(
                self.config.listings_entity_type_id,
                json!({ (fields.reference_number.as_str()): reference }),
                &[fields.price.as_str()],
            )
            .await;

        let items = match result {
            Ok(items) => items,
            Err(error) => {
                warn!(%reference, %error, "Property price lookup failed");
                return None;
            }
        };

        items
            .first()
            .and_then(|listing| listing.get(&fields.price))
            .filter(|price| !price.is_null())
            .cloned()
    }

    async fn resolve_by_reference(&self, reference: &str) -> Option<CrmUserId> {
        let fields = &self.config.listing_fields;

        let result = self
            .crm
            .list_items(
                self.config.listings_entity_type_id,
                json!({ (fields.reference_number.as_str()): reference }),
                &[
                    fields.reference_number.as_str(),
                    fields.agent_email.as_str(),
                    fields.owner_name.as_str(),
                    fields.owner_id.as_str(),
                ],
            )
            .await;

        let listing = match result {
            Ok(items) => match items.into_iter().next() {
                Some(listing) => listing,
                None => {
                    warn!(%reference, "No listing found with reference number");
                    return Some(self.default_id());
                }
            },
            Err(error) => {
                warn!(%reference, %error, "Listing lookup failed");
                return Some(self.default_id());
            }
        };

        // Highest-priority signal: the listing's own owner id.
        if let Some(owner_id) = listing.get(&fields.owner_id).and_then(CrmUserId::from_value) {
            return Some(owner_id);
        }

        // Next: match a user by the owner's display name.
        if let Some(owner_name) = listing
            .get(&fields.owner_name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
        {
            let (first, last) = split_name(owner_name);
            let mut filter = json!({ "%NAME": first });
            if let Some(last) = last {
                filter["%LAST_NAME"] = json!(last);
            }
            return self.find_user_excluding_reserved(filter).await;
        }

        // Last lookup: exact agent email match, defaulting when it misses.
        if let Some(agent_email) = listing
            .get(&fields.agent_email)
            .and_then(Value::as_str)
            .filter(|email| !email.is_empty())
        {
            let found = self
                .find_user_excluding_reserved(json!({ "EMAIL": agent_email }))
                .await;
            return Some(found.unwrap_or_else(|| self.default_id()));
        }

        warn!(%reference, "Listing carries no owner id, owner name, or agent email");
        Some(self.default_id())
    }

    /// Run a user lookup with the reserved system accounts excluded.
    ///
    /// Lookup errors are logged and reported as "no match".
    async fn find_user_excluding_reserved(&self, mut filter: Value) -> Option<CrmUserId> {
        filter["!ID"] = json!(self.config.reserved_user_ids);

        match self.crm.find_user(filter).await {
            Ok(found) => found,
            Err(error) => {
                if let CrmError::Api {
                    description: Some(ref description),
                    ..
                } = error
                {
                    warn!(%error, description = %description, "User lookup failed");
                } else {
                    warn!(%error, "User lookup failed");
                }
                None
            }
        }
    }

    fn default_id(&self) -> CrmUserId {
        self.config.default_responsible_person()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Split a display name into its first token and the remainder.
///
/// The split happens at the first whitespace only: `"Jane Mary Doe"` becomes
/// `("Jane", Some("Mary Doe"))`.
pub(crate) fn split_name(name: &str) -> (&str, Option<&str>) {
    let trimmed = name.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, Some(rest.trim_start())),
        None => (trimmed, None),
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
