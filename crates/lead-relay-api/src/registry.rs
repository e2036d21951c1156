//! Lead-source identification and handler registry.
//!
//! Incoming requests name their source through the `lead_type` query
//! parameter. The parameter parses into the closed [`LeadSource`] enum, and
//! a [`HandlerRegistry`] maps each source to its [`SourceHandler`]. The
//! registry is built once at startup and used read-only during request
//! handling; dispatch is by tagged variant, never by string-to-method
//! reflection.

use lead_relay_core::SourceHandler;
use std::{collections::HashMap, str::FromStr, sync::Arc};

// ============================================================================
// LeadSource
// ============================================================================

/// The closed set of supported lead sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeadSource {
    /// WhatsApp enquiries relayed by the bayut portal.
    BayutWhatsapp,

    /// WhatsApp enquiries relayed by the dubizzle portal.
    DubizzleWhatsapp,
}

impl LeadSource {
    /// Every supported source, for startup registration loops.
    pub const ALL: [LeadSource; 2] = [LeadSource::BayutWhatsapp, LeadSource::DubizzleWhatsapp];

    /// The wire name used in the `lead_type` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BayutWhatsapp => "bayut-whatsapp",
            Self::DubizzleWhatsapp => "dubizzle-whatsapp",
        }
    }
}

impl FromStr for LeadSource {
    type Err = UnknownLeadSourceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "bayut-whatsapp" => Ok(Self::BayutWhatsapp),
            "dubizzle-whatsapp" => Ok(Self::DubizzleWhatsapp),
            other => Err(UnknownLeadSourceError {
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for LeadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a `lead_type` value names no supported source.
#[derive(Debug, thiserror::Error)]
#[error("Unknown lead source '{value}'")]
pub struct UnknownLeadSourceError {
    /// The rejected wire value.
    pub value: String,
}

// ============================================================================
// HandlerRegistry
// ============================================================================

/// Registry mapping lead sources to their handlers.
///
/// Built once at service startup; request handling only reads it. Handlers
/// are stored as `Arc<dyn SourceHandler>` so the registry clones cheaply
/// into the shared application state.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<LeadSource, Arc<dyn SourceHandler>>,
}

impl HandlerRegistry {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for a source, replacing any previous registration.
    pub fn register(&mut self, source: LeadSource, handler: Arc<dyn SourceHandler>) -> &mut Self {
        self.handlers.insert(source, handler);
        self
    }

    /// Look up the handler bound to a source.
    pub fn get(&self, source: LeadSource) -> Option<Arc<dyn SourceHandler>> {
        self.handlers.get(&source).cloned()
    }

    /// Check whether a source has a registered handler.
    pub fn contains(&self, source: LeadSource) -> bool {
        self.handlers.contains_key(&source)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
