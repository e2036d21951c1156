//! Tests for handler outcome messages.

use super::*;

/// Verify the success message for a created lead carries the id.
#[test]
fn test_lead_created_message() {
    let outcome = LeadOutcome::LeadCreated { lead_id: 99 };
    assert_eq!(
        outcome.message(),
        "Lead data processed successfully and lead created with ID: 99"
    );
}

/// Verify the acknowledgment message has no id suffix.
#[test]
fn test_acknowledged_message() {
    assert_eq!(
        LeadOutcome::Acknowledged.message(),
        "Lead data processed successfully"
    );
}
