//! Human-readable comment formatting for call and lead events.
//!
//! Call-tracking webhooks deliver richly nested JSON; the CRM timeline wants
//! plain text. The functions here are pure transforms: "now" and the
//! reference timezone are parameters, never read from the ambient clock, so
//! rendering is fully deterministic under test.
//!
//! Timestamps render relative to the reference timezone's calendar day:
//! `"Today at 03:04 PM"`, `"Yesterday at 03:04 PM"`, or the full date for
//! anything older. Day boundaries are timezone-local, not UTC.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde_json::Value;

// ============================================================================
// Event comment formatting
// ============================================================================

/// Render a call or lead event into a multi-section comment.
///
/// `lead_created` events use the lead layout; SMS and AI-transcription
/// events carry no renderable data and produce a fixed notice. Everything
/// else renders the call layout, with optional sections present only when
/// their source fields exist.
pub fn format_comments(event: &Value, now: DateTime<Utc>, tz: FixedOffset) -> String {
    if text_field(event, "/type") == "lead_created" {
        return format_lead_comments(event, now, tz);
    }

    let event_type = text_field(event, "/eventType");

    if event_type == "smsEvent" {
        return "No data available for SMS events.".to_string();
    }
    if event_type == "aiTranscriptionSummary" {
        return "No data available for AI transcription summary.".to_string();
    }

    let mut output = Vec::new();

    output.push("=== Call Information ===".to_string());
    output.push(format!("Call ID: {}", text_field(event, "/callId")));
    output.push(format!("Call Type: {}", text_field(event, "/type")));
    output.push(format!("Event Type: {event_type}"));
    if let Some(record_url) = present(event, "/recordName") {
        output.push(format!("Call Recording URL: {}", display(record_url)));
    }
    output.push(String::new());

    output.push("=== Client Details ===".to_string());
    output.push(format!("Client Phone: {}", text_field(event, "/clientPhone")));
    output.push(format!("Line Number: {}", text_field(event, "/lineNumber")));
    output.push(String::new());

    output.push("=== Agent Details ===".to_string());
    output.push(format!("User ID: {}", text_field(event, "/userId")));
    if let Some(agent_id) = present(event, "/agentId") {
        output.push(format!("Agent ID: {}", display(agent_id)));
    }
    if let Some(agent_name) = present(event, "/agentName") {
        output.push(format!("Agent Name: {}", display(agent_name)));
    }
    if let Some(agent_email) = present(event, "/agentEmail") {
        output.push(format!("Agent Email: {}", display(agent_email)));
    }
    output.push(String::new());

    output.push("=== Call Timing ===".to_string());
    if event_type == "callEnded" {
        output.push(format!(
            "Call Start Time: {}",
            humanize_ms_field(event, "/startTimestampMs", now, tz)
        ));
        if present(event, "/answerTimestampMs").is_some() {
            output.push(format!(
                "Call Answer Time: {}",
                humanize_ms_field(event, "/answerTimestampMs", now, tz)
            ));
        }
        output.push(format!(
            "Call End Time: {}",
            humanize_ms_field(event, "/endTimestampMs", now, tz)
        ));
    } else {
        output.push(format!(
            "Call Start Time: {}",
            humanize_ms_field(event, "/timestampMs", now, tz)
        ));
    }

    if event_type == "webphoneSummary" {
        output.push(String::new());
        output.push("=== Lead Details ===".to_string());
        output.push(format!("Goal: {}", text_field(event, "/goal")));
        output.push(format!("Goal Type: {}", text_field(event, "/goalType")));
    }

    output.join("\n")
}

fn format_lead_comments(event: &Value, now: DateTime<Utc>, tz: FixedOffset) -> String {
    let mut output = Vec::new();

    output.push("=== Lead Information ===".to_string());
    output.push(format!("Call ID: {}", text_field(event, "/call_id")));
    output.push(format!("Event Type: {}", text_field(event, "/type")));
    output.push(format!("Lead ID: {}", text_field(event, "/lead/lead_id")));
    output.push(format!(
        "Lead Source: {}",
        text_field(event, "/lead/custom_params/api_source")
    ));
    output.push(String::new());

    output.push("=== Client Details ===".to_string());
    output.push(format!(
        "Client Name: {}",
        text_field(event, "/lead/custom_params/lc_param_name")
    ));
    output.push(format!(
        "Client Phone: {}",
        text_field(event, "/lead/lead_phone")
    ));
    output.push(format!(
        "Client Email: {}",
        text_field(event, "/lead/custom_params/lc_param_email").to_lowercase()
    ));
    output.push(String::new());

    output.push("=== Lead Timing ===".to_string());
    output.push(format!(
        "Created Time: {}",
        humanize_iso(&text_field(event, "/lead/time_created_iso_string"), now, tz)
    ));

    output.join("\n")
}

// ============================================================================
// Timestamp humanization
// ============================================================================

/// Render an epoch-milliseconds timestamp relative to `now`.
///
/// Same reference-timezone calendar day → `"Today at hh:mm AM/PM"`; the day
/// before → `"Yesterday at ..."`; otherwise the full date.
pub fn humanize_ms(ts_ms: i64, now: DateTime<Utc>, tz: FixedOffset) -> String {
    let Some(instant) = DateTime::<Utc>::from_timestamp_millis(ts_ms) else {
        return ts_ms.to_string();
    };

    let local = instant.with_timezone(&tz);
    let local_now = now.with_timezone(&tz);
    let time = local.format("%I:%M %p");

    if local.date_naive() == local_now.date_naive() {
        format!("Today at {time}")
    } else if local.date_naive() == (local_now - Duration::days(1)).date_naive() {
        format!("Yesterday at {time}")
    } else {
        local.format("%B %-d, %Y at %I:%M %p").to_string()
    }
}

/// Render an RFC 3339 timestamp relative to `now`.
///
/// Unparseable input is returned verbatim rather than dropped, so the
/// comment still shows whatever the source sent.
pub fn humanize_iso(iso: &str, now: DateTime<Utc>, tz: FixedOffset) -> String {
    match DateTime::parse_from_rfc3339(iso) {
        Ok(instant) => humanize_ms(instant.timestamp_millis(), now, tz),
        Err(_) => iso.to_string(),
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Read a field by JSON pointer, rendered as display text ("" when absent).
fn text_field(event: &Value, pointer: &str) -> String {
    event.pointer(pointer).map(display).unwrap_or_default()
}

/// Read an optional field; `null` counts as absent.
fn present<'a>(event: &'a Value, pointer: &str) -> Option<&'a Value> {
    event.pointer(pointer).filter(|value| !value.is_null())
}

fn humanize_ms_field(
    event: &Value,
    pointer: &str,
    now: DateTime<Utc>,
    tz: FixedOffset,
) -> String {
    event
        .pointer(pointer)
        .and_then(Value::as_i64)
        .map(|ts_ms| humanize_ms(ts_ms, now, tz))
        .unwrap_or_default()
}

/// Render a JSON scalar the way it should appear in comment text.
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "comments_tests.rs"]
mod tests;
