//! Tolerant normalization of inbound agent callbacks.
//!
//! Remote agents return the briefing in several historical shapes: a bare
//! envelope object, a singleton array around it, a JSON-encoded string, or a
//! string fenced in a Markdown code block — sometimes several layers deep.
//! `normalize` reconciles all of them into one canonical [`AgentBriefing`]
//! or rejects definitively with `None`. It never panics and never errors.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// AgentBriefing
// ---------------------------------------------------------------------------

/// Canonical form of an inbound agent callback.
///
/// `payload` is always a JSON object; everything inside it is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentBriefing {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    /// Envelope metadata, passed through as received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    pub payload: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Code-fence handling
// ---------------------------------------------------------------------------

fn strip_code_fence(s: &str) -> &str {
    let mut cleaned = s.trim();
    if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = match rest.get(..4) {
            Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
            _ => rest,
        };
        cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned);
        cleaned = cleaned.trim();
    }
    cleaned
}

fn parse_json_string(value: &str) -> Option<Value> {
    match serde_json::from_str(strip_code_fence(value)) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            tracing::warn!("briefing payload is not valid JSON: {err}");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope coercion
// ---------------------------------------------------------------------------

struct Envelope {
    callback_url: Option<String>,
    meta: Option<Value>,
    payload: Value,
}

/// Recursive descent to the outer envelope. Arrays unwrap to their first
/// element, strings get fence-stripped and parsed, and only objects that
/// declare at least one of the envelope keys are accepted.
fn coerce_envelope(raw: &Value) -> Option<Envelope> {
    match raw {
        Value::Array(items) => coerce_envelope(items.first()?),
        Value::String(s) => coerce_envelope(&parse_json_string(s)?),
        Value::Object(candidate) => {
            if !candidate.contains_key("payload")
                && !candidate.contains_key("callbackUrl")
                && !candidate.contains_key("meta")
            {
                return None;
            }
            Some(Envelope {
                callback_url: candidate
                    .get("callbackUrl")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                meta: candidate.get("meta").filter(|m| !m.is_null()).cloned(),
                // An envelope without an explicit payload key (callbackUrl or
                // meta only) carries the report at its top level.
                payload: match candidate.get("payload") {
                    Some(payload) => payload.clone(),
                    None => Value::Object(candidate.clone()),
                },
            })
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// normalize
// ---------------------------------------------------------------------------

/// Normalize an arbitrary inbound value into an [`AgentBriefing`], or reject
/// with `None` when no object-shaped payload can be recovered.
pub fn normalize(raw: &Value) -> Option<AgentBriefing> {
    let envelope = coerce_envelope(raw)?;
    let mut payload = envelope.payload;

    // The extracted payload may itself be wrapped once more: a singleton
    // array layer and/or a JSON-encoded (possibly fenced) string layer.
    if let Value::Array(items) = payload {
        payload = items.into_iter().next().unwrap_or(Value::Null);
    }
    if let Value::String(s) = &payload {
        payload = parse_json_string(s)?;
    }

    match payload {
        Value::Object(map) => Some(AgentBriefing {
            callback_url: envelope.callback_url,
            meta: envelope.meta,
            payload: map,
        }),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
