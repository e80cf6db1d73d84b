//! Runtime stream payload handling for the HTTP gateway.
//!
//! The runtime answers with server-sent events. Only the assistant text is
//! forwarded; every other event is dropped.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

/// Header carrying the runtime session id.
pub const RUNTIME_SESSION_HEADER: &str = "X-Amzn-Bedrock-AgentCore-Runtime-Session-Id";

/// Content type of a streamed response.
pub const EVENT_STREAM: &str = "text/event-stream";

static LEGACY_DATA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"'data':\s*'([^']*)'").expect("invalid legacy payload regex")
});

/// Namespace for deriving runtime session ids.
const SESSION_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a4e_9b3d_4c7a_8e21_f0d4_5a6b_7c8d);

/// Whether a response content type carries an event stream.
pub fn is_event_stream(content_type: &str) -> bool {
    content_type.contains(EVENT_STREAM)
}

/// Text carried by an SSE `data` payload.
///
/// Accepts a JSON object with a string `data` field, or the legacy
/// `'data': '...'` single-quoted form. Anything else yields `None`.
pub fn payload_text(payload: &str) -> Option<String> {
    let payload = payload.trim();
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(payload) {
        return match map.get("data") {
            Some(Value::String(text)) => Some(text.clone()),
            _ => None,
        };
    }
    // The runtime may wrap a Python-style dict in a JSON string.
    if let Ok(Value::String(inner)) = serde_json::from_str::<Value>(payload) {
        return LEGACY_DATA.captures(&inner).map(|c| c[1].to_string());
    }
    LEGACY_DATA.captures(payload).map(|c| c[1].to_string())
}

/// Runtime session id for an (actor, session) pair.
///
/// Deterministic UUID v5; the runtime requires at least 33 characters.
pub fn runtime_session_id(actor_id: &str, session_id: &str) -> String {
    Uuid::new_v5(&SESSION_NAMESPACE, format!("{actor_id}/{session_id}").as_bytes()).to_string()
}
