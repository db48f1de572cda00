//! Transcript repair.
//!
//! Model APIs reject a transcript in which an assistant tool call is not
//! immediately followed by its result. Agents accumulate history across
//! many turns, sentinel-terminated turns can leave calls unanswered, and
//! results can be lost — so the engine repairs defensively before every
//! call. Repair is idempotent: running it on an already-valid transcript
//! is a no-op.
//!
//! Repaired guarantees:
//! - every assistant message with tool calls is immediately followed, in
//!   call order, by exactly one tool message per call id;
//! - missing results are synthesized as placeholder errors, orphaned
//!   results are dropped (both with a warning);
//! - every tool-result payload is non-empty, capped at
//!   [`RESULT_SIZE_CAP`] with a truncation marker, and representable as
//!   structured data (plain text gets a minimal JSON envelope).

use hivelog_core::message::{Message, Role};
use tracing::warn;

/// Upper bound on a tool-result payload, in bytes (~100KB).
pub const RESULT_SIZE_CAP: usize = 100_000;

/// Marker appended to a payload cut at the size cap.
pub const TRUNCATION_MARKER: &str = "...[truncated]";

/// Payload substituted for an empty tool result.
pub const EMPTY_RESULT_PLACEHOLDER: &str = r#"{"error":"empty tool result"}"#;

/// Payload synthesized for a tool call whose result is missing.
pub const MISSING_RESULT_PLACEHOLDER: &str = r#"{"error":"tool call produced no result"}"#;

/// Repair a message list so it satisfies the pairing invariant.
pub fn repair_history(messages: &[Message]) -> Vec<Message> {
    let mut out = Vec::with_capacity(messages.len());
    let mut consumed = vec![false; messages.len()];

    for (i, msg) in messages.iter().enumerate() {
        if msg.role == Role::Tool {
            if !consumed[i] {
                warn!(
                    tool_call_id = msg.tool_call_id.as_deref().unwrap_or(""),
                    "Dropping orphaned tool result with no matching call"
                );
            }
            // Tool messages are only ever emitted via their calls.
            continue;
        }

        out.push(msg.clone());

        if msg.role == Role::Assistant && !msg.tool_calls.is_empty() {
            for call in &msg.tool_calls {
                // Search forward for the first unconsumed matching result.
                let found = messages
                    .iter()
                    .enumerate()
                    .skip(i + 1)
                    .find(|(j, m)| {
                        !consumed[*j]
                            && m.role == Role::Tool
                            && m.tool_call_id.as_deref() == Some(call.id.as_str())
                    })
                    .map(|(j, _)| j);

                match found {
                    Some(j) => {
                        consumed[j] = true;
                        let mut result = messages[j].clone();
                        result.content = normalize_payload(&result.content);
                        out.push(result);
                    }
                    None => {
                        warn!(
                            call_id = %call.id,
                            tool = %call.name,
                            "Synthesizing placeholder for missing tool result"
                        );
                        out.push(Message::tool_result(&call.id, MISSING_RESULT_PLACEHOLDER));
                    }
                }
            }
        }
    }

    out
}

/// Normalize a tool-result payload: non-empty, size-capped, and
/// representable as structured data.
pub fn normalize_payload(content: &str) -> String {
    if content.trim().is_empty() {
        return EMPTY_RESULT_PLACEHOLDER.to_string();
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(content) {
        if content.len() <= RESULT_SIZE_CAP {
            return content.to_string();
        }
        // Our own envelope is left alone even when its serialized form is
        // longer than the cap (escaping can inflate it); the cap applies
        // to the inner text.
        if let Some(text) = envelope_text(&value)
            && text.len() <= RESULT_SIZE_CAP
        {
            return content.to_string();
        }
    }

    let budget = RESULT_SIZE_CAP - TRUNCATION_MARKER.len();
    let truncated = truncate_chars(content, budget);
    let text = if truncated.len() < content.len() {
        format!("{truncated}{TRUNCATION_MARKER}")
    } else {
        truncated.to_string()
    };

    serde_json::json!({ "text": text }).to_string()
}

/// The inner text of a `{"text": ...}` envelope, if that is what this is.
fn envelope_text(value: &serde_json::Value) -> Option<&str> {
    let obj = value.as_object()?;
    if obj.len() != 1 {
        return None;
    }
    obj.get("text")?.as_str()
}

/// Cut a string to at most `max` bytes without splitting a char.
fn truncate_chars(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
