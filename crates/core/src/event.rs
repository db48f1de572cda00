//! Agent execution events and lifecycle statuses.
//!
//! The conversation engine emits [`AgentEvent`]s through an
//! [`crate::sink::EventSink`]; the consumer turns them into durable log
//! records. Token events are fine-grained on purpose — the consumer's
//! flush policy decides the record granularity.

use crate::tool::ToolResult;
use serde::{Deserialize, Serialize};

/// Lifecycle status of an agent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// No run has started yet (projection default; never logged).
    NotStarted,
    Running,
    Paused,
    WaitingForInput,
    Finished,
    Archived,
    Error,
    Stopped,
}

impl AgentStatus {
    /// Terminal statuses end a run permanently.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Archived | Self::Stopped)
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotStarted => "not_started",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::WaitingForInput => "waiting_for_input",
            Self::Finished => "finished",
            Self::Archived => "archived",
            Self::Error => "error",
            Self::Stopped => "stopped",
        };
        write!(f, "{s}")
    }
}

/// Events emitted by the conversation engine during a turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Partial ordinary-text token from the model.
    TextToken { text: String },

    /// Partial extended-thinking token.
    ThinkingToken { text: String },

    /// A thinking block opened.
    ThinkingStart,

    /// A thinking block closed (always before the turn's first ordinary
    /// text token).
    ThinkingEnd,

    /// The model requested a tool invocation. `error` is set when the
    /// arguments failed to parse and the tool was not invoked.
    ToolCall {
        id: String,
        name: String,
        args: serde_json::Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// A tool invocation completed (or was synthesized for a failed call).
    ToolResult {
        id: String,
        name: String,
        result: ToolResult,
    },

    /// A lifecycle transition.
    Status {
        status: AgentStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl AgentEvent {
    pub fn status(status: AgentStatus) -> Self {
        Self::Status {
            status,
            message: None,
            reason: None,
        }
    }

    pub fn status_with_message(status: AgentStatus, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: Some(message.into()),
            reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serialization() {
        let json = serde_json::to_string(&AgentStatus::WaitingForInput).unwrap();
        assert_eq!(json, r#""waiting_for_input""#);

        let back: AgentStatus = serde_json::from_str(r#""archived""#).unwrap();
        assert_eq!(back, AgentStatus::Archived);
    }

    #[test]
    fn terminal_statuses() {
        assert!(AgentStatus::Finished.is_terminal());
        assert!(AgentStatus::Archived.is_terminal());
        assert!(AgentStatus::Stopped.is_terminal());
        assert!(!AgentStatus::Running.is_terminal());
        assert!(!AgentStatus::Paused.is_terminal());
        assert!(!AgentStatus::WaitingForInput.is_terminal());
    }

    #[test]
    fn event_serialization_token() {
        let event = AgentEvent::TextToken {
            text: "Hello".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"text_token""#));
        assert!(json.contains(r#""text":"Hello""#));
    }

    #[test]
    fn event_serialization_tool_call_with_error() {
        let event = AgentEvent::ToolCall {
            id: "call_1".into(),
            name: "edit_page".into(),
            args: serde_json::Value::String(r#"{"a": 1,"#.into()),
            error: Some("arguments are not valid JSON".into()),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"tool_call""#));
        assert!(json.contains("not valid JSON"));
    }

    #[test]
    fn event_deserialization() {
        let json = r#"{"type":"thinking_token","text":"hmm"}"#;
        let event: AgentEvent = serde_json::from_str(json).unwrap();
        match event {
            AgentEvent::ThinkingToken { text } => assert_eq!(text, "hmm"),
            _ => panic!("Wrong variant"),
        }
    }
}
