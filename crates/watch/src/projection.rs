//! Cached per-agent status projection.
//!
//! A status record overwrites the cached status; any other record updates
//! the "last action" summary and its timestamp. The projection is rebuilt
//! from the log at startup and is only ever a convenience view — readers
//! that need the truth replay the file.

use chrono::{DateTime, Utc};
use hivelog_core::event::AgentStatus;
use hivelog_core::record::{LogRecord, RecordBody};
use serde::Serialize;

const LAST_ACTION_MAX: usize = 80;

/// The cached view of one agent.
#[derive(Debug, Clone, Serialize)]
pub struct AgentProjection {
    pub status: AgentStatus,
    pub last_action: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Default for AgentProjection {
    fn default() -> Self {
        Self {
            status: AgentStatus::NotStarted,
            last_action: None,
            updated_at: Utc::now(),
        }
    }
}

impl AgentProjection {
    /// Fold one record into the projection.
    pub fn apply(&mut self, record: &LogRecord) {
        self.updated_at = record.timestamp;
        match &record.body {
            RecordBody::Status { status, .. } => self.status = *status,
            other => self.last_action = Some(summarize(other)),
        }
    }
}

/// A short human-readable summary of a non-status record.
fn summarize(body: &RecordBody) -> String {
    match body {
        RecordBody::Message { content, .. } => format!("said: {}", clip(content)),
        RecordBody::Thinking { .. } => "thinking".into(),
        RecordBody::ToolCall { tool, error, .. } => match error {
            Some(_) => format!("bad call to {tool}"),
            None => format!("calling {tool}"),
        },
        RecordBody::ToolResult { tool, .. } => format!("result from {tool}"),
        RecordBody::UserMessage { .. } => "user message".into(),
        RecordBody::Error { .. } => "error".into(),
        RecordBody::Status { .. } => unreachable!("status handled by apply"),
    }
}

fn clip(s: &str) -> String {
    let line = s.lines().next().unwrap_or("");
    if line.len() <= LAST_ACTION_MAX {
        return line.to_string();
    }
    let mut end = LAST_ACTION_MAX;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &line[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use hivelog_core::message::Role;

    #[test]
    fn status_overwrites_status() {
        let mut proj = AgentProjection::default();
        assert_eq!(proj.status, AgentStatus::NotStarted);

        proj.apply(&LogRecord::status(AgentStatus::Running, "runner"));
        assert_eq!(proj.status, AgentStatus::Running);

        proj.apply(&LogRecord::status(AgentStatus::Paused, "cli"));
        assert_eq!(proj.status, AgentStatus::Paused);
    }

    #[test]
    fn non_status_updates_last_action_only() {
        let mut proj = AgentProjection::default();
        proj.apply(&LogRecord::status(AgentStatus::Running, "runner"));
        proj.apply(&LogRecord::message(Role::Assistant, "Saving the page now"));

        assert_eq!(proj.status, AgentStatus::Running);
        assert_eq!(proj.last_action.as_deref(), Some("said: Saving the page now"));
    }

    #[test]
    fn tool_call_summary() {
        let mut proj = AgentProjection::default();
        proj.apply(&LogRecord::tool_call(
            "edit_page",
            serde_json::json!({}),
            None,
        ));
        assert_eq!(proj.last_action.as_deref(), Some("calling edit_page"));

        proj.apply(&LogRecord::tool_call(
            "edit_page",
            serde_json::Value::String("{broken".into()),
            Some("not valid JSON".into()),
        ));
        assert_eq!(proj.last_action.as_deref(), Some("bad call to edit_page"));
    }

    #[test]
    fn long_content_is_clipped() {
        let mut proj = AgentProjection::default();
        proj.apply(&LogRecord::message(Role::Assistant, "x".repeat(500)));
        let action = proj.last_action.unwrap();
        assert!(action.len() < 100);
        assert!(action.ends_with('…'));
    }

    #[test]
    fn timestamp_tracks_the_record() {
        let mut proj = AgentProjection::default();
        let record = LogRecord::user_message("hi");
        proj.apply(&record);
        assert_eq!(proj.updated_at, record.timestamp);
    }
}
