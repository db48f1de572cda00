//! The durable log record — the one wire format everything shares.
//!
//! An agent's log file holds one JSON record per line, appended and never
//! mutated. File append order is the total order of the run. The same file
//! carries event records (written by the agent's own runner), control
//! records (appended by external controllers), and user messages; the
//! record `type` plus the optional `source` field on status records tells
//! readers which is which.

use crate::event::AgentStatus;
use crate::message::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted, timestamped record in an agent's log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    /// Write-time timestamp.
    pub timestamp: DateTime<Utc>,

    #[serde(flatten)]
    pub body: RecordBody,
}

/// The type-tagged body of a log record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordBody {
    /// A lifecycle transition. Also the control protocol: external
    /// controllers request pause/resume/archive/stop by appending one of
    /// these with the desired status.
    Status {
        status: AgentStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source: Option<String>,
    },

    /// A flushed line of assistant (or other role) text.
    Message { role: Role, content: String },

    /// A flushed line of extended-thinking text.
    Thinking { content: String },

    /// A tool invocation. `error` is set when the arguments were malformed
    /// and the tool was not invoked.
    ToolCall {
        tool: String,
        args: serde_json::Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// A tool invocation's result.
    ToolResult {
        tool: String,
        result: serde_json::Value,
    },

    /// A message from a human, appended externally; consumed by a runner
    /// waiting for input.
    UserMessage { content: String },

    /// An uncaught engine fault that ended the run.
    Error { error: String, traceback: String },
}

impl LogRecord {
    fn now(body: RecordBody) -> Self {
        Self {
            timestamp: Utc::now(),
            body,
        }
    }

    pub fn status(status: AgentStatus, source: impl Into<String>) -> Self {
        Self::now(RecordBody::Status {
            status,
            message: None,
            reason: None,
            source: Some(source.into()),
        })
    }

    pub fn status_with_reason(
        status: AgentStatus,
        reason: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self::now(RecordBody::Status {
            status,
            message: None,
            reason: Some(reason.into()),
            source: Some(source.into()),
        })
    }

    pub fn message(role: Role, content: impl Into<String>) -> Self {
        Self::now(RecordBody::Message {
            role,
            content: content.into(),
        })
    }

    pub fn thinking(content: impl Into<String>) -> Self {
        Self::now(RecordBody::Thinking {
            content: content.into(),
        })
    }

    pub fn tool_call(
        tool: impl Into<String>,
        args: serde_json::Value,
        error: Option<String>,
    ) -> Self {
        Self::now(RecordBody::ToolCall {
            tool: tool.into(),
            args,
            error,
        })
    }

    pub fn tool_result(tool: impl Into<String>, result: serde_json::Value) -> Self {
        Self::now(RecordBody::ToolResult {
            tool: tool.into(),
            result,
        })
    }

    pub fn user_message(content: impl Into<String>) -> Self {
        Self::now(RecordBody::UserMessage {
            content: content.into(),
        })
    }

    pub fn error(error: impl Into<String>, traceback: impl Into<String>) -> Self {
        Self::now(RecordBody::Error {
            error: error.into(),
            traceback: traceback.into(),
        })
    }

    /// The status this record carries, if it is a status record.
    pub fn as_status(&self) -> Option<AgentStatus> {
        match &self.body {
            RecordBody::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
