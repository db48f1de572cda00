//! Message and Conversation domain types.
//!
//! These are the value objects the conversation engine operates on: the
//! model API consumes a `Vec<Message>` and produces an assistant message,
//! possibly carrying tool calls. The pairing invariant — every assistant
//! message with tool calls is immediately followed, in call order, by one
//! tool message per call id — is what the repair pass in the agent crate
//! enforces before every model call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
    /// System instructions (identity, rules)
    System,
    /// Tool execution result
    Tool,
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Extended-thinking text produced alongside the content, if any.
    /// Never sent back to the model; kept for the durable record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a tool result message.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        let mut msg = Self::new(Role::Tool, content);
        msg.tool_call_id = Some(tool_call_id.into());
        msg
    }

    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            thinking: None,
            tool_calls: Vec::new(),
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Character count of everything this message contributes to the
    /// model context: content, thinking, and tool-call argument text.
    pub fn char_count(&self) -> usize {
        self.content.len()
            + self.thinking.as_deref().map_or(0, str::len)
            + self
                .tool_calls
                .iter()
                .map(|tc| tc.name.len() + tc.arguments.len())
                .sum::<usize>()
    }
}

/// A tool call embedded in an assistant message.
///
/// Arguments are kept as the raw JSON text the model produced; parsing is
/// deferred to execution time so a malformed payload can be diagnosed
/// instead of rejected upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageToolCall {
    /// Unique ID for this tool call (unique within a turn)
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as a JSON string
    pub arguments: String,
}

/// A conversation is an ordered sequence of messages with shared context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Ordered messages
    pub messages: Vec<Message>,

    /// When this conversation was created
    pub created_at: DateTime<Utc>,

    /// When the last message was added
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new empty conversation.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Add a message to the conversation.
    pub fn push(&mut self, message: Message) {
        self.updated_at = Utc::now();
        self.messages.push(message);
    }

    /// Total size in characters — the measure the context budget is
    /// enforced against.
    pub fn total_chars(&self) -> usize {
        self.messages.iter().map(Message::char_count).sum()
    }

    /// Rough token estimate (4 chars ≈ 1 token), used when the provider
    /// omits usage for a streamed turn.
    pub fn estimated_tokens(&self) -> usize {
        self.total_chars() / 4
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
