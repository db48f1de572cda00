//! ChatProvider trait — the abstraction over streaming LLM backends.
//!
//! A provider turns a message list plus tool schema into a stream of
//! chunks. A chunk carries *either* ordinary text *or* thinking text
//! (never both), plus any indexed tool-call fragments; the conversation
//! engine is responsible for accumulating fragments into complete calls.

use crate::error::ProviderError;
use crate::message::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Configuration for a provider request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The model to use (e.g., "claude-sonnet-4-20250514")
    pub model: String,

    /// The conversation messages
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Available tools the model can call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

fn default_temperature() -> f32 {
    0.7
}

/// A tool definition sent to the model so it knows what tools it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A fragment of a streamed tool call.
///
/// Providers emit one delta with `id`/`name` set when a call opens at a
/// given index, then argument-text fragments for that index until the call
/// is structurally complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallDelta {
    /// Position of this call within the response, stable across fragments.
    pub index: usize,

    /// The call ID, present on the opening fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The tool name, present on the opening fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// A fragment of the JSON argument text.
    #[serde(default)]
    pub arguments: String,
}

/// A single chunk in a streaming response.
///
/// Invariant: `text` and `thinking` are never both set in one chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Partial ordinary-text delta
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Partial extended-thinking delta
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,

    /// Tool-call fragments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_deltas: Vec<ToolCallDelta>,

    /// Whether this is the final chunk
    #[serde(default)]
    pub done: bool,

    /// Usage info (typically only near the end of the stream)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl StreamChunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn thinking(text: impl Into<String>) -> Self {
        Self {
            thinking: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn done() -> Self {
        Self {
            done: true,
            ..Self::default()
        }
    }
}

/// The core streaming-LLM trait.
///
/// The conversation engine calls `stream()` without knowing which backend
/// is configured. Chunks arrive over a bounded channel; reading slowly is
/// the caller's way of pacing the turn.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// A human-readable name for this provider (e.g., "anthropic").
    fn name(&self) -> &str;

    /// Send a request and get a stream of response chunks.
    async fn stream(
        &self,
        request: ChatRequest,
    ) -> Result<tokio::sync::mpsc::Receiver<Result<StreamChunk, ProviderError>>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_constructors_are_exclusive() {
        let t = StreamChunk::text("hi");
        assert!(t.text.is_some() && t.thinking.is_none());

        let th = StreamChunk::thinking("hmm");
        assert!(th.thinking.is_some() && th.text.is_none());

        let d = StreamChunk::done();
        assert!(d.done && d.text.is_none() && d.thinking.is_none());
    }

    #[test]
    fn tool_definition_serialization() {
        let tool = ToolDefinition {
            name: "wait_for_human".into(),
            description: "Pause until a human replies".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "note": { "type": "string", "description": "Why input is needed" }
                }
            }),
        };
        let json = serde_json::to_string(&tool).unwrap();
        assert!(json.contains("wait_for_human"));
        assert!(json.contains("note"));
    }

    #[test]
    fn tool_delta_opening_fragment() {
        let delta = ToolCallDelta {
            index: 0,
            id: Some("toolu_1".into()),
            name: Some("edit_page".into()),
            arguments: String::new(),
        };
        let json = serde_json::to_string(&delta).unwrap();
        let back: ToolCallDelta = serde_json::from_str(&json).unwrap();
        assert_eq!(back.index, 0);
        assert_eq!(back.name.as_deref(), Some("edit_page"));
    }
}
