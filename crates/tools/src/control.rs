//! Conversation-control tools.
//!
//! Each returns a sentinel [`ToolOutcome`] rather than data. The engine
//! recognizes the outcome variant — not the tool name — so embedders can
//! ship their own equivalents.

use async_trait::async_trait;
use hivelog_core::error::ToolError;
use hivelog_core::tool::{Tool, ToolOutcome};

fn note_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "note": {
                "type": "string",
                "description": "Optional short note recorded with the transition"
            }
        }
    })
}

/// Ends the conversation without marking the task complete.
pub struct EndConversationTool;

#[async_trait]
impl Tool for EndConversationTool {
    fn name(&self) -> &str {
        "end_conversation"
    }

    fn description(&self) -> &str {
        "End this conversation. Use when there is nothing further to do but the task is not formally complete."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        note_schema()
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        Ok(ToolOutcome::Ended)
    }
}

/// Blocks the run until a human appends a user message to the log.
pub struct WaitForHumanTool;

#[async_trait]
impl Tool for WaitForHumanTool {
    fn name(&self) -> &str {
        "wait_for_human"
    }

    fn description(&self) -> &str {
        "Pause and wait for a human to reply. Use when you need input, approval, or clarification before continuing."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        note_schema()
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        Ok(ToolOutcome::WaitingForInput)
    }
}

/// Marks the task complete and stops the run permanently.
pub struct FinishTool;

#[async_trait]
impl Tool for FinishTool {
    fn name(&self) -> &str {
        "finish"
    }

    fn description(&self) -> &str {
        "Declare the task finished. The run stops permanently."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        note_schema()
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        Ok(ToolOutcome::Finished)
    }
}
