//! Tool trait — the abstraction over agent capabilities.
//!
//! Tools are what let the agent act on the world. The runtime itself only
//! ships the conversation-control tools; content-editing tools are
//! registered by the embedding application against this same trait.
//!
//! A tool execution yields a [`ToolOutcome`]: either a normal result or one
//! of three control-flow sentinels (`Ended`, `WaitingForInput`, `Finished`)
//! that the conversation engine recognizes regardless of which tool
//! produced them.

use crate::error::ToolError;
use crate::provider::ToolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A request to execute a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the model's tool_call id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value
    pub arguments: serde_json::Value,
}

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// Whether the tool executed successfully
    pub success: bool,

    /// The output content
    pub output: String,
}

impl ToolResult {
    pub fn ok(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            success: true,
            output: output.into(),
        }
    }

    pub fn error(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            success: false,
            output: output.into(),
        }
    }
}

/// What a tool execution produced.
///
/// The three sentinel variants drive the run state machine: the engine
/// emits the matching status event, appends a canonical tool-result
/// message so the transcript stays API-valid, and ends the turn.
#[derive(Debug, Clone)]
pub enum ToolOutcome {
    /// An ordinary result, surfaced to the model.
    Normal(ToolResult),
    /// The conversation is over; the run stops.
    Ended,
    /// The agent is blocked on a human; the run waits for a user message.
    WaitingForInput,
    /// The agent's task is complete; the run stops permanently.
    Finished,
}

impl ToolOutcome {
    /// Canonical result text appended to history for a sentinel outcome.
    pub fn sentinel_text(&self) -> Option<&'static str> {
        match self {
            Self::Normal(_) => None,
            Self::Ended => Some("Conversation ended."),
            Self::WaitingForInput => Some("Waiting for human input."),
            Self::Finished => Some("Task finished."),
        }
    }
}

/// The core Tool trait.
///
/// Implementations are registered in the [`ToolRegistry`] and made
/// available to the conversation engine by name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "wait_for_human").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools.
///
/// The conversation engine uses this to:
/// 1. Get tool definitions to send to the model
/// 2. Look up schemas when diagnosing malformed arguments
/// 3. Execute tools when the model requests them
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// The parameter schema for a tool, if registered.
    pub fn schema_for(&self, name: &str) -> Option<serde_json::Value> {
        self.tools.get(name).map(|t| t.parameters_schema())
    }

    /// Get all tool definitions (for sending to the model).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// Execute a tool call.
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolOutcome, ToolError> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;
        tool.execute(call.arguments.clone()).await
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
