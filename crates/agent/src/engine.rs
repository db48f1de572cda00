//! The turn engine.
//!
//! Drives one model turn at a time over an owned conversation. The caller
//! (normally an agent runner) invokes [`TurnEngine::run_turn`] repeatedly,
//! checking control signals between turns; each call streams one model
//! response, executes its tool calls in order, and reports how the turn
//! ended.

use crate::repair::{normalize_payload, repair_history};
use hivelog_core::error::EngineError;
use hivelog_core::event::{AgentEvent, AgentStatus};
use hivelog_core::message::{Conversation, Message, MessageToolCall};
use hivelog_core::provider::{ChatProvider, ChatRequest, Usage};
use hivelog_core::sink::EventSink;
use hivelog_core::tool::{ToolCall, ToolOutcome, ToolRegistry, ToolResult};
use hivelog_telemetry::PricingTable;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Hard ceiling on conversation size, in characters. Checked before every
/// model call; exceeding it is fatal to the run.
pub const CONTEXT_CHAR_LIMIT: usize = 300_000;

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    /// An ordinary turn; the next one can start.
    Completed,
    /// A tool ended the conversation (terminal).
    Ended,
    /// A tool requested human input; no fresh turn until a user message
    /// arrives.
    WaitingForInput,
    /// A tool declared the task finished (terminal).
    Finished,
}

/// Cumulative usage and cost for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub cost_usd: f64,
}

impl RunUsage {
    /// The increment from `earlier` to `self` — what a consumer reports
    /// to the cost aggregator so nothing is double-counted.
    pub fn delta_since(&self, earlier: &RunUsage) -> RunUsage {
        RunUsage {
            prompt_tokens: self.prompt_tokens.saturating_sub(earlier.prompt_tokens),
            completion_tokens: self
                .completion_tokens
                .saturating_sub(earlier.completion_tokens),
            cost_usd: (self.cost_usd - earlier.cost_usd).max(0.0),
        }
    }
}

/// A tool call being assembled from streamed fragments.
#[derive(Debug, Default)]
struct PendingCall {
    id: String,
    name: String,
    arguments: String,
}

/// The conversation engine for one agent run.
pub struct TurnEngine {
    provider: Arc<dyn ChatProvider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    tools: Arc<ToolRegistry>,
    pricing: Arc<PricingTable>,
    conversation: Conversation,
    usage: RunUsage,
    turns: u32,
}

impl TurnEngine {
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            tools,
            pricing: Arc::new(PricingTable::with_defaults()),
            conversation: Conversation::new(),
            usage: RunUsage::default(),
            turns: 0,
        }
    }

    /// Set the system prompt (inserted as the first message).
    pub fn with_system(mut self, prompt: impl Into<String>) -> Self {
        self.conversation.push(Message::system(prompt));
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_pricing(mut self, pricing: Arc<PricingTable>) -> Self {
        self.pricing = pricing;
        self
    }

    /// Seed the next turn with a user message.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.conversation.push(Message::user(content));
    }

    /// The conversation so far.
    pub fn history(&self) -> &[Message] {
        &self.conversation.messages
    }

    /// Cumulative usage and cost across all turns.
    pub fn usage(&self) -> RunUsage {
        self.usage
    }

    /// Number of turns run so far.
    pub fn turns(&self) -> u32 {
        self.turns
    }

    /// Run one turn, emitting events into `sink`.
    pub async fn run_turn<S: EventSink>(
        &mut self,
        sink: &mut S,
    ) -> Result<TurnStatus, EngineError> {
        // 1. Context budget — checked before any model call.
        let prompt_chars = self.conversation.total_chars();
        if prompt_chars > CONTEXT_CHAR_LIMIT {
            return Err(EngineError::ContextExceeded {
                chars: prompt_chars,
                limit: CONTEXT_CHAR_LIMIT,
            });
        }

        // 2. The upstream API rejects unpaired tool calls; repair first.
        self.conversation.messages = repair_history(&self.conversation.messages);

        // 3. Stream the model call.
        let request = ChatRequest {
            model: self.model.clone(),
            messages: self.conversation.messages.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: self.tools.definitions(),
        };
        let mut rx = self.provider.stream(request).await?;

        let mut text_buf = String::new();
        let mut thinking_buf = String::new();
        let mut in_thinking = false;
        let mut thinking_closed = false;
        let mut pending: BTreeMap<usize, PendingCall> = BTreeMap::new();
        let mut provider_usage: Option<Usage> = None;

        while let Some(chunk) = rx.recv().await {
            let chunk = chunk.map_err(EngineError::Provider)?;

            if let Some(delta) = chunk.thinking {
                if thinking_closed {
                    warn!("Thinking delta after the thinking block closed; ignoring");
                } else {
                    if !in_thinking {
                        emit(sink, AgentEvent::ThinkingStart).await?;
                        in_thinking = true;
                    }
                    thinking_buf.push_str(&delta);
                    emit(sink, AgentEvent::ThinkingToken { text: delta }).await?;
                }
            }

            if let Some(delta) = chunk.text {
                // The thinking block closes before the first ordinary token.
                if in_thinking {
                    emit(sink, AgentEvent::ThinkingEnd).await?;
                    in_thinking = false;
                    thinking_closed = true;
                }
                text_buf.push_str(&delta);
                emit(sink, AgentEvent::TextToken { text: delta }).await?;
            }

            for delta in chunk.tool_deltas {
                let entry = pending.entry(delta.index).or_default();
                if let Some(id) = delta.id {
                    entry.id = id;
                }
                if let Some(name) = delta.name {
                    entry.name = name;
                }
                entry.arguments.push_str(&delta.arguments);
            }

            if let Some(usage) = chunk.usage {
                provider_usage = Some(usage);
            }
            if chunk.done {
                break;
            }
        }

        if in_thinking {
            emit(sink, AgentEvent::ThinkingEnd).await?;
        }

        // 4. Append the assistant message.
        let tool_calls: Vec<MessageToolCall> = pending
            .into_values()
            .map(|mut p| {
                if p.id.is_empty() {
                    p.id = Uuid::new_v4().to_string();
                }
                MessageToolCall {
                    id: p.id,
                    name: p.name,
                    arguments: p.arguments,
                }
            })
            .collect();

        let mut assistant = Message::assistant(text_buf.clone());
        if !thinking_buf.is_empty() {
            assistant.thinking = Some(thinking_buf.clone());
        }
        assistant.tool_calls = tool_calls.clone();
        self.conversation.push(assistant);

        // 5. Usage and cost for this turn.
        self.record_usage(provider_usage, prompt_chars, &text_buf, &thinking_buf, &tool_calls);

        // 6. Execute the tool calls strictly in emission order.
        for call in &tool_calls {
            if let Some(turn_status) = self.run_tool_call(sink, call).await? {
                return Ok(turn_status);
            }
        }

        // 7. Keep the transcript structurally valid for the next turn.
        if self
            .conversation
            .messages
            .last()
            .is_none_or(|m| m.role != hivelog_core::message::Role::User)
        {
            self.conversation.push(Message::user("continue"));
        }

        Ok(TurnStatus::Completed)
    }

    /// Execute one tool call. Returns `Some(status)` when a sentinel
    /// outcome ends the turn.
    async fn run_tool_call<S: EventSink>(
        &mut self,
        sink: &mut S,
        call: &MessageToolCall,
    ) -> Result<Option<TurnStatus>, EngineError> {
        let raw = if call.arguments.trim().is_empty() {
            "{}"
        } else {
            call.arguments.as_str()
        };

        let args = match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(args) => args,
            Err(parse_err) => {
                // Malformed arguments: diagnose, never invoke.
                let diagnostic = diagnose_arguments(
                    &call.name,
                    raw,
                    &parse_err,
                    self.tools.schema_for(&call.name),
                );
                warn!(tool = %call.name, %diagnostic, "Tool call arguments failed to parse");

                emit(
                    sink,
                    AgentEvent::ToolCall {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        args: serde_json::Value::String(call.arguments.clone()),
                        error: Some(diagnostic.clone()),
                    },
                )
                .await?;

                let result = ToolResult::error(&call.id, diagnostic);
                emit(
                    sink,
                    AgentEvent::ToolResult {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        result: result.clone(),
                    },
                )
                .await?;
                self.push_result_message(&call.id, &result.output);
                return Ok(None);
            }
        };

        emit(
            sink,
            AgentEvent::ToolCall {
                id: call.id.clone(),
                name: call.name.clone(),
                args: args.clone(),
                error: None,
            },
        )
        .await?;

        let invocation = ToolCall {
            id: call.id.clone(),
            name: call.name.clone(),
            arguments: args,
        };

        let outcome = match self.tools.execute(&invocation).await {
            Ok(outcome) => outcome,
            Err(e) => {
                // Tool failures go back to the model, not up the stack.
                warn!(tool = %call.name, error = %e, "Tool execution failed");
                ToolOutcome::Normal(ToolResult::error(
                    &call.id,
                    serde_json::json!({ "error": e.to_string() }).to_string(),
                ))
            }
        };

        match outcome {
            ToolOutcome::Normal(mut result) => {
                result.call_id = call.id.clone();
                emit(
                    sink,
                    AgentEvent::ToolResult {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        result: result.clone(),
                    },
                )
                .await?;
                self.push_result_message(&call.id, &result.output);
                Ok(None)
            }
            sentinel => {
                let text = sentinel
                    .sentinel_text()
                    .expect("non-normal outcome has sentinel text");
                let result = ToolResult::ok(&call.id, text);
                emit(
                    sink,
                    AgentEvent::ToolResult {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        result,
                    },
                )
                .await?;
                // Keep the transcript API-valid even though the turn ends
                // here.
                self.push_result_message(&call.id, text);

                let (status, turn_status, message) = match sentinel {
                    ToolOutcome::Ended => {
                        (AgentStatus::Stopped, TurnStatus::Ended, "conversation ended")
                    }
                    ToolOutcome::WaitingForInput => (
                        AgentStatus::WaitingForInput,
                        TurnStatus::WaitingForInput,
                        "waiting for human input",
                    ),
                    ToolOutcome::Finished => {
                        (AgentStatus::Finished, TurnStatus::Finished, "task finished")
                    }
                    ToolOutcome::Normal(_) => unreachable!(),
                };
                emit(sink, AgentEvent::status_with_message(status, message)).await?;
                debug!(tool = %call.name, ?turn_status, "Sentinel tool outcome ended the turn");
                Ok(Some(turn_status))
            }
        }
    }

    fn push_result_message(&mut self, call_id: &str, output: &str) {
        self.conversation
            .push(Message::tool_result(call_id, normalize_payload(output)));
    }

    fn record_usage(
        &mut self,
        provider_usage: Option<Usage>,
        prompt_chars: usize,
        text: &str,
        thinking: &str,
        tool_calls: &[MessageToolCall],
    ) {
        let usage = provider_usage.unwrap_or_else(|| {
            // Streaming responses do not always report usage; approximate
            // at 4 chars per token.
            let completion_chars = text.len()
                + thinking.len()
                + tool_calls
                    .iter()
                    .map(|c| c.name.len() + c.arguments.len())
                    .sum::<usize>();
            let prompt_tokens = (prompt_chars / 4) as u32;
            let completion_tokens = (completion_chars / 4) as u32;
            Usage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            }
        });

        let cost =
            self.pricing
                .compute_cost(&self.model, usage.prompt_tokens, usage.completion_tokens);
        self.usage.prompt_tokens += usage.prompt_tokens as u64;
        self.usage.completion_tokens += usage.completion_tokens as u64;
        self.usage.cost_usd += cost;
        self.turns += 1;
    }
}

async fn emit<S: EventSink>(sink: &mut S, event: AgentEvent) -> Result<(), EngineError> {
    sink.emit(event)
        .await
        .map_err(|e| EngineError::Sink(e.to_string()))
}

/// Build the diagnostic for an argument payload that failed to parse:
/// the parse error, the tool's required parameters from its schema, and
/// whether the text looks cut off.
fn diagnose_arguments(
    tool: &str,
    raw: &str,
    err: &serde_json::Error,
    schema: Option<serde_json::Value>,
) -> String {
    let mut msg = format!("Arguments for tool '{tool}' are not valid JSON ({err}).");

    if let Some(schema) = schema {
        let required: Vec<String> = schema
            .get("required")
            .and_then(|r| r.as_array())
            .map(|names| {
                names
                    .iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();
        if !required.is_empty() {
            msg.push_str(&format!(" Required parameters: {}.", required.join(", ")));
        }
    } else {
        msg.push_str(" No schema is registered for this tool.");
    }

    if looks_truncated(raw) {
        msg.push_str(
            " The argument text looks truncated (unclosed brace, bracket, or string).",
        );
    }
    msg
}

/// Heuristic: does this JSON fragment end mid-structure?
fn looks_truncated(raw: &str) -> bool {
    let mut depth = 0i32;
    let mut in_str = false;
    let mut escape = false;

    for c in raw.chars() {
        if escape {
            escape = false;
            continue;
        }
        match c {
            '\\' if in_str => escape = true,
            '"' => in_str = !in_str,
            '{' | '[' if !in_str => depth += 1,
            '}' | ']' if !in_str => depth -= 1,
            _ => {}
        }
    }

    if in_str || depth > 0 {
        return true;
    }
    matches!(raw.trim_end().chars().last(), Some(',') | Some(':'))
}
