//! # Hivelog Core
//!
//! Domain types, traits, and error definitions for the Hivelog agent runtime.
//! This crate has **zero framework dependencies** — it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)
//!
//! The one domain constant worth calling out: an agent's entire observable
//! life is a sequence of [`record::LogRecord`]s appended to a single file.
//! Everything else — status projections, live feeds, control commands — is
//! derived from or expressed as appends to that file.

pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod record;
pub mod sink;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{EngineError, Error, LogError, ProviderError, Result, ToolError};
pub use event::{AgentEvent, AgentStatus};
pub use message::{Conversation, Message, MessageToolCall, Role};
pub use provider::{ChatProvider, ChatRequest, StreamChunk, ToolCallDelta, ToolDefinition, Usage};
pub use record::{LogRecord, RecordBody};
pub use sink::EventSink;
pub use tool::{Tool, ToolCall, ToolOutcome, ToolRegistry, ToolResult};
