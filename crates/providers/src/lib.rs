//! LLM provider implementations for Hivelog.
//!
//! All providers implement the `hivelog_core::ChatProvider` trait and
//! emit raw stream fragments: the conversation engine, not the provider,
//! assembles tool calls and classifies the turn.

pub mod anthropic;

pub use anthropic::AnthropicProvider;
