//! The event consumer / durable logger.
//!
//! Owns one conversation engine per agent and runs it turn-by-turn inside
//! a dedicated tokio task. Engine events become append-only log records
//! through the [`RecordSink`] flush policy; external control arrives by
//! reading the same log between turns. Agents are fully independent — the
//! only shared mutable state is the cost aggregator.

pub mod flush;
pub mod runner;

pub use flush::RecordSink;
pub use runner::{AgentHandle, AgentRunner, RunnerConfig};
