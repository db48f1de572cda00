//! The durable log store.
//!
//! One append-only JSONL file per agent, named `<agent_id>.jsonl` under a
//! shared directory. The file is simultaneously:
//! - the agent's persisted history (every event record),
//! - the control channel (external controllers append status records),
//! - the pub/sub source (the watcher tails it, subscribers replay it).
//!
//! Writes are single `write_all` calls of one complete line on a file
//! opened in append mode, so concurrent appenders interleave at line
//! granularity and no record is ever edited in place. Reads are
//! offset-based and tolerant: malformed complete lines are skipped with a
//! warning, and a torn trailing line (no newline yet) is left for the
//! next read.

pub mod store;

pub use store::LogStore;
