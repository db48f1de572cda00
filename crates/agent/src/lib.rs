//! The conversation engine — the heart of Hivelog.
//!
//! One turn is: repair the transcript, stream a model call, execute the
//! tool calls it produced strictly in order, and leave the history ready
//! for the next turn. The engine is cooperative: it suspends at every
//! streamed token and every tool boundary by awaiting the caller's
//! [`EventSink`](hivelog_core::sink::EventSink), so the consumer that owns
//! it paces the whole run.
//!
//! What the engine does **not** do: lifecycle control. Pause, resume,
//! stop, and the human-wait loop belong to the runner crate; the engine
//! only reports sentinel outcomes through its [`TurnStatus`].

pub mod engine;
pub mod repair;
pub mod testing;

pub use engine::{CONTEXT_CHAR_LIMIT, RunUsage, TurnEngine, TurnStatus};
pub use repair::{RESULT_SIZE_CAP, normalize_payload, repair_history};
