//! Log tailing and fan-out.
//!
//! The watcher tails every agent's log file, keeps an eventually
//! consistent status projection, and republishes new records to
//! per-agent subscriber queues plus a cross-agent file-activity feed.
//! Delivery is best-effort: a full subscriber queue drops the newest
//! record for that subscriber, never blocking the watcher. The log file,
//! not any feed or projection, stays authoritative.

pub mod feed;
pub mod projection;
pub mod watcher;

pub use feed::{FILE_MUTATING_TOOLS, FileActivity, FileChanges};
pub use projection::AgentProjection;
pub use watcher::{LogWatcher, WatcherConfig};
