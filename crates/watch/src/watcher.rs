//! The log watcher.
//!
//! Tracks a byte offset per agent log and pumps new records to
//! subscribers whenever a file grows. Growth is detected by filesystem
//! notification (debounced); [`LogWatcher::pump`] is also public so
//! embedders and tests can drive the same path deterministically.

use crate::feed::FileActivity;
use crate::projection::AgentProjection;
use hivelog_core::error::Error;
use hivelog_core::record::LogRecord;
use hivelog_log::LogStore;
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{DebouncedEvent, Debouncer, new_debouncer};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Tuning for the watcher.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Debounce window for filesystem notifications.
    pub debounce: Duration,
    /// Capacity of each subscriber queue.
    pub queue_capacity: usize,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(200),
            queue_capacity: 1024,
        }
    }
}

#[derive(Default)]
struct WatchState {
    offsets: HashMap<String, u64>,
    projections: HashMap<String, AgentProjection>,
    agent_subs: HashMap<String, Vec<mpsc::Sender<LogRecord>>>,
    file_subs: Vec<mpsc::Sender<FileActivity>>,
}

/// Tails every agent log under one directory and fans records out.
pub struct LogWatcher {
    store: Arc<LogStore>,
    state: Arc<Mutex<WatchState>>,
    config: WatcherConfig,
    // Held for its Drop; dropping stops the notification thread.
    _debouncer: Option<Debouncer<RecommendedWatcher>>,
}

impl LogWatcher {
    /// Create a watcher without filesystem notification. New records are
    /// picked up on explicit [`pump`](Self::pump) calls.
    pub fn new(store: Arc<LogStore>, config: WatcherConfig) -> Self {
        let watcher = Self {
            store,
            state: Arc::new(Mutex::new(WatchState::default())),
            config,
            _debouncer: None,
        };
        // Build the projection from what is already on disk.
        watcher.pump();
        watcher
    }

    /// Create a watcher with wake-on-write notification on the store's
    /// directory.
    pub fn start(store: Arc<LogStore>, config: WatcherConfig) -> Result<Self, Error> {
        std::fs::create_dir_all(store.base_dir())
            .map_err(|e| Error::Internal(format!("create log dir: {e}")))?;

        let mut watcher = Self::new(Arc::clone(&store), config.clone());

        let pump_store = store;
        let pump_state = Arc::clone(&watcher.state);
        let mut debouncer = new_debouncer(
            config.debounce,
            move |res: Result<Vec<DebouncedEvent>, notify::Error>| match res {
                Ok(events) => {
                    for event in events {
                        if event.path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
                            continue;
                        }
                        let Some(stem) = event.path.file_stem().and_then(|s| s.to_str()) else {
                            continue;
                        };
                        pump_agent(&pump_store, &pump_state, stem);
                    }
                }
                Err(e) => warn!(error = %e, "Log watch error"),
            },
        )
        .map_err(|e| Error::Internal(format!("create watcher: {e}")))?;

        debouncer
            .watcher()
            .watch(watcher.store.base_dir(), RecursiveMode::NonRecursive)
            .map_err(|e| Error::Internal(format!("watch log dir: {e}")))?;

        debug!(dir = %watcher.store.base_dir().display(), "Watching log directory");
        watcher._debouncer = Some(debouncer);
        Ok(watcher)
    }

    /// Pump every agent log from its tracked offset. Also discovers
    /// agents whose files appeared since the last pump.
    pub fn pump(&self) {
        let agents = match self.store.list_agents() {
            Ok(agents) => agents,
            Err(e) => {
                warn!(error = %e, "Could not list agent logs");
                return;
            }
        };
        for agent_id in agents {
            pump_agent(&self.store, &self.state, &agent_id);
        }
    }

    /// Subscribe to one agent's feed: a full replay from file start, then
    /// live appends. The queue is bounded; once it fills, the newest
    /// records are dropped for this subscriber until it drains.
    pub fn subscribe(&self, agent_id: &str) -> mpsc::Receiver<LogRecord> {
        let (tx, rx) = mpsc::channel(self.config.queue_capacity);

        // Bring the shared offset up to date, then replay under the same
        // lock so no live append can interleave with the replay.
        let mut state = self.state.lock().unwrap();
        pump_agent_locked(&self.store, &mut state, agent_id);

        match self.store.read_all(agent_id) {
            Ok(records) => {
                for record in records {
                    if tx.try_send(record).is_err() {
                        warn!(agent_id, "Subscriber queue filled during replay");
                        break;
                    }
                }
            }
            Err(e) => warn!(agent_id, error = %e, "Replay failed"),
        }

        state
            .agent_subs
            .entry(agent_id.to_string())
            .or_default()
            .push(tx);
        rx
    }

    /// Subscribe to the cross-agent file-activity feed (live only).
    pub fn subscribe_files(&self) -> mpsc::Receiver<FileActivity> {
        let (tx, rx) = mpsc::channel(self.config.queue_capacity);
        self.state.lock().unwrap().file_subs.push(tx);
        rx
    }

    /// Snapshot of every agent's cached status and last action.
    pub fn status(&self) -> HashMap<String, AgentProjection> {
        self.state.lock().unwrap().projections.clone()
    }
}

fn pump_agent(store: &LogStore, state: &Mutex<WatchState>, agent_id: &str) {
    let mut state = state.lock().unwrap();
    pump_agent_locked(store, &mut state, agent_id);
}

fn pump_agent_locked(store: &LogStore, state: &mut WatchState, agent_id: &str) {
    let offset = state.offsets.get(agent_id).copied().unwrap_or(0);
    let (records, new_offset) = match store.read_from(agent_id, offset) {
        Ok(result) => result,
        Err(e) => {
            // Best-effort: a transient read failure must not stop the
            // watcher.
            warn!(agent_id, error = %e, "Log read failed");
            return;
        }
    };
    state.offsets.insert(agent_id.to_string(), new_offset);

    for record in records {
        state
            .projections
            .entry(agent_id.to_string())
            .or_default()
            .apply(&record);

        if let Some(subs) = state.agent_subs.get_mut(agent_id) {
            deliver(subs, &record, agent_id);
        }

        if let Some(activity) = FileActivity::from_record(agent_id, &record) {
            deliver(&mut state.file_subs, &activity, agent_id);
        }
    }
}

/// Best-effort fan-out: full queues drop the newest item, closed queues
/// are pruned.
fn deliver<T: Clone>(subs: &mut Vec<mpsc::Sender<T>>, item: &T, agent_id: &str) {
    subs.retain(|tx| match tx.try_send(item.clone()) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            debug!(agent_id, "Subscriber queue full; dropping record");
            true
        }
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    });
}
