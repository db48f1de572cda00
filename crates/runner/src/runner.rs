//! The per-agent run loop.
//!
//! One tokio task per agent. Between turns the task scans its own log for
//! externally appended records — that file is the control channel, there
//! is no other RPC. Pause, resume, stop, and archive are therefore
//! observed at turn boundaries only; an in-flight model call is never
//! preempted.

use crate::flush::RecordSink;
use hivelog_agent::{RunUsage, TurnEngine, TurnStatus};
use hivelog_core::error::EngineError;
use hivelog_core::event::AgentStatus;
use hivelog_core::record::{LogRecord, RecordBody};
use hivelog_log::LogStore;
use hivelog_telemetry::CostAggregator;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// The source tag on lifecycle records written by the run loop.
pub const RUNNER_SOURCE: &str = "runner";

/// Tuning for a run loop.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Maximum turns before the run is archived with reason "turn_limit".
    pub max_turns: u32,
    /// Sleep between control/user-message polls while paused or waiting.
    pub poll_interval: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_turns: 50,
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Spawns and tracks agent run loops.
pub struct AgentRunner {
    store: Arc<LogStore>,
    costs: Arc<CostAggregator>,
    config: RunnerConfig,
}

/// Handle to one agent's background task.
pub struct AgentHandle {
    pub agent_id: String,
    task: JoinHandle<()>,
}

impl AgentHandle {
    /// Wait for the run to reach a terminal state.
    pub async fn join(self) {
        let _ = self.task.await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Hard-kill the task. Prefer appending a stop control record; this
    /// exists for shutdown paths that cannot wait for a turn boundary.
    pub fn abort(&self) {
        self.task.abort();
    }
}

impl AgentRunner {
    pub fn new(store: Arc<LogStore>, costs: Arc<CostAggregator>) -> Self {
        Self {
            store,
            costs,
            config: RunnerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Start an agent's run loop in its own task.
    pub fn spawn(&self, agent_id: impl Into<String>, engine: TurnEngine) -> AgentHandle {
        let agent_id = agent_id.into();
        let task = tokio::spawn(run_agent(
            Arc::clone(&self.store),
            Arc::clone(&self.costs),
            self.config.clone(),
            agent_id.clone(),
            engine,
        ));
        AgentHandle { agent_id, task }
    }
}

/// Is this record's source an external controller (not us)?
fn is_external(source: &Option<String>) -> bool {
    !matches!(
        source.as_deref(),
        Some(RUNNER_SOURCE) | Some(crate::flush::AGENT_SOURCE)
    )
}

async fn run_agent(
    store: Arc<LogStore>,
    costs: Arc<CostAggregator>,
    config: RunnerConfig,
    agent_id: String,
    mut engine: TurnEngine,
) {
    info!(agent_id, "Agent run starting");
    append_best_effort(
        &store,
        &agent_id,
        &LogRecord::status(AgentStatus::Running, RUNNER_SOURCE),
    );

    // Records already in the file are history; control scanning starts
    // from here.
    let mut read_off = store.len(&agent_id);
    let mut sink = RecordSink::new(Arc::clone(&store), agent_id.clone());
    let mut paused = false;
    let mut waiting = false;
    let mut last_reported = RunUsage::default();

    'run: loop {
        // Scan for control records and user messages appended since the
        // last scan.
        let (records, new_off) = match store.read_from(&agent_id, read_off) {
            Ok(result) => result,
            Err(e) => {
                // Infrastructure error: warn and keep going best-effort.
                warn!(agent_id, error = %e, "Control scan failed");
                (Vec::new(), read_off)
            }
        };
        read_off = new_off;

        for record in records {
            match record.body {
                RecordBody::Status { status, source, .. } if is_external(&source) => {
                    match status {
                        AgentStatus::Paused => {
                            info!(agent_id, "Pause command observed");
                            paused = true;
                        }
                        AgentStatus::Running => {
                            info!(agent_id, "Resume command observed");
                            paused = false;
                        }
                        AgentStatus::Archived | AgentStatus::Stopped => {
                            info!(agent_id, %status, "Terminal command observed; stopping run");
                            break 'run;
                        }
                        other => {
                            debug!(agent_id, status = %other, "Ignoring external status");
                        }
                    }
                }
                RecordBody::UserMessage { content } => {
                    // Seed the next turn. If we were waiting for a human,
                    // this is the wake-up.
                    engine.push_user(content);
                    if waiting {
                        waiting = false;
                        if !paused {
                            append_best_effort(
                                &store,
                                &agent_id,
                                &LogRecord::status(AgentStatus::Running, RUNNER_SOURCE),
                            );
                        }
                    }
                }
                _ => {}
            }
        }

        if paused || waiting {
            tokio::time::sleep(config.poll_interval).await;
            continue;
        }

        if engine.turns() >= config.max_turns {
            info!(agent_id, turns = engine.turns(), "Turn budget exhausted");
            append_best_effort(
                &store,
                &agent_id,
                &LogRecord::status_with_reason(AgentStatus::Archived, "turn_limit", RUNNER_SOURCE),
            );
            break 'run;
        }

        match engine.run_turn(&mut sink).await {
            Ok(turn_status) => {
                if let Err(e) = sink.finish_turn() {
                    warn!(agent_id, error = %e, "Flush at turn end failed");
                }
                report_cost(&costs, &agent_id, &engine, &mut last_reported);

                match turn_status {
                    TurnStatus::Completed => {}
                    TurnStatus::WaitingForInput => {
                        debug!(agent_id, "Entering human-wait loop");
                        waiting = true;
                    }
                    TurnStatus::Finished | TurnStatus::Ended => {
                        info!(agent_id, ?turn_status, "Run reached a terminal outcome");
                        break 'run;
                    }
                }
            }
            Err(EngineError::ContextExceeded { chars, limit }) => {
                let _ = sink.finish_turn();
                warn!(agent_id, chars, limit, "Context budget exceeded; archiving run");
                append_best_effort(
                    &store,
                    &agent_id,
                    &LogRecord::status_with_reason(
                        AgentStatus::Archived,
                        "context_limit",
                        RUNNER_SOURCE,
                    ),
                );
                break 'run;
            }
            Err(e) => {
                // Uncaught engine fault: record it and stop this agent.
                // Other agents are unaffected.
                let _ = sink.finish_turn();
                warn!(agent_id, error = %e, "Engine fault; stopping run");
                append_best_effort(
                    &store,
                    &agent_id,
                    &LogRecord::error(e.to_string(), format!("{e:?}")),
                );
                append_best_effort(
                    &store,
                    &agent_id,
                    &LogRecord::status(AgentStatus::Error, RUNNER_SOURCE),
                );
                break 'run;
            }
        }
    }

    // Report any spend from a final partial turn.
    report_cost(&costs, &agent_id, &engine, &mut last_reported);
    info!(agent_id, turns = engine.turns(), "Agent run ended");
}

/// Forward the increment since the last report to the shared aggregator.
fn report_cost(
    costs: &CostAggregator,
    agent_id: &str,
    engine: &TurnEngine,
    last_reported: &mut RunUsage,
) {
    let usage = engine.usage();
    let delta = usage.delta_since(last_reported);
    if delta.prompt_tokens == 0 && delta.completion_tokens == 0 && delta.cost_usd == 0.0 {
        return;
    }
    costs.add_spend(
        agent_id,
        delta.prompt_tokens,
        delta.completion_tokens,
        delta.cost_usd,
    );
    *last_reported = usage;
}

fn append_best_effort(store: &LogStore, agent_id: &str, record: &LogRecord) {
    if let Err(e) = store.append(agent_id, record) {
        warn!(agent_id, error = %e, "Log append failed");
    }
}
