//! Control commands.
//!
//! There is no control RPC: pausing, resuming, stopping, archiving, and
//! messaging an agent are all appends to its log file. The running
//! consumer observes them at its next poll.

use anyhow::Result;
use hivelog_core::event::AgentStatus;
use hivelog_log::LogStore;

/// Source tag on records appended by this CLI.
const CLI_SOURCE: &str = "cli";

pub fn pause(agent: &str) -> Result<()> {
    control(&super::open_store()?, agent, AgentStatus::Paused)
}

pub fn resume(agent: &str) -> Result<()> {
    control(&super::open_store()?, agent, AgentStatus::Running)
}

pub fn stop(agent: &str) -> Result<()> {
    control(&super::open_store()?, agent, AgentStatus::Stopped)
}

pub fn archive(agent: &str) -> Result<()> {
    control(&super::open_store()?, agent, AgentStatus::Archived)
}

pub fn send(agent: &str, message: &str) -> Result<()> {
    send_with(&super::open_store()?, agent, message)
}

fn control(store: &LogStore, agent: &str, status: AgentStatus) -> Result<()> {
    store.append_control(agent, status, CLI_SOURCE)?;
    println!("{agent}: {status} requested");
    Ok(())
}

fn send_with(store: &LogStore, agent: &str, message: &str) -> Result<()> {
    store.append_user_message(agent, message)?;
    println!("{agent}: message queued");
    Ok(())
}
