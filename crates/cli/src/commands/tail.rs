//! Live feeds: `tail` for one agent, `files` for the cross-agent view.

use anyhow::Result;
use hivelog_watch::{LogWatcher, WatcherConfig};
use std::sync::Arc;

/// Print one agent's full history, then follow live appends until
/// interrupted.
pub async fn tail(agent: &str) -> Result<()> {
    let store = Arc::new(super::open_store()?);
    let watcher = LogWatcher::start(store, WatcherConfig::default())?;
    let mut rx = watcher.subscribe(agent);

    while let Some(record) = rx.recv().await {
        println!("{}", serde_json::to_string(&record)?);
    }
    Ok(())
}

/// Follow the file-activity feed across all agents.
pub async fn files() -> Result<()> {
    let store = Arc::new(super::open_store()?);
    let watcher = LogWatcher::start(store, WatcherConfig::default())?;
    let mut rx = watcher.subscribe_files();

    while let Some(activity) = rx.recv().await {
        println!("{}", serde_json::to_string(&activity)?);
    }
    Ok(())
}
