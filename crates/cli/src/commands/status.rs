//! The `status` command: print the projection for every agent.

use anyhow::Result;
use hivelog_watch::{LogWatcher, WatcherConfig};
use std::sync::Arc;

pub fn status() -> Result<()> {
    let store = Arc::new(super::open_store()?);
    let watcher = LogWatcher::new(store, WatcherConfig::default());

    let projections = watcher.status();
    if projections.is_empty() {
        println!("No agent logs found.");
        return Ok(());
    }

    let mut agents: Vec<_> = projections.into_iter().collect();
    agents.sort_by(|a, b| a.0.cmp(&b.0));

    println!("{:<20} {:<18} {:<20} LAST ACTION", "AGENT", "STATUS", "UPDATED");
    for (agent_id, proj) in agents {
        println!(
            "{:<20} {:<18} {:<20} {}",
            agent_id,
            proj.status.to_string(),
            proj.updated_at.format("%Y-%m-%d %H:%M:%S"),
            proj.last_action.unwrap_or_default()
        );
    }
    Ok(())
}
