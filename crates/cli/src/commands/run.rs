//! The `run` command: start every configured agent and wait.

use anyhow::{Context, Result};
use hivelog_agent::TurnEngine;
use hivelog_config::AppConfig;
use hivelog_log::LogStore;
use hivelog_providers::AnthropicProvider;
use hivelog_runner::{AgentRunner, RunnerConfig};
use hivelog_telemetry::CostAggregator;
use hivelog_tools::control_registry;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub async fn run(config_path: Option<PathBuf>) -> Result<()> {
    let config = match config_path {
        Some(path) => AppConfig::load_from(&path)?,
        None => AppConfig::load()?,
    };
    anyhow::ensure!(
        !config.agents.is_empty(),
        "no agents configured; add [[agents]] entries to config.toml"
    );
    let api_key = config
        .api_key
        .clone()
        .context("no API key configured; set HIVELOG_API_KEY or api_key in config.toml")?;

    let provider = Arc::new(AnthropicProvider::new(api_key));
    let tools = Arc::new(control_registry());
    let store = Arc::new(LogStore::new(&config.runtime.log_dir));

    let mut costs = CostAggregator::new();
    if let Some(limit) = config.telemetry.spend_limit_usd {
        costs = costs.with_spend_limit(limit);
    }
    let costs = Arc::new(costs);

    let runner = AgentRunner::new(Arc::clone(&store), Arc::clone(&costs)).with_config(
        RunnerConfig {
            max_turns: config.runtime.max_turns,
            poll_interval: Duration::from_millis(config.runtime.poll_interval_ms),
        },
    );

    let mut handles = Vec::new();
    for agent in &config.agents {
        let mut engine = TurnEngine::new(
            Arc::clone(&provider) as Arc<dyn hivelog_core::ChatProvider>,
            &config.default_model,
            Arc::clone(&tools),
        )
        .with_system(&agent.system_prompt)
        .with_temperature(config.default_temperature)
        .with_max_tokens(config.default_max_tokens);

        if let Some(seed) = &agent.seed {
            engine.push_user(seed);
        }

        info!(agent_id = %agent.id, model = %config.default_model, "Starting agent");
        handles.push(runner.spawn(agent.id.clone(), engine));
    }

    println!(
        "{} agent(s) running; logs in {}",
        handles.len(),
        config.runtime.log_dir.display()
    );

    for handle in handles {
        handle.join().await;
    }

    let snapshot = costs.snapshot();
    println!(
        "All runs ended. Total spend: ${:.4} ({} prompt + {} completion tokens)",
        snapshot.total_cost_usd, snapshot.total_prompt_tokens, snapshot.total_completion_tokens
    );
    Ok(())
}
