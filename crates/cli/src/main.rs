//! Hivelog CLI — the main entry point.
//!
//! Commands:
//! - `run`     — Start every configured agent and wait for them to finish
//! - `pause` / `resume` / `stop` / `archive` — Append a control record
//! - `send`    — Append a user message for a waiting agent
//! - `tail`    — Follow one agent's log (full replay, then live)
//! - `status`  — Show every agent's cached status and last action
//! - `files`   — Follow the cross-agent file-activity feed

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "hivelog",
    about = "Hivelog — observable, pausable LLM agent runs over an append-only log",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start every agent defined in the configuration
    Run {
        /// Use a specific config file instead of ~/.hivelog/config.toml
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Pause an agent at its next turn boundary
    Pause { agent: String },

    /// Resume a paused agent
    Resume { agent: String },

    /// Stop an agent permanently
    Stop { agent: String },

    /// Archive an agent permanently
    Archive { agent: String },

    /// Send a user message to an agent
    Send { agent: String, message: String },

    /// Follow one agent's log: full replay, then live records
    Tail { agent: String },

    /// Show the status projection for every agent
    Status,

    /// Follow the cross-agent file-activity feed
    Files,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run { config } => commands::run::run(config).await?,
        Commands::Pause { agent } => commands::ctl::pause(&agent)?,
        Commands::Resume { agent } => commands::ctl::resume(&agent)?,
        Commands::Stop { agent } => commands::ctl::stop(&agent)?,
        Commands::Archive { agent } => commands::ctl::archive(&agent)?,
        Commands::Send { agent, message } => commands::ctl::send(&agent, &message)?,
        Commands::Tail { agent } => commands::tail::tail(&agent).await?,
        Commands::Status => commands::status::status()?,
        Commands::Files => commands::tail::files().await?,
    }

    Ok(())
}
