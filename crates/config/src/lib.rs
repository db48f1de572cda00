//! Configuration loading, validation, and management for Hivelog.
//!
//! Loads configuration from `~/.hivelog/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.hivelog/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Anthropic API key (env override: HIVELOG_API_KEY / ANTHROPIC_API_KEY)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per model response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Runtime configuration
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Telemetry and spend configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Agents to start with `hivelog run`
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field(
                "api_key",
                &self.api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("runtime", &self.runtime)
            .field("telemetry", &self.telemetry)
            .field("agents", &self.agents)
            .finish()
    }
}

/// Runtime limits and paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Directory holding agent log files
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Maximum turns per agent run
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    /// Poll interval for control signals and user messages, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Per-subscriber live-feed queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_log_dir() -> PathBuf {
    AppConfig::config_dir().join("logs")
}
fn default_max_turns() -> u32 {
    50
}
fn default_poll_interval_ms() -> u64 {
    500
}
fn default_queue_capacity() -> usize {
    1024
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            max_turns: default_max_turns(),
            poll_interval_ms: default_poll_interval_ms(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Telemetry and spend configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Total USD spend limit across all agents (0 or absent = unlimited)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spend_limit_usd: Option<f64>,
}

/// One agent definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Agent ID (also the log file stem)
    pub id: String,

    /// System prompt
    pub system_prompt: String,

    /// Optional seed message for the first turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.hivelog/config.toml).
    ///
    /// Also checks environment variables:
    /// - `HIVELOG_API_KEY` (highest priority), then `ANTHROPIC_API_KEY`
    /// - `HIVELOG_MODEL` overrides the default model
    /// - `HIVELOG_LOG_DIR` overrides the log directory
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("HIVELOG_API_KEY")
                .ok()
                .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("HIVELOG_MODEL") {
            config.default_model = model;
        }

        if let Ok(dir) = std::env::var("HIVELOG_LOG_DIR") {
            config.runtime.log_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".hivelog")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.runtime.max_turns == 0 {
            return Err(ConfigError::ValidationError(
                "runtime.max_turns must be at least 1".into(),
            ));
        }

        if self.runtime.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "runtime.poll_interval_ms must be at least 1".into(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for agent in &self.agents {
            if agent.id.is_empty() {
                return Err(ConfigError::ValidationError(
                    "agent id must not be empty".into(),
                ));
            }
            if !seen.insert(agent.id.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate agent id: {}",
                    agent.id
                )));
            }
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            runtime: RuntimeConfig::default(),
            telemetry: TelemetryConfig::default(),
            agents: vec![],
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_model, "claude-sonnet-4-20250514");
        assert_eq!(config.runtime.max_turns, 50);
        assert!(config.agents.is_empty());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let back: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(back.default_model, config.default_model);
        assert_eq!(back.runtime.poll_interval_ms, config.runtime.poll_interval_ms);
    }

    #[test]
    fn parse_with_agents() {
        let toml_str = r#"
            default_model = "claude-3-5-haiku-20241022"

            [runtime]
            max_turns = 10

            [[agents]]
            id = "scribe"
            system_prompt = "You edit pages"
            seed = "Start with the home page"

            [[agents]]
            id = "curator"
            system_prompt = "You review pages"
        "#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.agents.len(), 2);
        assert_eq!(config.agents[0].id, "scribe");
        assert_eq!(config.agents[0].seed.as_deref(), Some("Start with the home page"));
        assert!(config.agents[1].seed.is_none());
        assert_eq!(config.runtime.max_turns, 10);
    }

    #[test]
    fn duplicate_agent_ids_rejected() {
        let toml_str = r#"
            [[agents]]
            id = "scribe"
            system_prompt = "a"

            [[agents]]
            id = "scribe"
            system_prompt = "b"
        "#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.default_temperature = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_uses_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.default_model, default_model());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_model = \"gpt-4o\"\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_model, "gpt-4o");
    }

    #[test]
    fn debug_redacts_api_key() {
        let mut config = AppConfig::default();
        config.api_key = Some("sk-ant-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-ant-secret"));
        assert!(debug.contains("REDACTED"));
    }
}
