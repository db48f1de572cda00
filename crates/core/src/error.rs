//! Error types for the Hivelog domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant. The taxonomy mirrors
//! how failures are handled at runtime: engine errors can be fatal to a
//! run, tool errors are surfaced to the model, log errors are best-effort
//! infrastructure conditions.

use thiserror::Error;

/// The top-level error type for all Hivelog operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Engine errors ---
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    // --- Log store errors ---
    #[error("Log error: {0}")]
    Log(#[from] LogError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

/// Errors from the conversation engine. `ContextExceeded` is the one
/// fatal-to-run condition: it is raised before any model call once the
/// transcript outgrows the budget, and the run is archived.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("conversation context of {chars} chars exceeds the {limit} char budget")]
    ContextExceeded { chars: usize, limit: usize },

    #[error("provider failure: {0}")]
    Provider(#[from] ProviderError),

    #[error("event sink failure: {0}")]
    Sink(String),
}

/// Errors from the durable log store. Readers treat these as best-effort
/// conditions: warn and continue wherever possible.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("log storage error: {0}")]
    Storage(String),

    #[error("log record serialization failed: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn context_exceeded_displays_sizes() {
        let err = EngineError::ContextExceeded {
            chars: 300_101,
            limit: 300_000,
        };
        let msg = err.to_string();
        assert!(msg.contains("300101"));
        assert!(msg.contains("300000"));
    }

    #[test]
    fn tool_error_displays_correctly() {
        let err = Error::Tool(ToolError::ExecutionFailed {
            tool_name: "edit_page".into(),
            reason: "page does not exist".into(),
        });
        assert!(err.to_string().contains("edit_page"));
        assert!(err.to_string().contains("does not exist"));
    }
}
