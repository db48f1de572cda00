//! Cost tracking for Hivelog agent runs.
//!
//! Two pieces: a [`PricingTable`] that turns model token counts into USD,
//! and a [`CostAggregator`] — the single cross-agent shared resource —
//! that accumulates spend reported incrementally by each agent's runner
//! and checks it against an optional spend limit.

pub mod aggregator;
pub mod pricing;

pub use aggregator::{AgentSpend, CostAggregator, CostSnapshot};
pub use pricing::{ModelPricing, PricingTable};

/// Errors from the telemetry subsystem.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("spend limit exceeded: {0}")]
    SpendLimitExceeded(String),
}
