//! Cross-agent spend aggregation.
//!
//! The aggregator is the only mutable state shared between agent runners,
//! so it is the one place that takes a lock. Increment and threshold check
//! happen under the same guard — two runners reporting concurrently can
//! never both conclude they are under the limit when their sum is not.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::warn;

/// Spend attributed to a single agent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AgentSpend {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub cost_usd: f64,
    pub turns: u64,
}

#[derive(Debug, Default)]
struct Totals {
    prompt_tokens: u64,
    completion_tokens: u64,
    cost_usd: f64,
    per_agent: HashMap<String, AgentSpend>,
}

/// A point-in-time view of aggregate spend.
#[derive(Debug, Clone, Serialize)]
pub struct CostSnapshot {
    pub total_prompt_tokens: u64,
    pub total_completion_tokens: u64,
    pub total_cost_usd: f64,
    pub spend_limit_usd: Option<f64>,
    pub per_agent: HashMap<String, AgentSpend>,
}

/// Accumulates incremental spend reports from all agent runners.
pub struct CostAggregator {
    totals: Mutex<Totals>,
    spend_limit_usd: Option<f64>,
}

impl CostAggregator {
    pub fn new() -> Self {
        Self {
            totals: Mutex::new(Totals::default()),
            spend_limit_usd: None,
        }
    }

    /// Set a total spend limit. Crossing it is reported to callers of
    /// [`add_spend`](Self::add_spend); enforcement is their decision.
    pub fn with_spend_limit(mut self, limit_usd: f64) -> Self {
        self.spend_limit_usd = Some(limit_usd);
        self
    }

    /// Record one turn's incremental spend for an agent. Returns `true`
    /// if total spend is now over the configured limit.
    pub fn add_spend(
        &self,
        agent_id: &str,
        prompt_tokens: u64,
        completion_tokens: u64,
        cost_usd: f64,
    ) -> bool {
        let mut totals = self.totals.lock().unwrap();

        totals.prompt_tokens += prompt_tokens;
        totals.completion_tokens += completion_tokens;
        totals.cost_usd += cost_usd;

        let agent = totals.per_agent.entry(agent_id.to_string()).or_default();
        agent.prompt_tokens += prompt_tokens;
        agent.completion_tokens += completion_tokens;
        agent.cost_usd += cost_usd;
        agent.turns += 1;

        let over = self
            .spend_limit_usd
            .is_some_and(|limit| totals.cost_usd > limit);
        if over {
            warn!(
                agent_id,
                total_usd = totals.cost_usd,
                limit_usd = self.spend_limit_usd,
                "Spend limit exceeded"
            );
        }
        over
    }

    /// A snapshot of all accumulated spend.
    pub fn snapshot(&self) -> CostSnapshot {
        let totals = self.totals.lock().unwrap();
        CostSnapshot {
            total_prompt_tokens: totals.prompt_tokens,
            total_completion_tokens: totals.completion_tokens,
            total_cost_usd: totals.cost_usd,
            spend_limit_usd: self.spend_limit_usd,
            per_agent: totals.per_agent.clone(),
        }
    }

    /// Total spend so far in USD.
    pub fn total_cost_usd(&self) -> f64 {
        self.totals.lock().unwrap().cost_usd
    }
}

impl Default for CostAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn accumulates_across_agents() {
        let agg = CostAggregator::new();
        agg.add_spend("scribe", 1000, 500, 0.01);
        agg.add_spend("curator", 2000, 1000, 0.02);
        agg.add_spend("scribe", 500, 250, 0.005);

        let snap = agg.snapshot();
        assert_eq!(snap.total_prompt_tokens, 3500);
        assert_eq!(snap.total_completion_tokens, 1750);
        assert!((snap.total_cost_usd - 0.035).abs() < 1e-10);
        assert_eq!(snap.per_agent["scribe"].turns, 2);
        assert_eq!(snap.per_agent["curator"].turns, 1);
        assert!((snap.per_agent["scribe"].cost_usd - 0.015).abs() < 1e-10);
    }

    #[test]
    fn spend_limit_crossing() {
        let agg = CostAggregator::new().with_spend_limit(0.05);
        assert!(!agg.add_spend("a", 100, 50, 0.03));
        assert!(agg.add_spend("b", 100, 50, 0.03));
        // Stays over once crossed.
        assert!(agg.add_spend("a", 1, 1, 0.0001));
    }

    #[test]
    fn no_limit_never_over() {
        let agg = CostAggregator::new();
        assert!(!agg.add_spend("a", 0, 0, 1000.0));
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let agg = Arc::new(CostAggregator::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let agg = Arc::clone(&agg);
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    agg.add_spend("shared", 10, 5, 0.001);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        let snap = agg.snapshot();
        assert_eq!(snap.total_prompt_tokens, 8000);
        assert_eq!(snap.per_agent["shared"].turns, 800);
        assert!((snap.total_cost_usd - 0.8).abs() < 1e-9);
    }
}
