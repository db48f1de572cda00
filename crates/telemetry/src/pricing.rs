//! Built-in pricing table for common LLM models.
//!
//! Prices are in USD per 1 million tokens. Each model has an input and
//! output price. Unknown models cost 0.0 — an estimate beats a crash.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-million-token pricing for a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPricing {
    /// Price per 1M input tokens in USD.
    pub input_per_m: f64,
    /// Price per 1M output tokens in USD.
    pub output_per_m: f64,
}

impl ModelPricing {
    pub fn new(input_per_m: f64, output_per_m: f64) -> Self {
        Self {
            input_per_m,
            output_per_m,
        }
    }

    /// Compute cost for the given token counts.
    pub fn cost(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        (input_tokens as f64 * self.input_per_m + output_tokens as f64 * self.output_per_m)
            / 1_000_000.0
    }
}

/// Pricing table with built-in defaults and custom overrides.
pub struct PricingTable {
    prices: HashMap<String, ModelPricing>,
}

impl PricingTable {
    /// Create a pricing table with built-in model prices.
    pub fn with_defaults() -> Self {
        let mut prices = HashMap::new();

        prices.insert(
            "claude-sonnet-4-20250514".into(),
            ModelPricing::new(3.0, 15.0),
        );
        prices.insert(
            "claude-opus-4-20250514".into(),
            ModelPricing::new(15.0, 75.0),
        );
        prices.insert(
            "claude-3-5-sonnet-20241022".into(),
            ModelPricing::new(3.0, 15.0),
        );
        prices.insert(
            "claude-3-5-haiku-20241022".into(),
            ModelPricing::new(0.8, 4.0),
        );
        prices.insert("gpt-4o".into(), ModelPricing::new(2.5, 10.0));
        prices.insert("gpt-4o-mini".into(), ModelPricing::new(0.15, 0.6));
        prices.insert("o3-mini".into(), ModelPricing::new(1.1, 4.4));
        prices.insert("gemini-2.0-flash".into(), ModelPricing::new(0.1, 0.4));
        prices.insert("deepseek-v3".into(), ModelPricing::new(0.27, 1.1));

        Self { prices }
    }

    /// Create an empty pricing table.
    pub fn empty() -> Self {
        Self {
            prices: HashMap::new(),
        }
    }

    /// Look up pricing for a model. Returns None if not found.
    pub fn get(&self, model: &str) -> Option<&ModelPricing> {
        self.prices.get(model)
    }

    /// Add or update pricing for a model.
    pub fn set(&mut self, model: impl Into<String>, pricing: ModelPricing) {
        self.prices.insert(model.into(), pricing);
    }

    /// Compute cost for a model call, returning 0.0 if the model is not in
    /// the table.
    ///
    /// Tries an exact match first, then prefix matching on bare names —
    /// provider responses often carry a version suffix
    /// (`claude-sonnet-4-20250514-v2` should still match
    /// `claude-sonnet-4-20250514`).
    pub fn compute_cost(&self, model: &str, input_tokens: u32, output_tokens: u32) -> f64 {
        if let Some(p) = self.prices.get(model) {
            return p.cost(input_tokens, output_tokens);
        }

        let model_lower = model.to_lowercase();
        let mut best: Option<(&str, &ModelPricing)> = None;
        for (key, pricing) in &self.prices {
            if model_lower.starts_with(&key.to_lowercase())
                && best.is_none_or(|(k, _)| key.len() > k.len())
            {
                best = Some((key.as_str(), pricing));
            }
        }

        match best {
            Some((_, p)) => p.cost(input_tokens, output_tokens),
            None => 0.0,
        }
    }

    /// List all known model names, sorted.
    pub fn models(&self) -> Vec<String> {
        let mut names: Vec<String> = self.prices.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}
