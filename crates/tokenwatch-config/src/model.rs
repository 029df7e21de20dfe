// SPDX-FileCopyrightText: 2026 TokenWatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for TokenWatch.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is an
//! error at startup instead of a silently ignored setting.

use serde::{Deserialize, Serialize};

/// Top-level TokenWatch configuration.
///
/// Every section is optional and defaults to the values a first run expects.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TokenwatchConfig {
    /// Where the usage ledger, alert log and budget document live.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Pricing table source.
    #[serde(default)]
    pub pricing: PricingConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Optimization advisor thresholds and swap rules.
    #[serde(default)]
    pub advisor: AdvisorConfig,
}

/// Persisted state location.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory holding `usage.json`, `alerts.json` and `budget.json`.
    /// Created on first use.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Write each document to a temporary file and rename it into place.
    #[serde(default = "default_atomic_writes")]
    pub atomic_writes: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            atomic_writes: default_atomic_writes(),
        }
    }
}

fn default_data_dir() -> String {
    ".tokenwatch".to_string()
}

fn default_atomic_writes() -> bool {
    true
}

/// Pricing table configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PricingConfig {
    /// Path to a TOML pricing table. `None` uses the table built into the binary.
    #[serde(default)]
    pub table_path: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Optimization advisor configuration.
///
/// The rules are illustrative heuristics. They reference model names directly
/// and are not kept in sync with the pricing table.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AdvisorConfig {
    /// Flag any model whose average cost per call is above this (USD).
    #[serde(default = "default_high_avg_cost_per_call_usd")]
    pub high_avg_cost_per_call_usd: f64,

    /// Models with an input rate above this (USD per 1M tokens) count as expensive.
    #[serde(default = "default_expensive_input_rate_per_mtok")]
    pub expensive_input_rate_per_mtok: f64,

    /// Suggest `volume_model` once monthly spend on expensive models exceeds this (USD).
    #[serde(default = "default_expensive_spend_threshold_usd")]
    pub expensive_spend_threshold_usd: f64,

    /// Cheap high-volume model recommended by the provider-swap rule.
    #[serde(default = "default_volume_model")]
    pub volume_model: String,

    /// Hardcoded model-for-model swap suggestions.
    #[serde(default = "default_swap_rules")]
    pub swap_rules: Vec<SwapRule>,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            high_avg_cost_per_call_usd: default_high_avg_cost_per_call_usd(),
            expensive_input_rate_per_mtok: default_expensive_input_rate_per_mtok(),
            expensive_spend_threshold_usd: default_expensive_spend_threshold_usd(),
            volume_model: default_volume_model(),
            swap_rules: default_swap_rules(),
        }
    }
}

fn default_high_avg_cost_per_call_usd() -> f64 {
    0.05
}

fn default_expensive_input_rate_per_mtok() -> f64 {
    1.0
}

fn default_expensive_spend_threshold_usd() -> f64 {
    5.0
}

fn default_volume_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_swap_rules() -> Vec<SwapRule> {
    vec![
        SwapRule {
            current_model: "claude-opus-4-6".to_string(),
            suggested_model: "claude-sonnet-4-5-20250929".to_string(),
            min_calls: default_min_calls(),
            message: "Swap Opus -> Sonnet for non-reasoning tasks".to_string(),
        },
        SwapRule {
            current_model: "gpt-4o".to_string(),
            suggested_model: "gpt-4o-mini".to_string(),
            min_calls: default_min_calls(),
            message: "Swap GPT-4o -> GPT-4o-mini for simple tasks".to_string(),
        },
    ]
}

/// Suggest `suggested_model` when `current_model` was called more than
/// `min_calls` times in the last thirty days.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SwapRule {
    pub current_model: String,
    pub suggested_model: String,
    #[serde(default = "default_min_calls")]
    pub min_calls: u64,
    pub message: String,
}

fn default_min_calls() -> u64 {
    10
}
