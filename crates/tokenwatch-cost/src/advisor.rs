// SPDX-FileCopyrightText: 2026 TokenWatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cost optimization suggestions.
//!
//! Heuristics over the last thirty days of usage. The model names and
//! thresholds come from [`AdvisorConfig`]; nothing here keeps them in step with
//! the pricing table.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokenwatch_config::AdvisorConfig;

use crate::ledger::{UsageRecord, spend_by_model};
use crate::pricing::PricingTable;

/// Ordering is urgency: `High < Medium < Low`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    ModelSwap,
    PromptLength,
    ProviderSwap,
    Info,
}

/// One piece of advice. Optional fields depend on the kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub priority: Priority,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_monthly_savings_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_cost_per_call_usd: Option<f64>,
}

impl Suggestion {
    fn new(kind: SuggestionKind, priority: Priority, message: String) -> Self {
        Self {
            kind,
            priority,
            message,
            model: None,
            current_model: None,
            suggested_model: None,
            estimated_monthly_savings_usd: None,
            avg_cost_per_call_usd: None,
        }
    }
}

/// Applies the configured heuristics.
#[derive(Debug, Clone)]
pub struct Advisor {
    config: AdvisorConfig,
}

impl Advisor {
    pub fn new(config: AdvisorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    /// Suggestions for `month_records`, most urgent first.
    ///
    /// Always returns at least one entry: an informational one when there is
    /// no data or nothing worth changing.
    pub fn suggest(&self, month_records: &[&UsageRecord], pricing: &PricingTable) -> Vec<Suggestion> {
        if month_records.is_empty() {
            return vec![Suggestion::new(
                SuggestionKind::Info,
                Priority::Low,
                "No usage data yet. Record some calls first.".to_string(),
            )];
        }

        let by_model = spend_by_model(month_records.iter().copied());
        let mut suggestions = Vec::new();

        for stats in &by_model {
            for rule in self
                .config
                .swap_rules
                .iter()
                .filter(|rule| rule.current_model == stats.model)
                .filter(|rule| stats.call_count as u64 > rule.min_calls)
            {
                let savings = pricing.get(&rule.suggested_model).map(|suggested| {
                    let alternative =
                        stats.total_tokens as f64 * suggested.input_per_mtok / 1_000_000.0;
                    tokenwatch_core::round_to(stats.total_cost_usd - alternative, 4)
                });
                suggestions.push(Suggestion {
                    current_model: Some(stats.model.clone()),
                    suggested_model: Some(rule.suggested_model.clone()),
                    estimated_monthly_savings_usd: savings,
                    ..Suggestion::new(SuggestionKind::ModelSwap, Priority::High, rule.message.clone())
                });
            }

            if stats.avg_cost_per_call > self.config.high_avg_cost_per_call_usd {
                suggestions.push(Suggestion {
                    model: Some(stats.model.clone()),
                    avg_cost_per_call_usd: Some(stats.avg_cost_per_call),
                    ..Suggestion::new(
                        SuggestionKind::PromptLength,
                        Priority::Medium,
                        format!(
                            "High avg cost/call (${:.4}) on {}; consider reducing prompt length or batching",
                            stats.avg_cost_per_call, stats.model
                        ),
                    )
                });
            }
        }

        let expensive_spend: f64 = by_model
            .iter()
            .filter(|stats| {
                pricing
                    .get(&stats.model)
                    .is_some_and(|p| p.input_per_mtok > self.config.expensive_input_rate_per_mtok)
            })
            .map(|stats| stats.total_cost_usd)
            .sum();
        if expensive_spend > self.config.expensive_spend_threshold_usd {
            let volume_model = &self.config.volume_model;
            let message = match pricing.get(volume_model) {
                Some(p) => format!(
                    "Consider {volume_model} for high-volume tasks at ${}/1M input tokens",
                    p.input_per_mtok
                ),
                None => format!("Consider {volume_model} for high-volume tasks"),
            };
            suggestions.push(Suggestion {
                suggested_model: Some(volume_model.clone()),
                ..Suggestion::new(SuggestionKind::ProviderSwap, Priority::Medium, message)
            });
        }

        if suggestions.is_empty() {
            let total: f64 = month_records.iter().map(|r| r.cost_usd).sum();
            suggestions.push(Suggestion::new(
                SuggestionKind::Info,
                Priority::Low,
                format!("Spending looks efficient. Monthly total: ${total:.4}"),
            ));
        }

        suggestions.sort_by_key(|s| s.priority);
        suggestions
    }
}
