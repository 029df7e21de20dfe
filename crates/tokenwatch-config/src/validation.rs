// SPDX-FileCopyrightText: 2026 TokenWatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::TokenwatchConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every problem instead of stopping at the first one.
pub fn validate_config(config: &TokenwatchConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.data_dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.data_dir must not be empty".to_string(),
        });
    }

    if let Some(path) = &config.pricing.table_path
        && path.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "pricing.table_path must not be empty when set".to_string(),
        });
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "logging.level `{}` is not one of {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    let advisor = &config.advisor;
    for (name, value) in [
        ("high_avg_cost_per_call_usd", advisor.high_avg_cost_per_call_usd),
        ("expensive_input_rate_per_mtok", advisor.expensive_input_rate_per_mtok),
        ("expensive_spend_threshold_usd", advisor.expensive_spend_threshold_usd),
    ] {
        if !value.is_finite() || value < 0.0 {
            errors.push(ConfigError::Validation {
                message: format!("advisor.{name} must be a non-negative number, got {value}"),
            });
        }
    }

    if advisor.volume_model.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "advisor.volume_model must not be empty".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for (i, rule) in advisor.swap_rules.iter().enumerate() {
        if rule.current_model.trim().is_empty() || rule.suggested_model.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("advisor.swap_rules[{i}] needs both current_model and suggested_model"),
            });
        } else if rule.current_model == rule.suggested_model {
            errors.push(ConfigError::Validation {
                message: format!(
                    "advisor.swap_rules[{i}] suggests `{}` in place of itself",
                    rule.current_model
                ),
            });
        }
        if !seen.insert((&rule.current_model, &rule.suggested_model)) {
            errors.push(ConfigError::Validation {
                message: format!(
                    "duplicate swap rule `{}` -> `{}`",
                    rule.current_model, rule.suggested_model
                ),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
