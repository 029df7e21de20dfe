// SPDX-FileCopyrightText: 2026 TokenWatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model pricing tables and cost calculation.
//!
//! The table is data, not code: a TOML file of `[[models]]` entries. The copy
//! in `data/pricing.toml` is compiled in as the default, and a different file
//! can be supplied at startup through `pricing.table_path`.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokenwatch_core::{COST_DECIMALS, TokenwatchError, cost_for, round_to};
use tracing::{debug, warn};

/// Provider recorded for models missing from the table.
pub const UNKNOWN_PROVIDER: &str = "unknown";

const BUILTIN_TABLE: &str = include_str!("../data/pricing.toml");

/// Per-model pricing in USD per million tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelPricing {
    /// Exact model identifier as reported by the provider.
    pub name: String,
    /// Organization operating the model; used for provider breakdowns.
    pub provider: String,
    /// Cost per million input tokens.
    pub input_per_mtok: f64,
    /// Cost per million output tokens.
    pub output_per_mtok: f64,
}

impl ModelPricing {
    /// Unrounded cost of a call with the given token counts.
    pub fn cost(&self, input_tokens: i64, output_tokens: i64) -> f64 {
        cost_for(
            input_tokens,
            output_tokens,
            self.input_per_mtok,
            self.output_per_mtok,
        )
    }

    /// Cost rounded to the precision stored on a usage record.
    pub fn rounded_cost(&self, input_tokens: i64, output_tokens: i64) -> f64 {
        round_to(self.cost(input_tokens, output_tokens), COST_DECIMALS)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PricingFile {
    #[serde(default)]
    models: Vec<ModelPricing>,
}

/// Ordered collection of model prices with exact-name lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingTable {
    models: Vec<ModelPricing>,
}

impl PricingTable {
    /// Build a table from entries, rejecting duplicate names and bad rates.
    pub fn new(models: Vec<ModelPricing>) -> Result<Self, TokenwatchError> {
        let mut seen = HashSet::new();
        for entry in &models {
            if !seen.insert(entry.name.as_str()) {
                return Err(TokenwatchError::Pricing {
                    message: format!("model `{}` is listed more than once", entry.name),
                    source: None,
                });
            }
            for (label, rate) in [
                ("input_per_mtok", entry.input_per_mtok),
                ("output_per_mtok", entry.output_per_mtok),
            ] {
                if !rate.is_finite() || rate < 0.0 {
                    return Err(TokenwatchError::Pricing {
                        message: format!("model `{}` has invalid {label} {rate}", entry.name),
                        source: None,
                    });
                }
            }
        }
        Ok(Self { models })
    }

    /// The table compiled into the binary.
    pub fn builtin() -> Result<Self, TokenwatchError> {
        Self::from_toml_str(BUILTIN_TABLE)
    }

    /// Parse a TOML pricing document.
    pub fn from_toml_str(content: &str) -> Result<Self, TokenwatchError> {
        let file: PricingFile = toml::from_str(content).map_err(|e| TokenwatchError::Pricing {
            message: "pricing table is not valid TOML".to_string(),
            source: Some(Box::new(e)),
        })?;
        Self::new(file.models)
    }

    /// Read and parse a pricing file.
    pub fn from_path(path: &Path) -> Result<Self, TokenwatchError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| TokenwatchError::storage(path, e))?;
        Self::from_toml_str(&content)
    }

    /// Load the override at `table_path` if given, otherwise the builtin table.
    ///
    /// An override that cannot be used is logged and replaced by the builtin
    /// table; only a broken builtin table is an error.
    pub fn load(table_path: Option<&Path>) -> Result<Self, TokenwatchError> {
        if let Some(path) = table_path {
            match Self::from_path(path) {
                Ok(table) => {
                    debug!(path = %path.display(), models = table.len(), "pricing table loaded");
                    return Ok(table);
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "pricing table override unusable, using builtin table"
                    );
                }
            }
        }
        Self::builtin()
    }

    /// Exact-name lookup.
    pub fn get(&self, model: &str) -> Option<&ModelPricing> {
        self.models.iter().find(|m| m.name == model)
    }

    /// Entries in table order.
    pub fn iter(&self) -> impl Iterator<Item = &ModelPricing> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Map a provider-reported model name (often carrying a date suffix) onto
    /// a table entry.
    ///
    /// An exact match wins. Otherwise the longest table name contained in
    /// `reported` is used, earlier entries winning ties, so
    /// `gpt-4.1-mini-2025-04-14` resolves to `gpt-4.1-mini` rather than `gpt-4.1`.
    /// Taking the first contained name in table order instead would pick
    /// `gpt-4.1` here, since it is listed ahead of its variants.
    pub fn normalize<'a>(&'a self, reported: &str) -> Option<&'a ModelPricing> {
        if let Some(exact) = self.get(reported) {
            return Some(exact);
        }
        self.models
            .iter()
            .filter(|m| reported.contains(m.name.as_str()))
            .fold(None, |best: Option<&ModelPricing>, m| match best {
                Some(b) if b.name.len() >= m.name.len() => Some(b),
                _ => Some(m),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, input: f64, output: f64) -> ModelPricing {
        ModelPricing {
            name: name.to_string(),
            provider: "test".to_string(),
            input_per_mtok: input,
            output_per_mtok: output,
        }
    }

    #[test]
    fn builtin_table_parses() {
        let table = PricingTable::builtin().unwrap();
        assert_eq!(table.len(), 41);
        assert_eq!(table.iter().next().unwrap().name, "claude-opus-4-6");
    }

    #[test]
    fn haiku_pricing() {
        let table = PricingTable::builtin().unwrap();
        let p = table.get("claude-haiku-4-5-20251001").unwrap();
        assert_eq!(p.provider, "anthropic");
        assert!((p.input_per_mtok - 1.0).abs() < f64::EPSILON);
        assert!((p.output_per_mtok - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn lookup_is_exact() {
        let table = PricingTable::builtin().unwrap();
        assert!(table.get("claude-haiku").is_none());
        assert!(table.get("GPT-5").is_none());
        assert!(table.get("gpt-5").is_some());
    }

    #[test]
    fn rounded_cost_matches_formula() {
        let table = PricingTable::builtin().unwrap();
        let p = table.get("claude-haiku-4-5-20251001").unwrap();
        let expected = round_to((1200.0 * 1.00 + 400.0 * 5.00) / 1_000_000.0, 8);
        assert_eq!(p.rounded_cost(1200, 400), expected);
        assert_eq!(expected, 0.0032);
    }

    #[test]
    fn zero_tokens_zero_cost() {
        let p = entry("m", 3.0, 15.0);
        assert_eq!(p.cost(0, 0), 0.0);
    }

    #[test]
    fn duplicate_models_rejected() {
        let err = PricingTable::new(vec![entry("a", 1.0, 1.0), entry("a", 2.0, 2.0)]).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn negative_rate_rejected() {
        assert!(PricingTable::new(vec![entry("a", -1.0, 1.0)]).is_err());
    }

    #[test]
    fn parses_custom_toml() {
        let table = PricingTable::from_toml_str(
            r#"
[[models]]
name = "local-llm"
provider = "self-hosted"
input_per_mtok = 0.0
output_per_mtok = 0.0
"#,
        )
        .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("local-llm").unwrap().provider, "self-hosted");
    }

    #[test]
    fn unknown_field_in_table_rejected() {
        let err = PricingTable::from_toml_str(
            "[[models]]\nname = \"x\"\nprovider = \"p\"\ninput = 1.0\noutput = 1.0\n",
        )
        .unwrap_err();
        assert!(matches!(err, TokenwatchError::Pricing { .. }));
    }

    #[test]
    fn bad_override_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pricing.toml");
        std::fs::write(&path, "this is not toml [[[").unwrap();
        let table = PricingTable::load(Some(&path)).unwrap();
        assert_eq!(table, PricingTable::builtin().unwrap());
    }

    #[test]
    fn missing_override_falls_back_to_builtin() {
        let table = PricingTable::load(Some(Path::new("/nonexistent/pricing.toml"))).unwrap();
        assert!(table.get("o3").is_some());
    }

    #[test]
    fn good_override_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pricing.toml");
        std::fs::write(
            &path,
            "[[models]]\nname = \"only\"\nprovider = \"p\"\ninput_per_mtok = 1.0\noutput_per_mtok = 2.0\n",
        )
        .unwrap();
        let table = PricingTable::load(Some(&path)).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn normalize_prefers_exact_then_longest() {
        let table = PricingTable::builtin().unwrap();
        assert_eq!(table.normalize("gpt-4.1").unwrap().name, "gpt-4.1");
        assert_eq!(
            table.normalize("gpt-4.1-mini-2025-04-14").unwrap().name,
            "gpt-4.1-mini"
        );
        assert_eq!(table.normalize("o4-mini-2025-04-16").unwrap().name, "o4-mini");
        assert!(table.normalize("text-embedding-3-large").is_none());
    }

    #[test]
    fn normalize_tie_keeps_table_order() {
        let table =
            PricingTable::new(vec![entry("ab", 1.0, 1.0), entry("bc", 2.0, 2.0)]).unwrap();
        assert_eq!(table.normalize("xabcx").unwrap().name, "ab");
    }
}
