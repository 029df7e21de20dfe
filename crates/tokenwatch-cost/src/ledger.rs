// SPDX-FileCopyrightText: 2026 TokenWatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage ledger persisted as a single JSON array.
//!
//! Every recorded API call becomes an immutable [`UsageRecord`]. The ledger
//! keeps all records in memory and rewrites `usage.json` on each append.
//! Aggregation helpers are free functions so the budget monitor, the advisor
//! and the report builder can share them over any filtered slice.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tokenwatch_core::{Period, SUMMARY_DECIMALS, TokenwatchError, round_to};
use tokenwatch_storage::{DataDir, JsonDocument};
use tracing::debug;

use crate::pricing::{ModelPricing, UNKNOWN_PROVIDER};

/// A single recorded API call.
///
/// Field names are the on-disk format of `usage.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// `usage_` followed by eight hex characters.
    pub id: String,
    /// Local wall-clock time of the call.
    pub timestamp: NaiveDateTime,
    pub model: String,
    /// Provider from the pricing table, or `"unknown"`.
    pub provider: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub total_tokens: i64,
    /// Cost at the time of recording, rounded to eight decimals.
    pub cost_usd: f64,
    #[serde(default)]
    pub task_label: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl UsageRecord {
    /// Price a call and stamp it with a fresh id.
    ///
    /// `pricing` is `None` for models missing from the table, which records a
    /// zero cost against the unknown provider.
    pub fn new(
        model: impl Into<String>,
        input_tokens: i64,
        output_tokens: i64,
        pricing: Option<&ModelPricing>,
        timestamp: NaiveDateTime,
    ) -> Self {
        let (provider, cost_usd) = match pricing {
            Some(p) => (p.provider.clone(), p.rounded_cost(input_tokens, output_tokens)),
            None => (UNKNOWN_PROVIDER.to_string(), 0.0),
        };
        Self {
            id: generate_id("usage"),
            timestamp,
            model: model.into(),
            provider,
            input_tokens,
            output_tokens,
            total_tokens: input_tokens.saturating_add(output_tokens),
            cost_usd,
            task_label: None,
            session_id: None,
        }
    }

    pub fn with_task_label(mut self, task_label: Option<String>) -> Self {
        self.task_label = task_label;
        self
    }

    pub fn with_session_id(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id;
        self
    }
}

/// `<prefix>_` followed by the first eight hex digits of a v4 UUID.
pub(crate) fn generate_id(prefix: &str) -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}", &hex[..8])
}

/// Append-only record store backed by `usage.json`.
pub struct UsageLedger {
    document: JsonDocument<Vec<UsageRecord>>,
    records: Vec<UsageRecord>,
}

impl UsageLedger {
    /// Load the ledger from `data_dir`.
    ///
    /// A missing file is an empty ledger. A corrupt one is logged and also
    /// treated as empty; it is overwritten by the next append.
    pub fn open(data_dir: &DataDir) -> Self {
        let document: JsonDocument<Vec<UsageRecord>> = data_dir.usage();
        let records = document.load().or_default_logged("usage");
        debug!(path = %document.path().display(), count = records.len(), "usage ledger loaded");
        Self { document, records }
    }

    /// Append `record` and persist the whole ledger.
    ///
    /// If the write fails the record is dropped again so memory and disk agree.
    pub fn append(&mut self, record: UsageRecord) -> Result<(), TokenwatchError> {
        self.records.push(record);
        if let Err(e) = self.document.save(&self.records) {
            self.records.pop();
            return Err(e);
        }
        Ok(())
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[UsageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records whose timestamp falls inside `period` as seen from `now`.
    ///
    /// An unrecognized period selects every record.
    pub fn filter(&self, period: &Period, now: NaiveDateTime) -> Vec<&UsageRecord> {
        if period.is_fallback() {
            debug!(%period, "unrecognized period, selecting all records");
        }
        let window = period.window(now);
        self.records
            .iter()
            .filter(|r| window.contains(r.timestamp))
            .collect()
    }

    /// The `limit` most recent records, newest first.
    pub fn recent(&self, limit: usize) -> Vec<&UsageRecord> {
        let mut sorted: Vec<&UsageRecord> = self.records.iter().collect();
        sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        sorted.truncate(limit);
        sorted
    }
}

/// Totals over a set of records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendSummary {
    pub total_cost_usd: f64,
    pub total_tokens: i64,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub call_count: usize,
    pub avg_cost_per_call: f64,
}

/// Spend attributed to one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSpend {
    pub model: String,
    /// Provider of the first record seen for this model.
    pub provider: String,
    pub total_cost_usd: f64,
    pub total_tokens: i64,
    pub call_count: usize,
    pub avg_cost_per_call: f64,
}

/// Spend attributed to one provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderSpend {
    pub provider: String,
    pub total_cost_usd: f64,
    pub total_tokens: i64,
    pub call_count: usize,
}

fn raw_cost<'a>(records: impl IntoIterator<Item = &'a UsageRecord>) -> f64 {
    records.into_iter().map(|r| r.cost_usd).sum()
}

/// Sum costs and tokens. The average is zero for an empty set.
pub fn aggregate<'a>(records: impl IntoIterator<Item = &'a UsageRecord>) -> SpendSummary {
    let mut total_cost = 0.0;
    let mut summary = SpendSummary {
        total_cost_usd: 0.0,
        total_tokens: 0,
        input_tokens: 0,
        output_tokens: 0,
        call_count: 0,
        avg_cost_per_call: 0.0,
    };
    for r in records {
        total_cost += r.cost_usd;
        summary.total_tokens = summary.total_tokens.saturating_add(r.total_tokens);
        summary.input_tokens = summary.input_tokens.saturating_add(r.input_tokens);
        summary.output_tokens = summary.output_tokens.saturating_add(r.output_tokens);
        summary.call_count += 1;
    }
    summary.total_cost_usd = round_to(total_cost, SUMMARY_DECIMALS);
    if summary.call_count > 0 {
        summary.avg_cost_per_call =
            round_to(total_cost / summary.call_count as f64, SUMMARY_DECIMALS);
    }
    summary
}

/// Group records by `key_fn`, most expensive group first.
///
/// Groups with equal cost keep the order in which their key was first seen.
pub fn group_by<'a, K, F>(
    records: impl IntoIterator<Item = &'a UsageRecord>,
    key_fn: F,
) -> Vec<(K, Vec<&'a UsageRecord>)>
where
    K: Eq + Hash + Clone,
    F: Fn(&UsageRecord) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<&'a UsageRecord>)> = Vec::new();
    for record in records {
        let key = key_fn(record);
        match index.get(&key) {
            Some(&i) => groups[i].1.push(record),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![record]));
            }
        }
    }

    let mut costed: Vec<(f64, (K, Vec<&'a UsageRecord>))> = groups
        .into_iter()
        .map(|group| (raw_cost(group.1.iter().copied()), group))
        .collect();
    costed.sort_by(|a, b| b.0.total_cmp(&a.0));
    costed.into_iter().map(|(_, group)| group).collect()
}

/// Per-model breakdown, most expensive first.
pub fn spend_by_model<'a>(records: impl IntoIterator<Item = &'a UsageRecord>) -> Vec<ModelSpend> {
    group_by(records, |r| r.model.clone())
        .into_iter()
        .map(|(model, group)| {
            let summary = aggregate(group.iter().copied());
            ModelSpend {
                provider: group[0].provider.clone(),
                model,
                total_cost_usd: summary.total_cost_usd,
                total_tokens: summary.total_tokens,
                call_count: summary.call_count,
                avg_cost_per_call: summary.avg_cost_per_call,
            }
        })
        .collect()
}

/// Per-provider breakdown, most expensive first.
pub fn spend_by_provider<'a>(
    records: impl IntoIterator<Item = &'a UsageRecord>,
) -> Vec<ProviderSpend> {
    group_by(records, |r| r.provider.clone())
        .into_iter()
        .map(|(provider, group)| {
            let summary = aggregate(group.iter().copied());
            ProviderSpend {
                provider,
                total_cost_usd: summary.total_cost_usd,
                total_tokens: summary.total_tokens,
                call_count: summary.call_count,
            }
        })
        .collect()
}
