// SPDX-FileCopyrightText: 2026 TokenWatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The [`TokenWatch`] facade.
//!
//! Owns the pricing table, usage ledger, budget monitor and advisor, and
//! exposes the recording and query surface used by the CLI and by library
//! callers. All operations are synchronous; only the ones that write to disk
//! return errors.

use std::path::Path;

use chrono::{Local, NaiveDateTime};
use tokenwatch_config::{AdvisorConfig, TokenwatchConfig};
use tokenwatch_core::{Period, TokenwatchError};
use tokenwatch_storage::DataDir;
use tracing::{debug, warn};

use crate::adapters::{ExtractedUsage, ResponseProvider};
use crate::advisor::{Advisor, Suggestion};
use crate::budget::{Budget, BudgetAlert, BudgetKind, BudgetMonitor, BudgetState};
use crate::estimate::{self, CostEstimate, ModelCost, UnknownModel};
use crate::ledger::{
    ModelSpend, ProviderSpend, SpendSummary, UsageLedger, UsageRecord, aggregate,
    spend_by_model, spend_by_provider,
};
use crate::pricing::PricingTable;
use crate::report::{self, DashboardView, UsageReport};

/// Number of calls returned by `get_recent_calls` when no limit is given.
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Source of "now" for timestamps and period windows.
pub type Clock = Box<dyn Fn() -> NaiveDateTime + Send + Sync>;

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Token usage tracker bound to one data directory.
pub struct TokenWatch {
    pricing: PricingTable,
    ledger: UsageLedger,
    monitor: BudgetMonitor,
    advisor: Advisor,
    clock: Clock,
}

impl TokenWatch {
    /// Open the data directory and pricing table named by `config`.
    pub fn open(config: &TokenwatchConfig) -> Result<Self, TokenwatchError> {
        let data_dir = DataDir::open(&config.storage.data_dir, config.storage.atomic_writes)?;
        let pricing = PricingTable::load(config.pricing.table_path.as_deref().map(Path::new))?;
        Ok(Self::with_parts(&data_dir, pricing, config.advisor.clone()))
    }

    /// Assemble a tracker from already-opened parts.
    pub fn with_parts(data_dir: &DataDir, pricing: PricingTable, advisor: AdvisorConfig) -> Self {
        let ledger = UsageLedger::open(data_dir);
        let monitor = BudgetMonitor::open(data_dir);
        debug!(
            data_dir = %data_dir.root().display(),
            records = ledger.len(),
            alerts = monitor.alerts().len(),
            models = pricing.len(),
            "tracker opened"
        );
        Self {
            pricing,
            ledger,
            monitor,
            advisor: Advisor::new(advisor),
            clock: Box::new(local_now),
        }
    }

    /// Replace the wall clock, e.g. to pin "now" in tests.
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDateTime + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    /// Record one API call, persist it, and check budgets.
    ///
    /// Unknown models are recorded at zero cost with a warning. Fails only when
    /// the ledger or alert log cannot be written. The ledger is saved first: if
    /// the alert log write then fails, the error is returned but the record
    /// stays persisted, and the alerts it would have fired are dropped.
    pub fn record_usage(
        &mut self,
        model: &str,
        input_tokens: i64,
        output_tokens: i64,
        task_label: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<UsageRecord, TokenwatchError> {
        let pricing = self.pricing.get(model);
        if pricing.is_none() {
            warn!(model, "unknown model, cost recorded as $0.00; add it to the pricing table");
        }
        let now = self.now();
        let record = UsageRecord::new(model, input_tokens, output_tokens, pricing, now)
            .with_task_label(task_label.map(str::to_string))
            .with_session_id(session_id.map(str::to_string));

        self.ledger.append(record.clone())?;
        debug!(
            id = %record.id,
            model = %record.model,
            cost_usd = record.cost_usd,
            total_tokens = record.total_tokens,
            "usage recorded"
        );
        self.monitor.evaluate(&record, &self.ledger, now)?;
        Ok(record)
    }

    /// Record usage read from an Anthropic Messages API response body.
    pub fn record_from_anthropic_response(
        &mut self,
        body: &str,
        task_label: Option<&str>,
    ) -> Result<UsageRecord, TokenwatchError> {
        self.record_from_response(ResponseProvider::Anthropic, body, task_label)
    }

    /// Record usage read from an OpenAI Chat Completions response body.
    pub fn record_from_openai_response(
        &mut self,
        body: &str,
        task_label: Option<&str>,
    ) -> Result<UsageRecord, TokenwatchError> {
        self.record_from_response(ResponseProvider::OpenAi, body, task_label)
    }

    pub fn record_from_response(
        &mut self,
        provider: ResponseProvider,
        body: &str,
        task_label: Option<&str>,
    ) -> Result<UsageRecord, TokenwatchError> {
        let ExtractedUsage {
            model,
            input_tokens,
            output_tokens,
        } = provider.extract(body, &self.pricing)?;
        self.record_usage(&model, input_tokens, output_tokens, task_label, None)
    }

    /// Replace the budget and persist it.
    pub fn set_budget(&mut self, budget: Budget) -> Result<Budget, TokenwatchError> {
        self.monitor.set_budget(budget).cloned()
    }

    pub fn budget(&self) -> &Budget {
        self.monitor.budget()
    }

    pub fn budget_state(&self, kind: BudgetKind) -> BudgetState {
        self.monitor.state(kind, &self.ledger, self.now())
    }

    fn records_in(&self, period: &Period) -> Vec<&UsageRecord> {
        self.ledger.filter(period, self.now())
    }

    pub fn get_spend(&self, period: &Period) -> SpendSummary {
        aggregate(self.records_in(period))
    }

    pub fn get_spend_by_model(&self, period: &Period) -> Vec<ModelSpend> {
        spend_by_model(self.records_in(period))
    }

    pub fn get_spend_by_provider(&self, period: &Period) -> Vec<ProviderSpend> {
        spend_by_provider(self.records_in(period))
    }

    /// The `limit` most recent calls, newest first.
    pub fn get_recent_calls(&self, limit: usize) -> Vec<UsageRecord> {
        self.ledger.recent(limit).into_iter().cloned().collect()
    }

    /// The alert log, oldest first.
    ///
    /// Alerts have no acknowledged state, so `unacknowledged_only` selects
    /// the same entries as the full log.
    pub fn get_alerts(&self, _unacknowledged_only: bool) -> &[BudgetAlert] {
        self.monitor.alerts()
    }

    /// Advice based on the last thirty days, most urgent first.
    pub fn get_optimization_suggestions(&self) -> Vec<Suggestion> {
        self.advisor
            .suggest(&self.records_in(&Period::Month), &self.pricing)
    }

    pub fn estimate_cost(
        &self,
        model: &str,
        input_tokens: i64,
        output_tokens: i64,
    ) -> Result<CostEstimate, UnknownModel> {
        estimate::estimate_cost(&self.pricing, model, input_tokens, output_tokens)
    }

    pub fn compare_models(&self, input_tokens: i64, output_tokens: i64) -> Vec<ModelCost> {
        estimate::compare_models(&self.pricing, input_tokens, output_tokens)
    }

    /// Assemble the report for `period` without writing it.
    pub fn build_report(&self, period: &Period) -> UsageReport {
        let records = self.records_in(period);
        UsageReport {
            report_period: period.clone(),
            generated_at: self.now(),
            summary: aggregate(records.iter().copied()),
            by_model: spend_by_model(records.iter().copied()),
            by_provider: spend_by_provider(records.iter().copied()),
            optimization_suggestions: self.get_optimization_suggestions(),
            records: records.into_iter().cloned().collect(),
        }
    }

    /// Write the report for `period` to `path` as JSON and return it.
    pub fn export_report(&self, path: &Path, period: &Period) -> Result<UsageReport, TokenwatchError> {
        let report = self.build_report(period);
        report::write_report(path, &report)?;
        Ok(report)
    }

    /// Human-readable overview; `period` selects the model breakdown.
    pub fn format_dashboard(&self, period: &Period) -> String {
        let today = self.get_spend(&Period::Today);
        let week = self.get_spend(&Period::Week);
        let month = self.get_spend(&Period::Month);
        let selected = self.records_in(period);
        let period_total_usd = aggregate(selected.iter().copied()).total_cost_usd;
        let by_model = spend_by_model(selected);
        let suggestions = self.get_optimization_suggestions();

        report::render_dashboard(&DashboardView {
            today: &today,
            week: &week,
            month: &month,
            budget: self.budget(),
            period,
            period_total_usd,
            by_model: &by_model,
            suggestions: &suggestions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn tracker(dir: &Path) -> TokenWatch {
        let data_dir = DataDir::open(dir, true).unwrap();
        TokenWatch::with_parts(
            &data_dir,
            PricingTable::builtin().unwrap(),
            AdvisorConfig::default(),
        )
        .with_clock(|| fixed("2026-02-16T12:00:00"))
    }

    #[test]
    fn records_with_fixed_clock() {
        let tmp = tempfile::tempdir().unwrap();
        let mut tw = tracker(tmp.path());
        let r = tw
            .record_usage("claude-haiku-4-5-20251001", 1200, 400, Some("summarize"), Some("s1"))
            .unwrap();
        assert_eq!(r.timestamp, fixed("2026-02-16T12:00:00"));
        assert_eq!(r.task_label.as_deref(), Some("summarize"));
        assert_eq!(r.session_id.as_deref(), Some("s1"));
        assert_eq!(tw.get_spend(&Period::Today).call_count, 1);
    }

    #[test]
    fn open_uses_configured_data_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = TokenwatchConfig::default();
        config.storage.data_dir = tmp.path().join("state").display().to_string();
        let mut tw = TokenWatch::open(&config).unwrap();
        tw.record_usage("o3", 10, 10, None, None).unwrap();
        assert!(tmp.path().join("state").join("usage.json").is_file());
    }

    #[test]
    fn budget_state_tracks_spend() {
        let tmp = tempfile::tempdir().unwrap();
        let mut tw = tracker(tmp.path());
        assert_eq!(tw.budget_state(BudgetKind::Daily), BudgetState::Unset);
        tw.set_budget(Budget {
            daily_usd: Some(0.01),
            ..Budget::default()
        })
        .unwrap();
        assert_eq!(tw.budget_state(BudgetKind::Daily), BudgetState::UnderThreshold);
        // 1000 in / 1000 out on opus: $0.03.
        tw.record_usage("claude-opus-4-6", 1000, 1000, None, None).unwrap();
        assert_eq!(tw.budget_state(BudgetKind::Daily), BudgetState::Exceeded);
        assert_eq!(tw.get_alerts(true).len(), 1);
    }

    #[test]
    fn dashboard_mentions_selected_period() {
        let tmp = tempfile::tempdir().unwrap();
        let mut tw = tracker(tmp.path());
        tw.record_usage("gemini-2.5-flash", 1000, 1000, None, None).unwrap();
        let text = tw.format_dashboard(&Period::All);
        assert!(text.contains("BY MODEL (all)"));
        assert!(text.contains("gemini-2.5-flash"));
        assert!(text.contains("No budget set."));
    }

    #[test]
    fn openai_response_is_normalized_and_priced() {
        let tmp = tempfile::tempdir().unwrap();
        let mut tw = tracker(tmp.path());
        let body = r#"{"model": "o4-mini-2025-04-16", "usage": {"prompt_tokens": 1000, "completion_tokens": 0}}"#;
        let r = tw.record_from_openai_response(body, Some("draft")).unwrap();
        assert_eq!(r.model, "o4-mini");
        assert_eq!(r.provider, "openai");
        assert!(r.cost_usd > 0.0);
        assert_eq!(r.task_label.as_deref(), Some("draft"));
    }

    #[test]
    fn bad_response_records_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let mut tw = tracker(tmp.path());
        assert!(tw.record_from_anthropic_response("{}", None).is_err());
        assert!(tw.get_recent_calls(DEFAULT_RECENT_LIMIT).is_empty());
    }

    #[test]
    fn extreme_token_counts_do_not_overflow() {
        let tmp = tempfile::tempdir().unwrap();
        let mut tw = tracker(tmp.path());
        let r = tw.record_usage("o3", i64::MAX, 1, None, None).unwrap();
        assert_eq!(r.total_tokens, i64::MAX);
        tw.record_usage("o3", 5_000_000_000_000_000_000, 0, None, None)
            .unwrap();
        let all = tw.get_spend(&Period::All);
        assert_eq!(all.call_count, 2);
        assert_eq!(all.total_tokens, i64::MAX);
    }

    #[test]
    fn alert_log_failure_keeps_the_persisted_record() {
        let tmp = tempfile::tempdir().unwrap();
        let mut tw = tracker(tmp.path());
        tw.set_budget(Budget {
            per_call_usd: Some(0.000_001),
            ..Budget::default()
        })
        .unwrap();
        // A directory where the alert log should be makes its save fail.
        std::fs::create_dir(tmp.path().join("alerts.json")).unwrap();
        std::fs::write(tmp.path().join("alerts.json").join("keep"), "").unwrap();

        let err = tw
            .record_usage("claude-opus-4-6", 1_000, 1_000, None, None)
            .unwrap_err();
        assert!(matches!(err, TokenwatchError::Storage { .. }));
        assert_eq!(tw.get_recent_calls(DEFAULT_RECENT_LIMIT).len(), 1);
        assert!(tw.get_alerts(false).is_empty());

        let reopened = tracker(tmp.path());
        assert_eq!(reopened.get_recent_calls(DEFAULT_RECENT_LIMIT).len(), 1);
    }
}
