// SPDX-FileCopyrightText: 2026 TokenWatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON usage reports and the plain-text dashboard.

use std::fmt;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Serialize;
use tokenwatch_core::{Period, TokenwatchError};
use tracing::info;

use crate::advisor::{Priority, Suggestion};
use crate::budget::{Budget, BudgetKind, BudgetState, classify};
use crate::ledger::{ModelSpend, ProviderSpend, SpendSummary, UsageRecord};

/// Width of budget and model bars, in cells.
const BAR_WIDTH: usize = 20;
const MODEL_COLUMN: usize = 35;
const TOP_MODELS: usize = 5;
const TOP_TIPS: usize = 3;
const RULE: &str = "──────────────────────────────────────────────────────────────";

/// Everything known about one period, as written by `export_report`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageReport {
    pub report_period: Period,
    pub generated_at: NaiveDateTime,
    pub summary: SpendSummary,
    pub by_model: Vec<ModelSpend>,
    pub by_provider: Vec<ProviderSpend>,
    pub optimization_suggestions: Vec<Suggestion>,
    pub records: Vec<UsageRecord>,
}

/// Write `report` to `path` as indented JSON, replacing any existing file.
pub fn write_report(path: &Path, report: &UsageReport) -> Result<(), TokenwatchError> {
    let encoded = serde_json::to_vec_pretty(report)
        .map_err(|e| TokenwatchError::serialization("usage report", e))?;
    std::fs::write(path, encoded).map_err(|e| TokenwatchError::storage(path, e))?;
    info!(path = %path.display(), records = report.records.len(), "report exported");
    Ok(())
}

/// Inputs for [`render_dashboard`].
#[derive(Debug, Clone, Copy)]
pub struct DashboardView<'a> {
    pub today: &'a SpendSummary,
    pub week: &'a SpendSummary,
    pub month: &'a SpendSummary,
    pub budget: &'a Budget,
    /// Period the model breakdown covers.
    pub period: &'a Period,
    pub period_total_usd: f64,
    pub by_model: &'a [ModelSpend],
    pub suggestions: &'a [Suggestion],
}

/// Render the dashboard as multi-line text.
pub fn render_dashboard(view: &DashboardView<'_>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_dashboard(&mut out, view);
    out
}

/// Write the dashboard text into any formatter sink.
pub fn write_dashboard(out: &mut impl fmt::Write, view: &DashboardView<'_>) -> fmt::Result {
    writeln!(out, "TOKENWATCH DASHBOARD")?;
    writeln!(out, "{RULE}")?;
    writeln!(out)?;

    writeln!(out, "SPENDING SUMMARY")?;
    writeln!(out, "{RULE}")?;
    for (label, summary) in [
        ("Today:", view.today),
        ("Week:", view.week),
        ("Month:", view.month),
    ] {
        writeln!(
            out,
            "  {label:<8} ${:.4}  ({} calls, {} tokens)",
            summary.total_cost_usd,
            summary.call_count,
            thousands(summary.total_tokens)
        )?;
    }
    writeln!(out)?;

    write_budget(out, view)?;
    writeln!(out)?;

    writeln!(out, "BY MODEL ({})", view.period)?;
    writeln!(out, "{RULE}")?;
    if view.by_model.is_empty() {
        writeln!(out, "  No calls recorded.")?;
    }
    for stats in view.by_model.iter().take(TOP_MODELS) {
        let share = stats.total_cost_usd / view.period_total_usd.max(0.001);
        writeln!(
            out,
            "  {:<width$} ${:.4}  {}",
            truncate(&stats.model, MODEL_COLUMN),
            stats.total_cost_usd,
            "█".repeat(bar_cells(share * 100.0)),
            width = MODEL_COLUMN
        )?;
    }
    writeln!(out)?;

    writeln!(out, "OPTIMIZATION TIPS")?;
    writeln!(out, "{RULE}")?;
    for tip in view.suggestions.iter().take(TOP_TIPS) {
        let savings = match tip.estimated_monthly_savings_usd {
            Some(s) if s != 0.0 => format!(" (save ~${s:.4}/mo)"),
            _ => String::new(),
        };
        writeln!(out, "  {} {}{savings}", marker(tip.priority), tip.message)?;
    }
    Ok(())
}

fn write_budget(out: &mut impl fmt::Write, view: &DashboardView<'_>) -> fmt::Result {
    let budget = view.budget;
    if budget.is_unset() {
        writeln!(out, "BUDGET")?;
        writeln!(out, "{RULE}")?;
        return writeln!(out, "  No budget set.");
    }

    writeln!(out, "BUDGET STATUS")?;
    writeln!(out, "{RULE}")?;
    for (kind, summary) in [
        (BudgetKind::Daily, view.today),
        (BudgetKind::Weekly, view.week),
        (BudgetKind::Monthly, view.month),
    ] {
        let Some(limit) = budget.ceiling(kind) else {
            continue;
        };
        let spend = summary.total_cost_usd;
        let percent = spend / limit * 100.0;
        let filled = bar_cells(percent);
        let status = match classify(spend, Some(limit), budget.alert_at_percent) {
            BudgetState::Exceeded => "OVER",
            BudgetState::Warning => "WARN",
            BudgetState::UnderThreshold | BudgetState::Unset => "OK",
        };
        writeln!(
            out,
            "  {:<8} [{}{}] {percent:.0}% ${spend:.4} / ${limit:.2} {status}",
            format!("{}:", kind.label()),
            "█".repeat(filled),
            "░".repeat(BAR_WIDTH - filled),
        )?;
    }
    if let Some(limit) = budget.ceiling(BudgetKind::PerCall) {
        writeln!(out, "  Per call limit: ${limit:.2}")?;
    }
    Ok(())
}

/// Filled cells for a percentage, five percent per cell, clamped to the bar.
fn bar_cells(percent: f64) -> usize {
    if !percent.is_finite() || percent <= 0.0 {
        return 0;
    }
    ((percent / 5.0) as usize).min(BAR_WIDTH)
}

fn marker(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "[HIGH]",
        Priority::Medium => "[MED] ",
        Priority::Low => "[LOW] ",
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// `1234567` becomes `1,234,567`.
fn thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
