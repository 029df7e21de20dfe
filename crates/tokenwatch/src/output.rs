// SPDX-FileCopyrightText: 2026 TokenWatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text and JSON rendering for query subcommands.
//!
//! `--json` prints one pretty JSON document on stdout. Otherwise plain text is
//! printed, colored only when stdout is a terminal.

use std::io::IsTerminal;
use std::path::Path;

use colored::Colorize;
use serde::Serialize;
use tokenwatch_core::Period;
use tokenwatch_cost::{
    AlertKind, BudgetAlert, CostEstimate, ModelCost, ModelSpend, Priority, ProviderSpend,
    SpendSummary, Suggestion, UnknownModel, UsageRecord, UsageReport,
};

/// Output mode chosen once per invocation.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
    color: bool,
}

impl Output {
    pub fn detect(json: bool) -> Self {
        Self {
            json,
            color: !json && std::io::stdout().is_terminal(),
        }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    /// Print any serializable value as indented JSON.
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) {
        println!(
            "{}",
            serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
        );
    }

    pub fn spend(&self, period: &Period, summary: &SpendSummary) {
        if self.json {
            return self.json(summary);
        }
        println!();
        println!("  Spend ({period})");
        println!("  {}", "-".repeat(35));
        println!("    Cost:     ${:.6}", summary.total_cost_usd);
        println!("    Calls:    {}", summary.call_count);
        println!(
            "    Tokens:   {} ({} in / {} out)",
            summary.total_tokens, summary.input_tokens, summary.output_tokens
        );
        println!("    Avg/call: ${:.6}", summary.avg_cost_per_call);
        println!();
    }

    pub fn by_model(&self, rows: &[ModelSpend]) {
        if self.json {
            return self.json(rows);
        }
        if rows.is_empty() {
            println!("No calls recorded.");
            return;
        }
        println!(
            "{:<36} {:<10} {:>12} {:>8} {:>12}",
            "MODEL", "PROVIDER", "COST", "CALLS", "TOKENS"
        );
        for row in rows {
            println!(
                "{:<36} {:<10} {:>12} {:>8} {:>12}",
                row.model,
                row.provider,
                format!("${:.6}", row.total_cost_usd),
                row.call_count,
                row.total_tokens
            );
        }
    }

    pub fn by_provider(&self, rows: &[ProviderSpend]) {
        if self.json {
            return self.json(rows);
        }
        if rows.is_empty() {
            println!("No calls recorded.");
            return;
        }
        println!("{:<12} {:>12} {:>8} {:>12}", "PROVIDER", "COST", "CALLS", "TOKENS");
        for row in rows {
            println!(
                "{:<12} {:>12} {:>8} {:>12}",
                row.provider,
                format!("${:.6}", row.total_cost_usd),
                row.call_count,
                row.total_tokens
            );
        }
    }

    pub fn recent(&self, records: &[UsageRecord]) {
        if self.json {
            return self.json(records);
        }
        if records.is_empty() {
            println!("No calls recorded.");
            return;
        }
        for r in records {
            let label = r.task_label.as_deref().unwrap_or("-");
            println!(
                "{}  {:<36} {:>8} in {:>8} out  ${:.6}  {label}",
                r.timestamp.format("%Y-%m-%d %H:%M:%S"),
                r.model,
                r.input_tokens,
                r.output_tokens,
                r.cost_usd
            );
        }
    }

    pub fn alerts(&self, alerts: &[BudgetAlert]) {
        if self.json {
            return self.json(alerts);
        }
        if alerts.is_empty() {
            println!("No alerts.");
            return;
        }
        for alert in alerts {
            self.alert(alert);
        }
    }

    /// One alert line; warnings in yellow, exceeded ceilings in red.
    pub fn alert(&self, alert: &BudgetAlert) {
        let stamp = alert.timestamp.format("%Y-%m-%d %H:%M:%S");
        if self.color {
            let tag = alert_tag(alert.alert_type);
            let tag = if alert.alert_type.is_warning() {
                tag.yellow()
            } else {
                tag.red()
            };
            println!("{stamp}  {tag} {}", alert.message);
        } else {
            println!("{stamp}  {} {}", alert_tag(alert.alert_type), alert.message);
        }
    }

    pub fn suggestions(&self, tips: &[Suggestion]) {
        if self.json {
            return self.json(tips);
        }
        for tip in tips {
            let savings = tip
                .estimated_monthly_savings_usd
                .filter(|s| *s != 0.0)
                .map(|s| format!(" (save ~${s:.4}/mo)"))
                .unwrap_or_default();
            let priority = format!("[{}]", tip.priority);
            let priority = match (self.color, tip.priority) {
                (false, _) => priority.normal(),
                (true, Priority::High) => priority.red(),
                (true, Priority::Medium) => priority.yellow(),
                (true, Priority::Low) => priority.green(),
            };
            println!("{priority} {}{savings}", tip.message);
        }
    }

    pub fn estimate(&self, estimate: &CostEstimate) {
        if self.json {
            return self.json(estimate);
        }
        println!(
            "{} ({}): {} in + {} out = ${:.6}",
            estimate.model,
            estimate.provider,
            estimate.input_tokens,
            estimate.output_tokens,
            estimate.estimated_cost_usd
        );
        println!(
            "  rates: ${}/1M in, ${}/1M out",
            estimate.input_rate_per_1m, estimate.output_rate_per_1m
        );
    }

    /// Reported on stderr in text mode so scripts can tell it from a result.
    pub fn unknown_model(&self, err: &UnknownModel) {
        if self.json {
            self.json(&serde_json::json!({ "error": err.to_string(), "model": err.model }));
        } else {
            eprintln!("error: {err}");
        }
    }

    pub fn compare(&self, input_tokens: i64, output_tokens: i64, costs: &[ModelCost]) {
        if self.json {
            return self.json(costs);
        }
        println!("{input_tokens} input + {output_tokens} output tokens:");
        for (rank, c) in costs.iter().enumerate() {
            println!(
                "{:>3}. {:<36} {:<10} ${:.6}",
                rank + 1,
                c.model,
                c.provider,
                c.cost_usd
            );
        }
    }

    pub fn exported(&self, path: &Path, report: &UsageReport) {
        if self.json {
            return self.json(&serde_json::json!({
                "path": path.display().to_string(),
                "records": report.records.len(),
                "total_cost_usd": report.summary.total_cost_usd,
            }));
        }
        println!(
            "Wrote {} records (${:.6}) to {}",
            report.records.len(),
            report.summary.total_cost_usd,
            path.display()
        );
    }
}

fn alert_tag(kind: AlertKind) -> &'static str {
    if kind.is_warning() { "[WARN]" } else { "[OVER]" }
}
