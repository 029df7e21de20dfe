// SPDX-FileCopyrightText: 2026 TokenWatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Budget ceilings and threshold alerts.
//!
//! The monitor holds the singleton [`Budget`] and the append-only alert log.
//! After every recorded call it recomputes today's, this week's and this
//! month's spend from the ledger and fires an alert for each ceiling that is
//! at or above the warning percentage. Alerts are not deduplicated: every call
//! made while a ceiling is crossed fires again.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokenwatch_core::{Period, TokenwatchError};
use tokenwatch_storage::{DataDir, JsonDocument};
use tracing::{info, warn};

use crate::ledger::{UsageLedger, UsageRecord, aggregate, generate_id};

/// Percentage of a ceiling at which a warning alert fires when none is configured.
pub const DEFAULT_ALERT_AT_PERCENT: f64 = 80.0;

/// USD spending ceilings. `None` (or a non-positive value) means no ceiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    #[serde(default)]
    pub daily_usd: Option<f64>,
    #[serde(default)]
    pub weekly_usd: Option<f64>,
    #[serde(default)]
    pub monthly_usd: Option<f64>,
    #[serde(default)]
    pub per_call_usd: Option<f64>,
    #[serde(default = "default_alert_at_percent")]
    pub alert_at_percent: f64,
}

fn default_alert_at_percent() -> f64 {
    DEFAULT_ALERT_AT_PERCENT
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            daily_usd: None,
            weekly_usd: None,
            monthly_usd: None,
            per_call_usd: None,
            alert_at_percent: DEFAULT_ALERT_AT_PERCENT,
        }
    }
}

impl Budget {
    /// The effective ceiling for `kind`, ignoring zero and negative values.
    pub fn ceiling(&self, kind: BudgetKind) -> Option<f64> {
        let raw = match kind {
            BudgetKind::PerCall => self.per_call_usd,
            BudgetKind::Daily => self.daily_usd,
            BudgetKind::Weekly => self.weekly_usd,
            BudgetKind::Monthly => self.monthly_usd,
        };
        raw.filter(|c| c.is_finite() && *c > 0.0)
    }

    /// Whether any ceiling at all is in effect.
    pub fn is_unset(&self) -> bool {
        BudgetKind::ALL.iter().all(|k| self.ceiling(*k).is_none())
    }
}

/// The dimensions a ceiling can be set on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BudgetKind {
    PerCall,
    Daily,
    Weekly,
    Monthly,
}

impl BudgetKind {
    pub const ALL: [BudgetKind; 4] = [
        BudgetKind::PerCall,
        BudgetKind::Daily,
        BudgetKind::Weekly,
        BudgetKind::Monthly,
    ];

    /// The ceilings checked against rolling period totals.
    pub const PERIODIC: [BudgetKind; 3] =
        [BudgetKind::Daily, BudgetKind::Weekly, BudgetKind::Monthly];

    /// Period whose spend this ceiling caps. `None` for per-call.
    pub fn period(self) -> Option<Period> {
        match self {
            Self::PerCall => None,
            Self::Daily => Some(Period::Today),
            Self::Weekly => Some(Period::Week),
            Self::Monthly => Some(Period::Month),
        }
    }

    /// Capitalized name used in messages and the dashboard.
    pub fn label(self) -> &'static str {
        match self {
            Self::PerCall => "Per call",
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
        }
    }

    fn exceeded_alert(self) -> AlertKind {
        match self {
            Self::PerCall => AlertKind::PerCall,
            Self::Daily => AlertKind::Daily,
            Self::Weekly => AlertKind::Weekly,
            Self::Monthly => AlertKind::Monthly,
        }
    }

    fn warning_alert(self) -> Option<AlertKind> {
        match self {
            Self::PerCall => None,
            Self::Daily => Some(AlertKind::DailyWarning),
            Self::Weekly => Some(AlertKind::WeeklyWarning),
            Self::Monthly => Some(AlertKind::MonthlyWarning),
        }
    }
}

/// The `alert_type` of a fired alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Daily,
    Weekly,
    Monthly,
    PerCall,
    DailyWarning,
    WeeklyWarning,
    MonthlyWarning,
}

impl AlertKind {
    pub fn is_warning(self) -> bool {
        matches!(
            self,
            Self::DailyWarning | Self::WeeklyWarning | Self::MonthlyWarning
        )
    }
}

/// A threshold crossing, as persisted in `alerts.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetAlert {
    /// `alert_` followed by eight hex characters.
    pub id: String,
    pub timestamp: NaiveDateTime,
    pub alert_type: AlertKind,
    pub threshold_usd: f64,
    pub current_spend_usd: f64,
    /// Set for per-call alerts.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// Where a ceiling stands relative to current spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BudgetState {
    /// No ceiling; never evaluated.
    Unset,
    UnderThreshold,
    /// At or above the warning percentage, below the ceiling.
    Warning,
    /// At or above the ceiling.
    Exceeded,
}

/// Classify `spend` against a period ceiling.
pub fn classify(spend: f64, ceiling: Option<f64>, alert_at_percent: f64) -> BudgetState {
    let Some(ceiling) = ceiling else {
        return BudgetState::Unset;
    };
    let percent = spend / ceiling * 100.0;
    if percent >= 100.0 {
        BudgetState::Exceeded
    } else if percent >= alert_at_percent {
        BudgetState::Warning
    } else {
        BudgetState::UnderThreshold
    }
}

/// Owns the budget document and the alert log.
pub struct BudgetMonitor {
    budget_document: JsonDocument<Budget>,
    alerts_document: JsonDocument<Vec<BudgetAlert>>,
    budget: Budget,
    alerts: Vec<BudgetAlert>,
}

impl BudgetMonitor {
    /// Load the budget and alert log, degrading to defaults on unreadable files.
    pub fn open(data_dir: &DataDir) -> Self {
        let budget_document: JsonDocument<Budget> = data_dir.budget();
        let alerts_document: JsonDocument<Vec<BudgetAlert>> = data_dir.alerts();
        let budget = budget_document.load().or_default_logged("budget");
        let alerts = alerts_document.load().or_default_logged("alerts");
        Self {
            budget_document,
            alerts_document,
            budget,
            alerts,
        }
    }

    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    /// Replace the budget wholesale and persist it.
    pub fn set_budget(&mut self, budget: Budget) -> Result<&Budget, TokenwatchError> {
        self.budget_document.save(&budget)?;
        info!(
            daily = ?budget.daily_usd,
            weekly = ?budget.weekly_usd,
            monthly = ?budget.monthly_usd,
            per_call = ?budget.per_call_usd,
            alert_at_percent = budget.alert_at_percent,
            "budget set"
        );
        self.budget = budget;
        Ok(&self.budget)
    }

    /// Every alert fired so far, oldest first.
    pub fn alerts(&self) -> &[BudgetAlert] {
        &self.alerts
    }

    /// Spend for a periodic ceiling as of `now`. Zero for per-call.
    pub fn period_spend(&self, kind: BudgetKind, ledger: &UsageLedger, now: NaiveDateTime) -> f64 {
        match kind.period() {
            Some(period) => aggregate(ledger.filter(&period, now)).total_cost_usd,
            None => 0.0,
        }
    }

    /// Current state of one periodic ceiling. Per-call ceilings have no
    /// running state and report `Unset` or `UnderThreshold`.
    pub fn state(&self, kind: BudgetKind, ledger: &UsageLedger, now: NaiveDateTime) -> BudgetState {
        let ceiling = self.budget.ceiling(kind);
        match kind {
            BudgetKind::PerCall if ceiling.is_some() => BudgetState::UnderThreshold,
            BudgetKind::PerCall => BudgetState::Unset,
            _ => classify(
                self.period_spend(kind, ledger, now),
                ceiling,
                self.budget.alert_at_percent,
            ),
        }
    }

    /// Check all ceilings after `record` has been appended to `ledger`.
    ///
    /// Returns the alerts fired by this call, which are already persisted. If
    /// the alert log cannot be written the new alerts are discarded from memory
    /// and the error is returned.
    pub fn evaluate(
        &mut self,
        record: &UsageRecord,
        ledger: &UsageLedger,
        now: NaiveDateTime,
    ) -> Result<Vec<BudgetAlert>, TokenwatchError> {
        let mut fired = Vec::new();

        if let Some(ceiling) = self
            .budget
            .ceiling(BudgetKind::PerCall)
            .filter(|c| record.cost_usd > *c)
        {
            fired.push(BudgetAlert {
                id: generate_id("alert"),
                timestamp: now,
                alert_type: AlertKind::PerCall,
                threshold_usd: ceiling,
                current_spend_usd: record.cost_usd,
                model: Some(record.model.clone()),
                message: format!(
                    "Single call ${:.6} on {} exceeded limit ${ceiling:.2}",
                    record.cost_usd, record.model
                ),
            });
        }

        for kind in BudgetKind::PERIODIC {
            let ceiling = self.budget.ceiling(kind);
            let Some(limit) = ceiling else { continue };
            let spend = self.period_spend(kind, ledger, now);
            let percent = spend / limit * 100.0;
            let (alert_type, message) = match classify(spend, ceiling, self.budget.alert_at_percent)
            {
                BudgetState::Exceeded => (
                    kind.exceeded_alert(),
                    format!(
                        "{} budget EXCEEDED: ${spend:.4} / ${limit:.2}",
                        kind.label()
                    ),
                ),
                BudgetState::Warning => match kind.warning_alert() {
                    Some(alert_type) => (
                        alert_type,
                        format!(
                            "{} budget at {percent:.0}%: ${spend:.4} / ${limit:.2}",
                            kind.label()
                        ),
                    ),
                    None => continue,
                },
                BudgetState::UnderThreshold | BudgetState::Unset => continue,
            };
            fired.push(BudgetAlert {
                id: generate_id("alert"),
                timestamp: now,
                alert_type,
                threshold_usd: limit,
                current_spend_usd: spend,
                model: None,
                message,
            });
        }

        if fired.is_empty() {
            return Ok(fired);
        }

        let kept = self.alerts.len();
        self.alerts.extend(fired.iter().cloned());
        if let Err(e) = self.alerts_document.save(&self.alerts) {
            self.alerts.truncate(kept);
            return Err(e);
        }

        for alert in &fired {
            warn!(
                alert_type = %alert.alert_type,
                threshold_usd = alert.threshold_usd,
                current_spend_usd = alert.current_spend_usd,
                "budget alert: {}",
                alert.message
            );
        }
        Ok(fired)
    }
}
