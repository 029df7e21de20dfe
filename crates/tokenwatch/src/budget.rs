// SPDX-FileCopyrightText: 2026 TokenWatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tokenwatch budget` command implementation.
//!
//! With no flags, shows the current ceilings and where spend stands against
//! them. Flags update only the ceilings they name; the rest of the stored
//! budget is kept unless `--replace` starts from an empty budget. A ceiling
//! of `0` clears it.

use clap::Args;
use serde::Serialize;
use tokenwatch_core::TokenwatchError;
use tokenwatch_cost::{Budget, BudgetKind, BudgetState, TokenWatch};

use crate::output::Output;

#[derive(Args, Debug, Default)]
pub struct BudgetArgs {
    /// Daily ceiling in USD.
    #[arg(long)]
    pub daily: Option<f64>,
    /// Rolling seven-day ceiling in USD.
    #[arg(long)]
    pub weekly: Option<f64>,
    /// Rolling thirty-day ceiling in USD.
    #[arg(long)]
    pub monthly: Option<f64>,
    /// Ceiling on any single call in USD.
    #[arg(long)]
    pub per_call: Option<f64>,
    /// Percentage of a ceiling at which a warning fires.
    #[arg(long)]
    pub alert_at: Option<f64>,
    /// Discard stored ceilings not given as flags.
    #[arg(long)]
    pub replace: bool,
}

impl BudgetArgs {
    fn is_empty(&self) -> bool {
        self.daily.is_none()
            && self.weekly.is_none()
            && self.monthly.is_none()
            && self.per_call.is_none()
            && self.alert_at.is_none()
            && !self.replace
    }

    /// `current` with every given flag applied.
    fn apply(&self, current: &Budget) -> Budget {
        let empty = Budget::default();
        let current = if self.replace { &empty } else { current };
        let ceiling = |flag: Option<f64>, old: Option<f64>| match flag {
            Some(v) if v <= 0.0 => None,
            Some(v) => Some(v),
            None => old,
        };
        Budget {
            daily_usd: ceiling(self.daily, current.daily_usd),
            weekly_usd: ceiling(self.weekly, current.weekly_usd),
            monthly_usd: ceiling(self.monthly, current.monthly_usd),
            per_call_usd: ceiling(self.per_call, current.per_call_usd),
            alert_at_percent: self.alert_at.unwrap_or(current.alert_at_percent),
        }
    }
}

/// Structured budget output for `--json` mode.
#[derive(Debug, Serialize)]
struct BudgetStatus<'a> {
    budget: &'a Budget,
    daily: BudgetState,
    weekly: BudgetState,
    monthly: BudgetState,
}

pub fn run_budget(tw: &mut TokenWatch, out: &Output, args: &BudgetArgs) -> Result<(), TokenwatchError> {
    if !args.is_empty() {
        let updated = args.apply(tw.budget());
        tw.set_budget(updated)?;
    }

    let budget = tw.budget();
    if out.is_json() {
        out.json(&BudgetStatus {
            budget,
            daily: tw.budget_state(BudgetKind::Daily),
            weekly: tw.budget_state(BudgetKind::Weekly),
            monthly: tw.budget_state(BudgetKind::Monthly),
        });
        return Ok(());
    }

    if budget.is_unset() {
        println!("No budget set.");
        return Ok(());
    }
    for kind in BudgetKind::ALL {
        let Some(limit) = budget.ceiling(kind) else {
            continue;
        };
        match kind {
            BudgetKind::PerCall => println!("{:<9} ${limit:.2}", format!("{}:", kind.label())),
            _ => println!(
                "{:<9} ${limit:.2}  ({})",
                format!("{}:", kind.label()),
                tw.budget_state(kind)
            ),
        }
    }
    println!("Warn at:  {:.0}%", budget.alert_at_percent);
    Ok(())
}
