// SPDX-FileCopyrightText: 2026 TokenWatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage tracking, pricing and budget alerts for TokenWatch.
//!
//! This crate provides:
//! - **Pricing**: per-model USD rates loaded from a TOML table
//! - **Ledger**: persisted usage records with period filtering and rollups
//! - **Budget monitor**: per-call, daily, weekly and monthly ceilings with alerts
//! - **Advisor**: configurable cost-saving heuristics
//! - **Estimation**: single-model estimates and cross-model comparison
//! - **Reports**: JSON export and a text dashboard
//! - **Adapters**: usage extraction from Anthropic and OpenAI responses
//!
//! [`TokenWatch`] ties them together.

pub mod adapters;
pub mod advisor;
pub mod budget;
pub mod estimate;
pub mod ledger;
pub mod pricing;
pub mod report;
pub mod tracker;

pub use adapters::{ExtractedUsage, ResponseProvider};
pub use advisor::{Advisor, Priority, Suggestion, SuggestionKind};
pub use budget::{AlertKind, Budget, BudgetAlert, BudgetKind, BudgetMonitor, BudgetState};
pub use estimate::{CostEstimate, ModelCost, UnknownModel};
pub use ledger::{ModelSpend, ProviderSpend, SpendSummary, UsageLedger, UsageRecord};
pub use pricing::{ModelPricing, PricingTable, UNKNOWN_PROVIDER};
pub use report::UsageReport;
pub use tracker::{Clock, DEFAULT_RECENT_LIMIT, TokenWatch};
