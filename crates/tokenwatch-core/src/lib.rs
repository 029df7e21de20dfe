// SPDX-FileCopyrightText: 2026 TokenWatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for TokenWatch.
//!
//! Holds the error type and the small value types every other crate in the
//! workspace agrees on: reporting periods and USD rounding rules.

pub mod error;
pub mod money;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::TokenwatchError;
pub use money::{COST_DECIMALS, SUMMARY_DECIMALS, cost_for, round_to};
pub use types::{Period, PeriodWindow};
