// SPDX-FileCopyrightText: 2026 TokenWatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! USD rounding helpers.

/// Decimal places kept on a stored per-call cost.
pub const COST_DECIMALS: i32 = 8;

/// Decimal places kept on aggregated totals and averages.
pub const SUMMARY_DECIMALS: i32 = 6;

/// Round `value` half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Cost of a call given per-million-token rates, unrounded.
pub fn cost_for(input_tokens: i64, output_tokens: i64, input_rate: f64, output_rate: f64) -> f64 {
    (input_tokens as f64 * input_rate + output_tokens as f64 * output_rate) / 1_000_000.0
}
