// SPDX-FileCopyrightText: 2026 TokenWatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local persistence for TokenWatch.
//!
//! State lives in three small JSON documents inside one data directory. Loads
//! return an explicit [`LoadOutcome`] so callers decide how to degrade; saves
//! rewrite the whole document, optionally through write-temp-then-rename.

pub mod document;
pub mod layout;

pub use document::{JsonDocument, LoadOutcome};
pub use layout::{ALERTS_FILE, BUDGET_FILE, DataDir, USAGE_FILE};
