// SPDX-FileCopyrightText: 2026 TokenWatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for TokenWatch.

use std::path::PathBuf;

use thiserror::Error;

/// The primary error type used across the TokenWatch crates.
///
/// Recoverable conditions (unknown models, unreadable persisted state, malformed
/// periods) never surface here: they degrade to a safe default plus a warning.
/// What remains are failures the caller has to see, such as a write that could
/// not reach the disk.
#[derive(Debug, Error)]
pub enum TokenwatchError {
    /// Configuration errors (invalid values, unreadable explicit config file).
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem errors while reading or writing a persisted document.
    #[error("storage error at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// JSON or TOML encoding/decoding failures.
    #[error("serialization error ({context}): {source}")]
    Serialization {
        context: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Pricing table could not be built (bad data file, duplicate models).
    #[error("pricing error: {message}")]
    Pricing {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A provider response could not be read by an adapter.
    #[error("adapter error: {message}")]
    Adapter {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TokenwatchError {
    /// Wrap an I/O (or other filesystem) failure for the given path.
    pub fn storage(
        path: impl Into<PathBuf>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Wrap an encoding/decoding failure with a short description of what was
    /// being processed.
    pub fn serialization(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Serialization {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
