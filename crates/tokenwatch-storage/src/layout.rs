// SPDX-FileCopyrightText: 2026 TokenWatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The on-disk layout of a TokenWatch data directory.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokenwatch_core::TokenwatchError;

use crate::document::JsonDocument;

/// Usage records, one JSON array.
pub const USAGE_FILE: &str = "usage.json";
/// Fired budget alerts, one JSON array.
pub const ALERTS_FILE: &str = "alerts.json";
/// The budget configuration object.
pub const BUDGET_FILE: &str = "budget.json";

/// A directory holding the three TokenWatch documents.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
    atomic_writes: bool,
}

impl DataDir {
    /// Use `root` as the data directory, creating it if needed.
    pub fn open(root: impl Into<PathBuf>, atomic_writes: bool) -> Result<Self, TokenwatchError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| TokenwatchError::storage(&root, e))?;
        Ok(Self {
            root,
            atomic_writes,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn usage<T: Serialize + DeserializeOwned>(&self) -> JsonDocument<T> {
        self.document(USAGE_FILE)
    }

    pub fn alerts<T: Serialize + DeserializeOwned>(&self) -> JsonDocument<T> {
        self.document(ALERTS_FILE)
    }

    pub fn budget<T: Serialize + DeserializeOwned>(&self) -> JsonDocument<T> {
        self.document(BUDGET_FILE)
    }

    fn document<T: Serialize + DeserializeOwned>(&self, name: &str) -> JsonDocument<T> {
        JsonDocument::new(self.root.join(name), self.atomic_writes)
    }
}
