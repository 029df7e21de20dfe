// SPDX-FileCopyrightText: 2026 TokenWatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Whole-file JSON documents.
//!
//! Each document is read completely on load and rewritten completely on save.
//! There is no locking: two processes saving the same document race, and the
//! last rename wins.

use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokenwatch_core::TokenwatchError;
use tracing::{debug, warn};

/// Result of decoding a persisted document.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome<T> {
    /// The file existed and decoded cleanly.
    Loaded(T),
    /// No file yet (first run).
    Missing,
    /// The file exists but could not be read or decoded.
    Corrupt { reason: String },
}

impl<T> LoadOutcome<T> {
    /// The decoded value, if there was one.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Loaded(value) => Some(value),
            Self::Missing | Self::Corrupt { .. } => None,
        }
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }

    /// Fall back to `T::default()` unless the document loaded.
    ///
    /// A corrupt document is reported at warn level under `document`; the
    /// unreadable contents are discarded the next time the document is saved.
    pub fn or_default_logged(self, document: &str) -> T
    where
        T: Default,
    {
        match self {
            Self::Loaded(value) => value,
            Self::Missing => T::default(),
            Self::Corrupt { reason } => {
                warn!(document, %reason, "could not load persisted state, starting empty");
                T::default()
            }
        }
    }
}

/// A typed JSON document at a fixed path.
#[derive(Debug, Clone)]
pub struct JsonDocument<T> {
    path: PathBuf,
    atomic: bool,
    _value: PhantomData<fn() -> T>,
}

impl<T> JsonDocument<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Bind a document to `path`. With `atomic`, saves go through a temp file
    /// in the same directory followed by a rename.
    pub fn new(path: impl Into<PathBuf>, atomic: bool) -> Self {
        Self {
            path: path.into(),
            atomic,
            _value: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode the document. Never fails; see [`LoadOutcome`].
    pub fn load(&self) -> LoadOutcome<T> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return LoadOutcome::Missing,
            Err(e) => {
                return LoadOutcome::Corrupt {
                    reason: format!("read {}: {e}", self.path.display()),
                };
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => LoadOutcome::Loaded(value),
            Err(e) => LoadOutcome::Corrupt {
                reason: format!("decode {}: {e}", self.path.display()),
            },
        }
    }

    /// Encode `value` as indented JSON and replace the file with it.
    pub fn save(&self, value: &T) -> Result<(), TokenwatchError> {
        let encoded = serde_json::to_vec_pretty(value)
            .map_err(|e| TokenwatchError::serialization(self.path.display().to_string(), e))?;

        if self.atomic {
            self.replace_atomically(&encoded)?;
        } else {
            std::fs::write(&self.path, &encoded)
                .map_err(|e| TokenwatchError::storage(&self.path, e))?;
        }

        debug!(path = %self.path.display(), bytes = encoded.len(), "document saved");
        Ok(())
    }

    fn replace_atomically(&self, bytes: &[u8]) -> Result<(), TokenwatchError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| TokenwatchError::storage(dir, e))?;
        tmp.write_all(bytes)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| TokenwatchError::storage(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| TokenwatchError::storage(&self.path, e.error))?;
        Ok(())
    }
}
