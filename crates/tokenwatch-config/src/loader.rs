// SPDX-FileCopyrightText: 2026 TokenWatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order: `./tokenwatch.toml` > `~/.config/tokenwatch/tokenwatch.toml` >
//! `/etc/tokenwatch/tokenwatch.toml`, with `TOKENWATCH_*` environment variables
//! applied last.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::TokenwatchConfig;

/// File name searched for in every hierarchy location.
pub const CONFIG_FILE_NAME: &str = "tokenwatch.toml";

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/tokenwatch/tokenwatch.toml";

/// Per-user config file under the XDG config directory, if one can be resolved.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tokenwatch").join(CONFIG_FILE_NAME))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/tokenwatch/tokenwatch.toml`
/// 3. `~/.config/tokenwatch/tokenwatch.toml`
/// 4. `./tokenwatch.toml`
/// 5. `TOKENWATCH_*` environment variables
pub fn load_config() -> Result<TokenwatchConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no environment).
pub fn load_config_from_str(toml_content: &str) -> Result<TokenwatchConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TokenwatchConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file, still honouring env overrides.
///
/// Unlike the hierarchy lookup, a missing file here is an error: the caller
/// asked for it by name.
pub fn load_config_from_path(path: &Path) -> Result<TokenwatchConfig, figment::Error> {
    if !path.is_file() {
        return Err(figment::Error::from(format!(
            "config file `{}` does not exist",
            path.display()
        )));
    }
    Figment::new()
        .merge(Serialized::defaults(TokenwatchConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment behind [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(TokenwatchConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(CONFIG_FILE_NAME))
        .merge(env_provider())
}

/// Environment provider mapping `TOKENWATCH_<SECTION>_<KEY>` to `section.key`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `TOKENWATCH_STORAGE_DATA_DIR` is `storage.data_dir`. Figment hands the
/// key over in its original case.
fn env_provider() -> Env {
    Env::prefixed("TOKENWATCH_")
        .map(|key| env_key_to_path(&key.as_str().to_ascii_lowercase()).into())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config path.
pub fn env_key_to_path(key: &str) -> String {
    const SECTIONS: [&str; 4] = ["storage", "pricing", "logging", "advisor"];
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_on_first_underscore_only() {
        assert_eq!(env_key_to_path("storage_data_dir"), "storage.data_dir");
        assert_eq!(env_key_to_path("pricing_table_path"), "pricing.table_path");
        assert_eq!(env_key_to_path("logging_level"), "logging.level");
        assert_eq!(
            env_key_to_path("advisor_high_avg_cost_per_call_usd"),
            "advisor.high_avg_cost_per_call_usd"
        );
    }

    #[test]
    fn unknown_section_is_left_alone() {
        assert_eq!(env_key_to_path("misc_value"), "misc_value");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = load_config_from_path(Path::new("/nonexistent/tokenwatch.toml")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
