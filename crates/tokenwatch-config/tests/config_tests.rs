// SPDX-FileCopyrightText: 2026 TokenWatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the TokenWatch configuration system.

use tokenwatch_config::diagnostic::ConfigError;
use tokenwatch_config::model::TokenwatchConfig;
use tokenwatch_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

/// Valid TOML with every known field deserializes.
#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[storage]
data_dir = "/tmp/tw"
atomic_writes = false

[pricing]
table_path = "/etc/tokenwatch/pricing.toml"

[logging]
level = "debug"

[advisor]
high_avg_cost_per_call_usd = 0.10
expensive_input_rate_per_mtok = 2.0
expensive_spend_threshold_usd = 20.0
volume_model = "gemini-2.0-flash"

[[advisor.swap_rules]]
current_model = "o3"
suggested_model = "o4-mini"
min_calls = 3
message = "Try o4-mini first"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.storage.data_dir, "/tmp/tw");
    assert!(!config.storage.atomic_writes);
    assert_eq!(
        config.pricing.table_path.as_deref(),
        Some("/etc/tokenwatch/pricing.toml")
    );
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.advisor.high_avg_cost_per_call_usd, 0.10);
    assert_eq!(config.advisor.volume_model, "gemini-2.0-flash");
    assert_eq!(config.advisor.swap_rules.len(), 1);
    assert_eq!(config.advisor.swap_rules[0].suggested_model, "o4-mini");
    assert_eq!(config.advisor.swap_rules[0].min_calls, 3);
}

/// An empty document yields the compiled defaults.
#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.storage.data_dir, ".tokenwatch");
    assert!(config.storage.atomic_writes);
    assert!(config.pricing.table_path.is_none());
    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.advisor.high_avg_cost_per_call_usd, 0.05);
    assert_eq!(config.advisor.expensive_input_rate_per_mtok, 1.0);
    assert_eq!(config.advisor.expensive_spend_threshold_usd, 5.0);
    assert_eq!(config.advisor.volume_model, "gemini-2.5-flash");
    assert_eq!(config.advisor.swap_rules.len(), 2);
    assert_eq!(config.advisor.swap_rules[0].current_model, "claude-opus-4-6");
}

/// A swap rule without min_calls takes the default of 10.
#[test]
fn swap_rule_min_calls_defaults() {
    let toml = r#"
[[advisor.swap_rules]]
current_model = "grok-4"
suggested_model = "grok-4.1-fast"
message = "Use the fast variant"
"#;
    let config = load_config_from_str(toml).unwrap();
    assert_eq!(config.advisor.swap_rules.len(), 1);
    assert_eq!(config.advisor.swap_rules[0].min_calls, 10);
}

/// Unknown keys are rejected with a suggestion.
#[test]
fn unknown_key_produces_suggestion() {
    let toml = r#"
[storage]
data_dri = "/tmp/x"
"#;
    let errors = load_and_validate_str(toml).expect_err("typo should be rejected");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { key, suggestion: Some(s), .. }
            if key == "data_dri" && s == "data_dir"
    )));
}

/// Wrong value type is reported as InvalidType.
#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[storage]
atomic_writes = "yes"
"#;
    let errors = load_and_validate_str(toml).expect_err("string for bool should fail");
    assert!(!errors.is_empty());
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. } | ConfigError::Other(_)))
    );
}

/// A swap rule missing a required key reports the key.
#[test]
fn swap_rule_missing_message_is_reported() {
    let toml = r#"
[[advisor.swap_rules]]
current_model = "o3"
suggested_model = "o4-mini"
"#;
    let errors = load_and_validate_str(toml).expect_err("message is required");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::MissingKey { key } if key == "message"))
    );
}

/// Semantic validation runs after a clean parse.
#[test]
fn validation_errors_surface_through_load() {
    let toml = r#"
[logging]
level = "verbose"
"#;
    let errors = load_and_validate_str(toml).expect_err("bad level");
    assert!(errors.iter().any(|e| matches!(e, ConfigError::Validation { .. })));
}

/// Dotted overrides (what the env provider produces) win over TOML.
#[test]
fn dotted_override_wins_over_toml() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let config: TokenwatchConfig = Figment::new()
        .merge(Serialized::defaults(TokenwatchConfig::default()))
        .merge(Toml::string("[storage]\ndata_dir = \"from-toml\"\n"))
        .merge(("storage.data_dir", "from-env"))
        .extract()
        .expect("override should merge");

    assert_eq!(config.storage.data_dir, "from-env");
}

/// Real `TOKENWATCH_*` variables reach their sections through the env provider.
#[test]
fn env_vars_override_defaults() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("TOKENWATCH_STORAGE_DATA_DIR", "/tmp/tokenwatch-env");
        jail.set_env("TOKENWATCH_LOGGING_LEVEL", "debug");
        jail.set_env("TOKENWATCH_ADVISOR_VOLUME_MODEL", "mistral-nemo");

        let config = tokenwatch_config::load_config()?;
        assert_eq!(config.storage.data_dir, "/tmp/tokenwatch-env");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.advisor.volume_model, "mistral-nemo");
        Ok(())
    });
}

/// Env vars also apply on top of an explicit file, and still pass validation.
#[test]
fn env_vars_override_explicit_file() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("custom.toml", "[storage]\ndata_dir = \"from-file\"\n")?;
        jail.set_env("TOKENWATCH_STORAGE_DATA_DIR", "from-env");

        let config = load_and_validate_path(std::path::Path::new("custom.toml"))
            .map_err(|errors| format!("{} config errors", errors.len()))?;
        assert_eq!(config.storage.data_dir, "from-env");
        Ok(())
    });
}

/// An explicit config file is read and validated.
#[test]
fn explicit_file_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "[storage]\ndata_dir = \"/var/lib/tw\"\n").unwrap();

    let config = load_and_validate_path(&path).expect("file should load");
    assert_eq!(config.storage.data_dir, "/var/lib/tw");
}

/// Unknown key in an explicit file gets a suggestion.
#[test]
fn explicit_file_unknown_key_is_suggested() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "[pricing]\ntabel_path = \"x\"\n").unwrap();

    let errors = load_and_validate_path(&path).expect_err("typo should fail");
    let unknown = errors
        .iter()
        .find(|e| matches!(e, ConfigError::UnknownKey { .. }))
        .expect("unknown key error");
    if let ConfigError::UnknownKey { suggestion, .. } = unknown {
        assert_eq!(suggestion.as_deref(), Some("table_path"));
    }
}
