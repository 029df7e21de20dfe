// SPDX-FileCopyrightText: 2026 TokenWatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end behaviour of the `TokenWatch` facade against a temp data dir.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDateTime};
use tokenwatch_config::AdvisorConfig;
use tokenwatch_core::{Period, round_to};
use tokenwatch_cost::{
    AlertKind, Budget, PricingTable, SuggestionKind, TokenWatch, UNKNOWN_PROVIDER,
};
use tokenwatch_storage::DataDir;
use tracing_test::traced_test;

/// A clock the test can move forward.
#[derive(Clone)]
struct TestClock(Arc<Mutex<NaiveDateTime>>);

impl TestClock {
    fn at(s: &str) -> Self {
        Self(Arc::new(Mutex::new(
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap(),
        )))
    }

    fn advance(&self, by: Duration) {
        *self.0.lock().unwrap() += by;
    }

    fn now(&self) -> NaiveDateTime {
        *self.0.lock().unwrap()
    }
}

fn open(dir: &Path, clock: &TestClock) -> TokenWatch {
    let data_dir = DataDir::open(dir, true).unwrap();
    let clock = clock.clone();
    TokenWatch::with_parts(
        &data_dir,
        PricingTable::builtin().unwrap(),
        AdvisorConfig::default(),
    )
    .with_clock(move || clock.now())
}

#[test]
fn haiku_cost_follows_the_formula() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = TestClock::at("2026-02-16T10:00:00");
    let mut tw = open(tmp.path(), &clock);

    let r = tw
        .record_usage("claude-haiku-4-5-20251001", 1200, 400, None, None)
        .unwrap();
    assert_eq!(
        r.cost_usd,
        round_to((1200.0 * 1.00 + 400.0 * 5.00) / 1_000_000.0, 8)
    );
    assert_eq!(r.cost_usd, 0.0032);
    assert_eq!(r.provider, "anthropic");
    assert_eq!(r.total_tokens, 1600);
}

#[test]
#[traced_test]
fn unknown_model_is_recorded_at_zero_cost() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = TestClock::at("2026-02-16T10:00:00");
    let mut tw = open(tmp.path(), &clock);

    let r = tw.record_usage("my-local-model", 5000, 5000, None, None).unwrap();
    assert_eq!(r.cost_usd, 0.0);
    assert_eq!(r.provider, UNKNOWN_PROVIDER);
    assert_eq!(tw.get_recent_calls(10).len(), 1);
    assert!(logs_contain("unknown model"));
}

#[test]
fn ledger_round_trips_through_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = TestClock::at("2026-02-16T10:00:00");
    let mut tw = open(tmp.path(), &clock);
    for (model, label) in [("o3", Some("plan")), ("grok-4", None), ("unknown-x", Some("misc"))] {
        tw.record_usage(model, 300, 120, label, Some("session-1")).unwrap();
        clock.advance(Duration::minutes(1));
    }
    let before = tw.get_recent_calls(10);

    let reopened = open(tmp.path(), &clock);
    assert_eq!(reopened.get_recent_calls(10), before);
}

#[test]
fn aggregate_over_all_counts_every_record() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = TestClock::at("2026-01-01T08:00:00");
    let mut tw = open(tmp.path(), &clock);
    let mut expected_tokens = 0;
    for i in 0..12 {
        let r = tw.record_usage("gpt-5", 100 * i, 10 * i, None, None).unwrap();
        expected_tokens += r.total_tokens;
        clock.advance(Duration::days(5));
    }
    let all = tw.get_spend(&Period::All);
    assert_eq!(all.call_count, 12);
    assert_eq!(all.total_tokens, expected_tokens);
    assert!(tw.get_spend(&Period::Month).call_count < 12);
}

#[test]
fn daily_budget_fires_on_every_call_over_the_ceiling() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = TestClock::at("2026-02-16T09:00:00");
    let mut tw = open(tmp.path(), &clock);
    tw.set_budget(Budget {
        daily_usd: Some(1.00),
        ..Budget::default()
    })
    .unwrap();

    // claude-opus-4-6 at 5/25 per 1M: 100k input + 1k output is $0.525.
    tw.record_usage("claude-opus-4-6", 100_000, 1_000, None, None).unwrap();
    assert!(tw.get_alerts(false).is_empty());
    tw.record_usage("claude-opus-4-6", 100_000, 1_000, None, None).unwrap();
    assert_eq!(tw.get_spend(&Period::Today).total_cost_usd, 1.05);

    let alerts = tw.get_alerts(false);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, AlertKind::Daily);
    assert_eq!(alerts[0].current_spend_usd, 1.05);

    // $0.01 more: still exceeded, fires again.
    tw.record_usage("claude-opus-4-6", 2_000, 0, None, None).unwrap();
    let alerts = tw.get_alerts(false);
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[1].alert_type, AlertKind::Daily);
    assert_eq!(alerts[1].current_spend_usd, 1.06);

    // The next day starts under the ceiling again.
    clock.advance(Duration::days(1));
    tw.record_usage("claude-opus-4-6", 2_000, 0, None, None).unwrap();
    assert_eq!(tw.get_alerts(false).len(), 2);
}

#[test]
fn no_alert_without_ceiling() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = TestClock::at("2026-02-16T09:00:00");
    let mut tw = open(tmp.path(), &clock);
    tw.set_budget(Budget {
        weekly_usd: Some(100.0),
        ..Budget::default()
    })
    .unwrap();
    tw.record_usage("claude-opus-4-6", 1_000_000, 1_000_000, None, None)
        .unwrap();
    assert!(tw.get_alerts(false).is_empty());
}

#[test]
fn estimating_unknown_model_changes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = TestClock::at("2026-02-16T09:00:00");
    let tw = open(tmp.path(), &clock);

    let err = tw.estimate_cost("nonexistent-model", 100, 100).unwrap_err();
    assert_eq!(err.model, "nonexistent-model");
    assert!(tw.get_recent_calls(10).is_empty());
    assert!(!tmp.path().join("usage.json").exists());
}

#[test]
fn compare_is_cheapest_first() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = TestClock::at("2026-02-16T09:00:00");
    let tw = open(tmp.path(), &clock);

    let costs = tw.compare_models(2000, 500);
    assert!(costs.windows(2).all(|w| w[0].cost_usd <= w[1].cost_usd));
    let cheapest = tw
        .pricing()
        .iter()
        .map(|p| (2000.0 * p.input_per_mtok + 500.0 * p.output_per_mtok) / 1e6)
        .fold(f64::INFINITY, f64::min);
    assert!((costs[0].cost_usd - cheapest).abs() < 1e-12);
}

#[test]
#[traced_test]
fn corrupt_usage_file_starts_empty() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("usage.json"), "[{\"id\": ").unwrap();
    let clock = TestClock::at("2026-02-16T09:00:00");
    let mut tw = open(tmp.path(), &clock);

    assert!(tw.get_recent_calls(10).is_empty());
    assert!(logs_contain("could not load persisted state"));

    tw.record_usage("o3", 1, 1, None, None).unwrap();
    let reopened = open(tmp.path(), &clock);
    assert_eq!(reopened.get_recent_calls(10).len(), 1);
}

#[test]
fn export_report_writes_composite_json() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = TestClock::at("2026-02-16T09:00:00");
    let mut tw = open(tmp.path(), &clock);
    tw.record_usage("claude-sonnet-4-5-20250929", 1_000, 200, Some("code"), None)
        .unwrap();
    tw.record_usage("gemini-2.5-flash", 1_000, 200, None, None)
        .unwrap();

    let path = tmp.path().join("report.json");
    let report = tw.export_report(&path, &Period::Month).unwrap();
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.by_model[0].model, "claude-sonnet-4-5-20250929");

    let v: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(v["report_period"], "month");
    assert_eq!(v["summary"]["call_count"], 2);
    assert_eq!(v["by_provider"].as_array().unwrap().len(), 2);
    assert_eq!(v["records"][0]["task_label"], "code");
    assert_eq!(v["optimization_suggestions"][0]["type"], "info");
}

#[test]
fn suggestions_only_look_at_the_last_thirty_days() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = TestClock::at("2026-01-01T09:00:00");
    let mut tw = open(tmp.path(), &clock);
    for _ in 0..11 {
        tw.record_usage("claude-opus-4-6", 20_000, 2_000, None, None)
            .unwrap();
    }
    assert_eq!(
        tw.get_optimization_suggestions()[0].kind,
        SuggestionKind::ModelSwap
    );

    clock.advance(Duration::days(45));
    let later = tw.get_optimization_suggestions();
    assert_eq!(later.len(), 1);
    assert!(later[0].message.starts_with("No usage data yet"));
}

#[test]
fn dashboard_shows_budget_and_models() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = TestClock::at("2026-02-16T09:00:00");
    let mut tw = open(tmp.path(), &clock);
    tw.set_budget(Budget {
        daily_usd: Some(1.0),
        ..Budget::default()
    })
    .unwrap();
    tw.record_usage("claude-opus-4-6", 100_000, 0, None, None)
        .unwrap();

    let text = tw.format_dashboard(&Period::Today);
    assert!(text.contains("BUDGET STATUS"));
    assert!(text.contains("50% $0.5000 / $1.00 OK"), "{text}");
    assert!(text.contains("claude-opus-4-6"));
}
