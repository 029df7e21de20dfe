// SPDX-FileCopyrightText: 2026 TokenWatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tokenwatch record` and `tokenwatch ingest`.

use std::io::Read;
use std::path::Path;

use serde::Serialize;
use tokenwatch_core::TokenwatchError;
use tokenwatch_cost::{BudgetAlert, ResponseProvider, TokenWatch, UNKNOWN_PROVIDER, UsageRecord};

use crate::output::Output;

/// Structured output of a recording command in `--json` mode.
#[derive(Debug, Serialize)]
pub struct Recorded<'a> {
    pub record: &'a UsageRecord,
    pub alerts: &'a [BudgetAlert],
}

pub fn run_record(
    tw: &mut TokenWatch,
    out: &Output,
    model: &str,
    input_tokens: i64,
    output_tokens: i64,
    label: Option<&str>,
    session: Option<&str>,
) -> Result<(), TokenwatchError> {
    let before = tw.get_alerts(false).len();
    let record = tw.record_usage(model, input_tokens, output_tokens, label, session)?;
    report(tw, out, &record, before);
    Ok(())
}

/// Record usage from a provider response body read from `file` (`-` is stdin).
pub fn run_ingest(
    tw: &mut TokenWatch,
    out: &Output,
    provider: ResponseProvider,
    file: &Path,
    label: Option<&str>,
) -> Result<(), TokenwatchError> {
    let body = read_body(file)?;
    let before = tw.get_alerts(false).len();
    let record = tw.record_from_response(provider, &body, label)?;
    report(tw, out, &record, before);
    Ok(())
}

fn read_body(file: &Path) -> Result<String, TokenwatchError> {
    if file == Path::new("-") {
        let mut body = String::new();
        std::io::stdin()
            .read_to_string(&mut body)
            .map_err(|e| TokenwatchError::storage("<stdin>", e))?;
        return Ok(body);
    }
    std::fs::read_to_string(file).map_err(|e| TokenwatchError::storage(file, e))
}

/// Print the new record and whatever alerts it fired.
fn report(tw: &TokenWatch, out: &Output, record: &UsageRecord, alerts_before: usize) {
    let fired = tw.get_alerts(false).get(alerts_before..).unwrap_or_default();
    if out.is_json() {
        out.json(&Recorded {
            record,
            alerts: fired,
        });
        return;
    }

    println!(
        "Recorded {}: {} {} tokens ${:.6}",
        record.id, record.model, record.total_tokens, record.cost_usd
    );
    if record.provider == UNKNOWN_PROVIDER {
        println!("  note: {} is not in the pricing table; cost recorded as $0", record.model);
    }
    for alert in fired {
        out.alert(alert);
    }
}
