// SPDX-FileCopyrightText: 2026 TokenWatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! TokenWatch - track API token usage, cost and budgets.
//!
//! This is the binary entry point. Every subcommand opens the data directory
//! named by the configuration, runs one operation on the tracker and exits.

mod budget;
mod output;
mod record;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tokenwatch_config::TokenwatchConfig;
use tokenwatch_core::{Period, TokenwatchError};
use tokenwatch_cost::{DEFAULT_RECENT_LIMIT, ResponseProvider, TokenWatch};

use crate::output::Output;

/// TokenWatch - track API token usage, cost and budgets.
#[derive(Parser, Debug)]
#[command(name = "tokenwatch", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Record one API call.
    Record {
        model: String,
        input_tokens: i64,
        output_tokens: i64,
        /// Free-form label for the task this call served.
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        session: Option<String>,
    },
    /// Record usage from a saved provider response body.
    Ingest {
        #[arg(long, value_parser = parse_provider)]
        provider: ResponseProvider,
        /// Response body file, or `-` for stdin.
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        label: Option<String>,
    },
    /// Show the budget, or update the ceilings given as flags.
    ///
    /// Ceilings not named keep their stored value unless `--replace` is given.
    Budget(budget::BudgetArgs),
    /// Total spend for a period.
    Spend {
        /// today, week, month, all, or a YYYY-MM-DD date.
        #[arg(long, default_value = "today")]
        period: Period,
        /// Break the total down by model or provider.
        #[arg(long, value_enum)]
        by: Option<Breakdown>,
    },
    /// Most recent calls, newest first.
    Recent {
        #[arg(long, default_value_t = DEFAULT_RECENT_LIMIT)]
        limit: usize,
    },
    /// Budget alerts fired so far.
    Alerts {
        #[arg(long)]
        unacknowledged: bool,
    },
    /// Cost-saving suggestions from the last thirty days.
    Suggest,
    /// Estimate the cost of a call without recording it.
    Estimate {
        model: String,
        input_tokens: i64,
        output_tokens: i64,
    },
    /// Cost of the same call on every priced model, cheapest first.
    Compare {
        input_tokens: i64,
        output_tokens: i64,
        /// Show only the cheapest N models.
        #[arg(long)]
        top: Option<usize>,
    },
    /// Write a JSON usage report.
    Export {
        #[arg(long, default_value = "tokenwatch-report.json")]
        output: PathBuf,
        #[arg(long, default_value = "month")]
        period: Period,
    },
    /// Text overview of spend, budgets and tips.
    Dashboard {
        /// Period covered by the per-model breakdown.
        #[arg(long, default_value = "month")]
        period: Period,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Breakdown {
    Model,
    Provider,
}

fn parse_provider(raw: &str) -> Result<ResponseProvider, String> {
    raw.parse()
        .map_err(|_| format!("unsupported provider `{raw}` (expected anthropic or openai)"))
}

fn main() {
    let cli = Cli::parse();

    let config = load_config(&cli);
    init_tracing(&config.logging.level);

    if let Err(e) = run(cli, &config) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Load and validate configuration, exiting with diagnostics on failure.
fn load_config(cli: &Cli) -> TokenwatchConfig {
    let loaded = match &cli.config {
        Some(path) => tokenwatch_config::load_and_validate_path(path),
        None => tokenwatch_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            tokenwatch_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli, config: &TokenwatchConfig) -> Result<(), TokenwatchError> {
    let mut tw = TokenWatch::open(config)?;
    let out = Output::detect(cli.json);

    match cli.command {
        Commands::Record {
            model,
            input_tokens,
            output_tokens,
            label,
            session,
        } => record::run_record(
            &mut tw,
            &out,
            &model,
            input_tokens,
            output_tokens,
            label.as_deref(),
            session.as_deref(),
        ),
        Commands::Ingest {
            provider,
            file,
            label,
        } => record::run_ingest(&mut tw, &out, provider, &file, label.as_deref()),
        Commands::Budget(args) => budget::run_budget(&mut tw, &out, &args),
        Commands::Spend { period, by } => {
            match by {
                None => out.spend(&period, &tw.get_spend(&period)),
                Some(Breakdown::Model) => out.by_model(&tw.get_spend_by_model(&period)),
                Some(Breakdown::Provider) => out.by_provider(&tw.get_spend_by_provider(&period)),
            }
            Ok(())
        }
        Commands::Recent { limit } => {
            out.recent(&tw.get_recent_calls(limit));
            Ok(())
        }
        Commands::Alerts { unacknowledged } => {
            out.alerts(tw.get_alerts(unacknowledged));
            Ok(())
        }
        Commands::Suggest => {
            out.suggestions(&tw.get_optimization_suggestions());
            Ok(())
        }
        Commands::Estimate {
            model,
            input_tokens,
            output_tokens,
        } => match tw.estimate_cost(&model, input_tokens, output_tokens) {
            Ok(estimate) => {
                out.estimate(&estimate);
                Ok(())
            }
            Err(unknown) => {
                out.unknown_model(&unknown);
                std::process::exit(1);
            }
        },
        Commands::Compare {
            input_tokens,
            output_tokens,
            top,
        } => {
            let mut costs = tw.compare_models(input_tokens, output_tokens);
            if let Some(n) = top {
                costs.truncate(n);
            }
            out.compare(input_tokens, output_tokens, &costs);
            Ok(())
        }
        Commands::Export { output, period } => {
            let report = tw.export_report(&output, &period)?;
            out.exported(&output, &report);
            Ok(())
        }
        Commands::Dashboard { period } => {
            if out.is_json() {
                out.json(&tw.build_report(&period));
            } else {
                print!("{}", tw.format_dashboard(&period));
            }
            Ok(())
        }
    }
}

/// Initializes the tracing subscriber with the given log level.
///
/// `RUST_LOG` takes precedence. Logs go to stderr so stdout stays parseable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tokenwatch={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
