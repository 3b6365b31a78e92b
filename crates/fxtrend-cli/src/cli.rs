//! CLI argument definitions for fxtrend.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `convert` | Convert an amount at the latest published rate |
//! | `history` | Fetch the daily rate history for a pair |
//! | `predict` | Extrapolate a linear trend to a future date |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--source` | `frankfurter` | Rate provider |
//! | `--timeout-ms` | `10000` | Per-request timeout in ms |
//! | `--no-cache` | `false` | Bypass the in-process response cache |
//! | `--verbose` | `false` | Debug logging on stderr |
//!
//! # Examples
//!
//! ```bash
//! fxtrend convert USD INR --amount 250
//! fxtrend history EUR USD --lookback-days 30 --format table
//! fxtrend predict USD INR --days 7 --amount 100 --pretty
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use fxtrend_core::{ProviderId, DEFAULT_LOOKBACK_DAYS, DEFAULT_MAX_HORIZON_DAYS, DEFAULT_TIMEOUT_MS};

/// Exchange-rate history and linear trend forecasts.
#[derive(Debug, Parser)]
#[command(
    name = "fxtrend",
    author,
    version,
    about = "Exchange-rate history and linear trend forecasts",
    long_about = "fxtrend fetches daily exchange-rate history from a public provider, \
fits a least-squares trend line and extrapolates it to a target date.\n\
\n\
Forecasts are naive linear extrapolations, not financial advice.\n\
\n\
Use 'fxtrend <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Rate provider to query.
    #[arg(long, global = true, value_enum, default_value_t = SourceSelector::Frankfurter)]
    pub source: SourceSelector,

    /// Per-request timeout in milliseconds.
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Always fetch from the provider.
    #[arg(long, global = true, default_value_t = false)]
    pub no_cache: bool,

    /// Emit debug logs on stderr (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary.
    Table,
    /// Single JSON envelope.
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceSelector {
    /// ECB reference rates via api.frankfurter.app (no key needed).
    Frankfurter,
    /// api.exchangerate.host (reads FXTREND_EXCHANGERATE_HOST_API_KEY).
    ExchangerateHost,
}

impl From<SourceSelector> for ProviderId {
    fn from(selector: SourceSelector) -> Self {
        match selector {
            SourceSelector::Frankfurter => Self::Frankfurter,
            SourceSelector::ExchangerateHost => Self::ExchangerateHost,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert an amount at the latest published rate.
    Convert(ConvertArgs),
    /// Fetch the daily rate history for a currency pair.
    History(HistoryArgs),
    /// Predict the rate on a future date from a linear trend.
    Predict(PredictArgs),
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Currency to convert from, e.g. USD.
    pub from: String,
    /// Currency to convert to, e.g. INR.
    pub to: String,
    #[arg(long, default_value_t = 1.0)]
    pub amount: f64,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    pub base: String,
    pub quote: String,
    /// Calendar days of history ending today.
    #[arg(long, default_value_t = DEFAULT_LOOKBACK_DAYS)]
    pub lookback_days: u32,
}

#[derive(Debug, Args)]
pub struct PredictArgs {
    pub base: String,
    pub quote: String,

    /// Days ahead of today (UTC).
    #[arg(long, conflicts_with = "date", required_unless_present = "date")]
    pub days: Option<u32>,

    /// Target date (YYYY-MM-DD).
    #[arg(long)]
    pub date: Option<String>,

    /// Amount of the base currency to convert at the predicted rate.
    #[arg(long, default_value_t = 1.0)]
    pub amount: f64,

    #[arg(long, default_value_t = DEFAULT_LOOKBACK_DAYS)]
    pub lookback_days: u32,

    /// Furthest allowed target in days after today; 0 disables the check.
    #[arg(long, default_value_t = DEFAULT_MAX_HORIZON_DAYS)]
    pub max_horizon_days: u32,

    /// Fail instead of drawing a flat line through a single observation.
    #[arg(long, default_value_t = false)]
    pub reject_single_point: bool,

    /// Include the fetched history and the daily trend line in the output.
    #[arg(long, default_value_t = false)]
    pub trajectory: bool,
}
