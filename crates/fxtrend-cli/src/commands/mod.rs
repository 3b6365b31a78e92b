mod convert;
mod history;
mod predict;

use std::sync::Arc;
use std::time::Instant;

use fxtrend_core::{
    CacheMode, CachedSource, CurrencyCode, Envelope, EnvelopeError, ExchangeRateHostAdapter,
    FrankfurterAdapter, PredictionError, ProviderId, RateSource, DEFAULT_CACHE_TTL,
};
use serde_json::Value;
use tracing::debug;

use crate::cli::{Cli, Command, SourceSelector};
use crate::error::CliError;
use crate::metadata::Metadata;

/// Source shared by every command of one invocation.
pub type SharedSource = Arc<CachedSource<Box<dyn RateSource>>>;

pub struct CommandResult {
    pub data: Value,
    /// Pre-formatted `label: value` lines for table output.
    pub summary: Vec<(String, String)>,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            summary: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn failed(error: EnvelopeError) -> Self {
        Self {
            data: Value::Null,
            summary: Vec::new(),
            warnings: Vec::new(),
            errors: vec![error],
        }
    }

    pub fn with_summary(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.summary.push((label.into(), value.into()));
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// Rendered command output: the envelope plus its table summary.
pub struct CommandOutput {
    pub envelope: Envelope<Value>,
    pub summary: Vec<(String, String)>,
}

pub async fn run(cli: &Cli) -> Result<CommandOutput, CliError> {
    let provider = ProviderId::from(cli.source);
    let source = build_source(cli);
    let started = Instant::now();

    let result = match &cli.command {
        Command::Convert(args) => convert::run(args, Arc::clone(&source)).await?,
        Command::History(args) => history::run(args, &source).await?,
        Command::Predict(args) => predict::run(args, Arc::clone(&source)).await?,
    };

    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    debug!(%provider, latency_ms, hits = source.hits(), misses = source.misses(), "command finished");

    let CommandResult {
        data,
        summary,
        warnings,
        errors,
    } = result;

    let mut metadata = Metadata::new(provider, latency_ms, source.hits() > 0);
    for warning in warnings {
        metadata.push_warning(warning);
    }

    let meta = metadata.into_envelope_meta()?;
    let envelope = Envelope::with_errors(meta, data, errors)?;
    Ok(CommandOutput { envelope, summary })
}

fn build_source(cli: &Cli) -> SharedSource {
    let adapter: Box<dyn RateSource> = match cli.source {
        SourceSelector::Frankfurter => {
            Box::new(FrankfurterAdapter::default().with_timeout_ms(cli.timeout_ms))
        }
        SourceSelector::ExchangerateHost => {
            Box::new(ExchangeRateHostAdapter::default().with_timeout_ms(cli.timeout_ms))
        }
    };

    let mode = if cli.no_cache {
        CacheMode::Bypass
    } else {
        CacheMode::Use
    };
    Arc::new(CachedSource::new(adapter, DEFAULT_CACHE_TTL).with_mode(mode))
}

fn parse_pair(base: &str, quote: &str) -> Result<(CurrencyCode, CurrencyCode), CliError> {
    Ok((CurrencyCode::parse(base)?, CurrencyCode::parse(quote)?))
}

/// Argument problems exit with code 2; everything else goes into the envelope.
fn into_result(error: PredictionError, provider: ProviderId) -> Result<CommandResult, CliError> {
    match error {
        PredictionError::InvalidRequest(message) => Err(CliError::Command(message)),
        PredictionError::Validation(error) => Err(CliError::Validation(error)),
        other => Ok(CommandResult::failed(EnvelopeError::from_prediction(
            &other, provider,
        ))),
    }
}

fn format_rate(rate: f64) -> String {
    format!("{rate:.4}")
}

fn format_amount(amount: f64) -> String {
    format!("{amount:.2}")
}
