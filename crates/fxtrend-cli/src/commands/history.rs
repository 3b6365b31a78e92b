use fxtrend_core::domain::calendar::format_date;
use fxtrend_core::{EnvelopeError, HistoryRequest, RateSource};

use crate::cli::HistoryArgs;
use crate::error::CliError;

use super::{format_rate, parse_pair, CommandResult, SharedSource};

pub async fn run(args: &HistoryArgs, source: &SharedSource) -> Result<CommandResult, CliError> {
    let (base, quote) = parse_pair(&args.base, &args.quote)?;
    let request = HistoryRequest::new(base, quote, args.lookback_days)
        .map_err(|error| CliError::Command(error.message().to_owned()))?;

    let series = match source.history(request).await {
        Ok(series) => series,
        Err(error) => {
            return Ok(CommandResult::failed(EnvelopeError::from_source(
                &error,
                source.id(),
            )))
        }
    };

    let data = serde_json::to_value(&series)?;
    let first = series.first();
    let last = series.last();
    Ok(CommandResult::ok(data)
        .with_summary("pair", format!("{}/{}", series.base(), series.quote()))
        .with_summary("observations", series.len().to_string())
        .with_summary(
            "first",
            format!("{} {}", format_date(first.date), format_rate(first.rate)),
        )
        .with_summary(
            "last",
            format!("{} {}", format_date(last.date), format_rate(last.rate)),
        ))
}
