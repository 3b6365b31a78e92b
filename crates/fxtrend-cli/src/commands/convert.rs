use fxtrend_core::domain::calendar::format_date;
use fxtrend_core::{ConversionRequest, Forecaster, RateSource};

use crate::cli::ConvertArgs;
use crate::error::CliError;

use super::{format_amount, format_rate, into_result, parse_pair, CommandResult, SharedSource};

pub async fn run(args: &ConvertArgs, source: SharedSource) -> Result<CommandResult, CliError> {
    let (from, to) = parse_pair(&args.from, &args.to)?;
    let provider = source.id();
    let forecaster = Forecaster::new(source);

    let conversion = match forecaster
        .convert(&ConversionRequest::new(from, to, args.amount))
        .await
    {
        Ok(conversion) => conversion,
        Err(error) => return into_result(error, provider),
    };

    let data = serde_json::to_value(&conversion)?;
    Ok(CommandResult::ok(data)
        .with_summary("pair", format!("{}/{}", conversion.from, conversion.to))
        .with_summary("date", format_date(conversion.date))
        .with_summary("rate", format_rate(conversion.rate))
        .with_summary(
            "converted",
            format!(
                "{} {} = {} {}",
                format_amount(conversion.amount),
                conversion.from,
                format_amount(conversion.converted_amount),
                conversion.to
            ),
        ))
}
