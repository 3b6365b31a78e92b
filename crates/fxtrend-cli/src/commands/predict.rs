use fxtrend_core::domain::calendar::{format_date, parse_date};
use fxtrend_core::{
    DegeneratePolicy, ForecastConfig, Forecaster, PredictionRequest, RateSource,
};

use crate::cli::PredictArgs;
use crate::error::CliError;

use super::{format_amount, format_rate, into_result, parse_pair, CommandResult, SharedSource};

const DISCLAIMER: &str = "linear extrapolation of recent rates; not financial advice";

pub async fn run(args: &PredictArgs, source: SharedSource) -> Result<CommandResult, CliError> {
    let (base, quote) = parse_pair(&args.base, &args.quote)?;

    let request = match (&args.date, args.days) {
        (Some(raw), _) => PredictionRequest::new(base, quote, parse_date(raw)?, args.amount),
        (None, Some(days)) => PredictionRequest::days_ahead(base, quote, days, args.amount)
            .map_err(|error| CliError::Command(error.to_string()))?,
        (None, None) => {
            return Err(CliError::Command(String::from(
                "either --days or --date is required",
            )))
        }
    };

    let provider = source.id();
    let forecaster = Forecaster::with_config(source, config_from_args(args));

    let forecast = match forecaster.predict(&request).await {
        Ok(forecast) => forecast,
        Err(error) => return into_result(error, provider),
    };

    let mut result = CommandResult::ok(serde_json::to_value(&forecast)?)
        .with_warning(DISCLAIMER)
        .with_summary("pair", format!("{}/{}", forecast.base, forecast.quote))
        .with_summary(
            "history",
            format!(
                "{} observations, {} to {}",
                forecast.observations,
                format_date(forecast.origin),
                format_date(forecast.last_observed)
            ),
        )
        .with_summary("target", format_date(forecast.target))
        .with_summary("slope/day", format!("{:+.6}", forecast.slope))
        .with_summary("predicted", format_rate(forecast.predicted_rate))
        .with_summary(
            "converted",
            format!(
                "{} {} = {} {}",
                format_amount(forecast.amount),
                forecast.base,
                format_amount(forecast.converted_amount),
                forecast.quote
            ),
        );

    if forecast.degenerate {
        result = result.with_warning("only one observation in the window; the trend is flat");
    }

    Ok(result)
}

fn config_from_args(args: &PredictArgs) -> ForecastConfig {
    let policy = if args.reject_single_point {
        DegeneratePolicy::Reject
    } else {
        DegeneratePolicy::Constant
    };
    let max_horizon_days = (args.max_horizon_days > 0).then_some(args.max_horizon_days);

    ForecastConfig::default()
        .with_lookback_days(args.lookback_days)
        .with_max_horizon_days(max_horizon_days)
        .with_degenerate_policy(policy)
        .with_trajectory(args.trajectory)
}
