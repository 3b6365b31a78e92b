//! Request-scoped forecasting and latest-rate conversion.
//!
//! A [`Forecaster`] owns a [`RateSource`] and a [`ForecastConfig`]. Each
//! call fetches fresh history (or a cached copy, if the source is a
//! [`CachedSource`](crate::CachedSource)), fits a new [`TrendModel`], and
//! drops it once the [`Forecast`] is built.

use serde::Serialize;
use time::Date;
use tracing::{info, warn};

use crate::data_source::{
    HistoryRequest, LatestRequest, RateSource, SourceError, SourceErrorKind, DEFAULT_LOOKBACK_DAYS,
};
use crate::domain::calendar::{add_days, days_between, format_date, iso_date, today_utc};
use crate::predictor::{fit, predict, predict_trajectory, DegeneratePolicy, TrajectoryPoint};
use crate::{CurrencyCode, PredictionError, ProviderId, RateObservation, RateSeries};

/// Default furthest target, in days after the reference date.
pub const DEFAULT_MAX_HORIZON_DAYS: u32 = 30;

/// Forecast tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastConfig {
    pub lookback_days: u32,
    /// `None` disables the horizon check.
    pub max_horizon_days: Option<u32>,
    pub degenerate_policy: DegeneratePolicy,
    pub include_trajectory: bool,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            max_horizon_days: Some(DEFAULT_MAX_HORIZON_DAYS),
            degenerate_policy: DegeneratePolicy::Constant,
            include_trajectory: false,
        }
    }
}

impl ForecastConfig {
    pub fn with_lookback_days(mut self, lookback_days: u32) -> Self {
        self.lookback_days = lookback_days;
        self
    }

    pub fn with_max_horizon_days(mut self, max_horizon_days: Option<u32>) -> Self {
        self.max_horizon_days = max_horizon_days;
        self
    }

    pub fn with_degenerate_policy(mut self, policy: DegeneratePolicy) -> Self {
        self.degenerate_policy = policy;
        self
    }

    pub fn with_trajectory(mut self, include_trajectory: bool) -> Self {
        self.include_trajectory = include_trajectory;
        self
    }
}

/// A single prediction request.
///
/// `as_of` is the reference "today": the history window ends there and the
/// horizon is measured from it.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    pub base: CurrencyCode,
    pub quote: CurrencyCode,
    pub target: Date,
    pub amount: f64,
    pub as_of: Date,
}

impl PredictionRequest {
    pub fn new(base: CurrencyCode, quote: CurrencyCode, target: Date, amount: f64) -> Self {
        Self {
            base,
            quote,
            target,
            amount,
            as_of: today_utc(),
        }
    }

    /// Target `days_ahead` days after today (UTC).
    pub fn days_ahead(
        base: CurrencyCode,
        quote: CurrencyCode,
        days_ahead: u32,
        amount: f64,
    ) -> Result<Self, PredictionError> {
        let as_of = today_utc();
        let target = add_days(as_of, i64::from(days_ahead)).ok_or_else(|| {
            PredictionError::InvalidRequest(format!("{days_ahead} days ahead is out of range"))
        })?;

        Ok(Self {
            base,
            quote,
            target,
            amount,
            as_of,
        })
    }

    pub fn with_as_of(mut self, as_of: Date) -> Self {
        self.as_of = as_of;
        self
    }
}

/// Result of a prediction, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub provider: ProviderId,
    pub base: CurrencyCode,
    pub quote: CurrencyCode,
    #[serde(with = "iso_date")]
    pub origin: Date,
    #[serde(with = "iso_date")]
    pub last_observed: Date,
    #[serde(with = "iso_date")]
    pub target: Date,
    pub day_offset: i64,
    pub slope: f64,
    pub intercept: f64,
    pub predicted_rate: f64,
    pub amount: f64,
    pub converted_amount: f64,
    pub observations: usize,
    pub degenerate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<RateObservation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trajectory: Option<Vec<TrajectoryPoint>>,
}

/// Latest-rate conversion request.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub amount: f64,
}

impl ConversionRequest {
    pub fn new(from: CurrencyCode, to: CurrencyCode, amount: f64) -> Self {
        Self { from, to, amount }
    }
}

/// Result of a latest-rate conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    pub provider: ProviderId,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub rate: f64,
    pub amount: f64,
    pub converted_amount: f64,
}

/// Fit a trend on `series` and evaluate it at `target`.
///
/// # Errors
///
/// - [`PredictionError::InvalidTargetDate`] if `target` precedes the series origin
/// - [`PredictionError::DegenerateFit`] for one observation under a rejecting policy
pub fn forecast_from_series(
    provider: ProviderId,
    series: &RateSeries,
    target: Date,
    amount: f64,
    config: &ForecastConfig,
) -> Result<Forecast, PredictionError> {
    validate_amount(amount)?;

    let origin = series.origin();
    if target < origin {
        return Err(PredictionError::InvalidTargetDate {
            target: format_date(target),
            reason: format!("precedes the first observation on {}", format_date(origin)),
        });
    }

    let model = fit(series, config.degenerate_policy)?;
    if model.is_degenerate() {
        warn!(
            base = %series.base(),
            quote = %series.quote(),
            "single observation; using a flat trend"
        );
    }

    let predicted_rate = predict(&model, origin, target);
    let (history, trajectory) = if config.include_trajectory {
        let points: Vec<TrajectoryPoint> =
            predict_trajectory(&model, origin, origin, target).iter().collect();
        (Some(series.observations().to_vec()), Some(points))
    } else {
        (None, None)
    };

    Ok(Forecast {
        provider,
        base: series.base().clone(),
        quote: series.quote().clone(),
        origin,
        last_observed: series.last().date,
        target,
        day_offset: days_between(origin, target),
        slope: model.slope(),
        intercept: model.intercept(),
        predicted_rate,
        amount,
        converted_amount: amount * predicted_rate,
        observations: model.observations(),
        degenerate: model.is_degenerate(),
        history,
        trajectory,
    })
}

/// Flat 1.0 forecast for a pair quoted in its own currency, anchored at `as_of`.
fn identity_forecast(
    provider: ProviderId,
    request: &PredictionRequest,
    config: &ForecastConfig,
) -> Result<Forecast, PredictionError> {
    let origin = request.as_of;
    if request.target < origin {
        return Err(PredictionError::InvalidTargetDate {
            target: format_date(request.target),
            reason: format!("precedes the reference date {}", format_date(origin)),
        });
    }

    let day_offset = days_between(origin, request.target);
    let (history, trajectory) = if config.include_trajectory {
        let points: Vec<TrajectoryPoint> = (0..=day_offset)
            .filter_map(|offset| add_days(origin, offset))
            .map(|date| TrajectoryPoint { date, rate: 1.0 })
            .collect();
        (Some(Vec::new()), Some(points))
    } else {
        (None, None)
    };

    Ok(Forecast {
        provider,
        base: request.base.clone(),
        quote: request.quote.clone(),
        origin,
        last_observed: origin,
        target: request.target,
        day_offset,
        slope: 0.0,
        intercept: 1.0,
        predicted_rate: 1.0,
        amount: request.amount,
        converted_amount: request.amount,
        observations: 0,
        degenerate: false,
        history,
        trajectory,
    })
}

/// Request-scoped predictor and converter over one rate source.
pub struct Forecaster<S> {
    source: S,
    config: ForecastConfig,
}

impl<S: RateSource> Forecaster<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, ForecastConfig::default())
    }

    pub fn with_config(source: S, config: ForecastConfig) -> Self {
        Self { source, config }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Fetch history, fit a trend and extrapolate to `request.target`.
    ///
    /// The request is rejected before any fetch when the amount is invalid or
    /// the target lies beyond the configured horizon. A pair whose base and
    /// quote coincide is answered with a flat 1.0 without fetching.
    pub async fn predict(&self, request: &PredictionRequest) -> Result<Forecast, PredictionError> {
        validate_amount(request.amount)?;
        self.check_horizon(request)?;

        if request.base == request.quote {
            return identity_forecast(self.source.id(), request, &self.config);
        }

        let history_request = HistoryRequest::ending_on(
            request.base.clone(),
            request.quote.clone(),
            self.config.lookback_days,
            request.as_of,
        )
        .map_err(|error| PredictionError::InvalidRequest(error.message().to_owned()))?;

        let series = self
            .source
            .history(history_request)
            .await
            .map_err(|error| classify_source_error(error, &request.base, &request.quote))?;

        let forecast = forecast_from_series(
            self.source.id(),
            &series,
            request.target,
            request.amount,
            &self.config,
        )?;

        info!(
            provider = %forecast.provider,
            base = %forecast.base,
            quote = %forecast.quote,
            target = %format_date(forecast.target),
            observations = forecast.observations,
            predicted_rate = forecast.predicted_rate,
            "forecast ready"
        );
        Ok(forecast)
    }

    /// Convert `request.amount` at the latest published rate.
    pub async fn convert(&self, request: &ConversionRequest) -> Result<Conversion, PredictionError> {
        validate_amount(request.amount)?;

        let latest = self
            .source
            .latest(LatestRequest::new(request.from.clone()))
            .await
            .map_err(|error| classify_source_error(error, &request.from, &request.to))?;

        let rate = latest
            .rate_for(&request.to)
            .ok_or_else(|| PredictionError::EmptySeries {
                base: request.from.to_string(),
                quote: request.to.to_string(),
            })?;

        Ok(Conversion {
            provider: self.source.id(),
            from: request.from.clone(),
            to: request.to.clone(),
            date: latest.date,
            rate,
            amount: request.amount,
            converted_amount: request.amount * rate,
        })
    }

    fn check_horizon(&self, request: &PredictionRequest) -> Result<(), PredictionError> {
        let Some(max_days) = self.config.max_horizon_days else {
            return Ok(());
        };

        let ahead = days_between(request.as_of, request.target);
        if ahead > i64::from(max_days) {
            return Err(PredictionError::InvalidTargetDate {
                target: format_date(request.target),
                reason: format!(
                    "{ahead} days after {} exceeds the {max_days}-day horizon",
                    format_date(request.as_of)
                ),
            });
        }
        Ok(())
    }
}

fn classify_source_error(
    error: SourceError,
    base: &CurrencyCode,
    quote: &CurrencyCode,
) -> PredictionError {
    match error.kind() {
        SourceErrorKind::NoData => PredictionError::EmptySeries {
            base: base.to_string(),
            quote: quote.to_string(),
        },
        _ => PredictionError::FetchFailure(error),
    }
}

fn validate_amount(amount: f64) -> Result<(), PredictionError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(PredictionError::InvalidRequest(format!(
            "amount must be a finite, non-negative number (got {amount})"
        )));
    }
    Ok(())
}
