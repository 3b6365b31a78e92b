mod exchangerate_host;
mod frankfurter;

use std::collections::BTreeMap;

use serde::Deserialize;

pub use exchangerate_host::ExchangeRateHostAdapter;
pub use frankfurter::FrankfurterAdapter;

use crate::data_source::SourceError;
use crate::domain::calendar::parse_date;
use crate::http_client::{HttpError, HttpResponse};
use crate::{CurrencyCode, LatestRates, ProviderId, RateObservation, RateSeries};

/// `{"YYYY-MM-DD": {"CODE": rate}}` as published by both providers.
pub(crate) type DailyRates = BTreeMap<String, BTreeMap<String, f64>>;

/// Latest-rates body shared by both providers.
#[derive(Debug, Deserialize)]
pub(crate) struct LatestPayload {
    date: String,
    #[serde(default)]
    rates: Option<BTreeMap<String, f64>>,
}

pub(crate) fn transport_error(provider: ProviderId, error: HttpError) -> SourceError {
    if error.is_timeout() {
        SourceError::timeout(format!("{provider} request timed out: {}", error.message()))
    } else {
        SourceError::unavailable(format!("{provider} transport error: {}", error.message()))
    }
}

/// Map a non-2xx status; `no_data_statuses` are answers meaning "unsupported pair or range".
pub(crate) fn check_status(
    provider: ProviderId,
    response: &HttpResponse,
    no_data_statuses: &[u16],
) -> Result<(), SourceError> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 429 {
        return Err(SourceError::rate_limited(format!(
            "{provider} rate limit exceeded"
        )));
    }
    if no_data_statuses.contains(&response.status) {
        return Err(SourceError::no_data(format!(
            "{provider} has no data for this request (status {})",
            response.status
        )));
    }
    Err(SourceError::unavailable(format!(
        "{provider} returned status {}",
        response.status
    )))
}

/// Build a series from per-date rate rows, keeping only rows that carry `quote`.
pub(crate) fn series_from_daily_rates(
    provider: ProviderId,
    base: &CurrencyCode,
    quote: &CurrencyCode,
    rates: DailyRates,
) -> Result<RateSeries, SourceError> {
    let mut observations = Vec::with_capacity(rates.len());
    for (raw_date, row) in rates {
        let Some(rate) = row.get(quote.as_str()).copied() else {
            continue;
        };
        let date = parse_date(&raw_date).map_err(|error| {
            SourceError::malformed(format!("{provider} returned a bad date: {error}"))
        })?;
        let observation = RateObservation::new(date, rate).map_err(|error| {
            SourceError::malformed(format!("{provider} returned a bad rate: {error}"))
        })?;
        observations.push(observation);
    }

    if observations.is_empty() {
        return Err(SourceError::no_data(format!(
            "{provider} returned no {base}/{quote} observations"
        )));
    }

    RateSeries::from_unordered(base.clone(), quote.clone(), observations)
        .map_err(|error| SourceError::malformed(format!("{provider} series rejected: {error}")))
}

pub(crate) fn latest_from_payload(
    provider: ProviderId,
    base: &CurrencyCode,
    payload: LatestPayload,
) -> Result<LatestRates, SourceError> {
    let rates = payload
        .rates
        .ok_or_else(|| SourceError::malformed(format!("{provider} response has no rates")))?;
    if rates.is_empty() {
        return Err(SourceError::no_data(format!(
            "{provider} published no rates for {base}"
        )));
    }
    let date = parse_date(&payload.date).map_err(|error| {
        SourceError::malformed(format!("{provider} returned a bad date: {error}"))
    })?;
    for (quote, rate) in &rates {
        RateObservation::new(date, *rate).map_err(|error| {
            SourceError::malformed(format!("{provider} returned a bad {quote} rate: {error}"))
        })?;
    }

    Ok(LatestRates::new(base.clone(), date, rates))
}

pub(crate) fn parse_body<'de, T: Deserialize<'de>>(
    provider: ProviderId,
    body: &'de str,
) -> Result<T, SourceError> {
    serde_json::from_str(body).map_err(|error| {
        SourceError::malformed(format!("failed to parse {provider} response: {error}"))
    })
}
