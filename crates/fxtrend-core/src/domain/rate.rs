use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::Date;

use super::calendar::{days_between, format_date, iso_date};
use crate::{CurrencyCode, ValidationError};

/// One daily exchange rate: units of quote currency per unit of base currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateObservation {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub rate: f64,
}

impl RateObservation {
    pub fn new(date: Date, rate: f64) -> Result<Self, ValidationError> {
        if !rate.is_finite() {
            return Err(ValidationError::NonFiniteValue { field: "rate" });
        }
        if rate <= 0.0 {
            return Err(ValidationError::NonPositiveRate {
                date: format_date(date),
            });
        }

        Ok(Self { date, rate })
    }
}

/// Non-empty, strictly date-ascending rate history for one currency pair.
///
/// The first observation's date is the origin (day offset 0) for trend fitting.
/// Gaps between dates (weekends, holidays) are allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRateSeries")]
pub struct RateSeries {
    base: CurrencyCode,
    quote: CurrencyCode,
    observations: Vec<RateObservation>,
}

#[derive(Deserialize)]
struct RawRateSeries {
    base: CurrencyCode,
    quote: CurrencyCode,
    observations: Vec<RateObservation>,
}

impl TryFrom<RawRateSeries> for RateSeries {
    type Error = ValidationError;

    fn try_from(raw: RawRateSeries) -> Result<Self, Self::Error> {
        Self::new(raw.base, raw.quote, raw.observations)
    }
}

impl RateSeries {
    /// Build a series from observations already ordered by date.
    pub fn new(
        base: CurrencyCode,
        quote: CurrencyCode,
        observations: Vec<RateObservation>,
    ) -> Result<Self, ValidationError> {
        if observations.is_empty() {
            return Err(ValidationError::EmptySeries);
        }

        for observation in &observations {
            RateObservation::new(observation.date, observation.rate)?;
        }

        for pair in observations.windows(2) {
            let (previous, current) = (pair[0].date, pair[1].date);
            if current == previous {
                return Err(ValidationError::DuplicateDate {
                    date: format_date(current),
                });
            }
            if current < previous {
                return Err(ValidationError::UnorderedDates {
                    previous: format_date(previous),
                    date: format_date(current),
                });
            }
        }

        Ok(Self {
            base,
            quote,
            observations,
        })
    }

    /// Build a series from observations in any order; duplicate dates are rejected.
    pub fn from_unordered(
        base: CurrencyCode,
        quote: CurrencyCode,
        observations: impl IntoIterator<Item = RateObservation>,
    ) -> Result<Self, ValidationError> {
        let mut by_date = BTreeMap::new();
        for observation in observations {
            if by_date.insert(observation.date, observation).is_some() {
                return Err(ValidationError::DuplicateDate {
                    date: format_date(observation.date),
                });
            }
        }

        Self::new(base, quote, by_date.into_values().collect())
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    pub fn quote(&self) -> &CurrencyCode {
        &self.quote
    }

    pub fn observations(&self) -> &[RateObservation] {
        &self.observations
    }

    /// Earliest observation date; day offset 0 for regression.
    pub fn origin(&self) -> Date {
        self.observations[0].date
    }

    pub fn first(&self) -> &RateObservation {
        &self.observations[0]
    }

    pub fn last(&self) -> &RateObservation {
        &self.observations[self.observations.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Whole days from the series origin to `date`.
    pub fn day_offset(&self, date: Date) -> i64 {
        days_between(self.origin(), date)
    }
}
