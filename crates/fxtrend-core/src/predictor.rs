//! Linear trend fitting and extrapolation over a daily rate series.
//!
//! The model regresses `rate` on `day_offset`, the whole number of calendar
//! days since the series origin (its earliest date), using ordinary least
//! squares with an intercept:
//!
//! ```text
//! slope     = Σ (x - x̄)(y - ȳ) / Σ (x - x̄)²
//! intercept = ȳ - slope · x̄
//! rate(x)   = slope · x + intercept
//! ```
//!
//! Offsets come from actual observation dates, so weekend and holiday gaps
//! are honored rather than collapsed.
//!
//! # Example
//!
//! ```rust
//! use fxtrend_core::{fit, predict, CurrencyCode, DegeneratePolicy, RateObservation, RateSeries};
//! use time::macros::date;
//!
//! let series = RateSeries::new(
//!     CurrencyCode::parse("USD").unwrap(),
//!     CurrencyCode::parse("INR").unwrap(),
//!     vec![
//!         RateObservation::new(date!(2024 - 01 - 01), 83.0).unwrap(),
//!         RateObservation::new(date!(2024 - 01 - 02), 83.2).unwrap(),
//!         RateObservation::new(date!(2024 - 01 - 03), 83.4).unwrap(),
//!     ],
//! )
//! .unwrap();
//!
//! let model = fit(&series, DegeneratePolicy::Constant).unwrap();
//! let rate = predict(&model, series.origin(), date!(2024 - 01 - 06));
//! assert!((rate - 84.0).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use time::Date;

use crate::domain::calendar::{days_between, iso_date};
use crate::{PredictionError, RateSeries};

/// What to do when the series holds a single observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Flat line through the only rate (slope 0). (Default)
    #[default]
    Constant,
    /// Refuse with [`PredictionError::DegenerateFit`].
    Reject,
}

/// Fitted `rate = slope · day_offset + intercept`, anchored at `origin`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendModel {
    slope: f64,
    intercept: f64,
    #[serde(with = "iso_date")]
    origin: Date,
    observations: usize,
    degenerate: bool,
}

impl TrendModel {
    /// Rate change per calendar day.
    pub fn slope(&self) -> f64 {
        self.slope
    }

    /// Rate at day offset 0.
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn origin(&self) -> Date {
        self.origin
    }

    /// Number of observations the model was fitted on.
    pub fn observations(&self) -> usize {
        self.observations
    }

    /// `true` when the single-observation fallback produced this model.
    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    pub fn rate_at(&self, day_offset: i64) -> f64 {
        self.slope * day_offset as f64 + self.intercept
    }

    /// Rate on `date`, measured from the model's own origin.
    pub fn rate_on(&self, date: Date) -> f64 {
        self.rate_at(days_between(self.origin, date))
    }
}

/// Fit a trend on `series` by ordinary least squares.
///
/// # Errors
///
/// [`PredictionError::DegenerateFit`] for a single observation under
/// [`DegeneratePolicy::Reject`].
pub fn fit(series: &RateSeries, policy: DegeneratePolicy) -> Result<TrendModel, PredictionError> {
    let origin = series.origin();
    let observations = series.observations();
    let n = observations.len() as f64;

    let points: Vec<(f64, f64)> = observations
        .iter()
        .map(|obs| (days_between(origin, obs.date) as f64, obs.rate))
        .collect();

    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), (x, y)| {
        let dx = x - mean_x;
        (sxy + dx * (y - mean_y), sxx + dx * dx)
    });

    // Distinct dates make sxx > 0 whenever there are two or more points.
    if observations.len() < 2 || sxx == 0.0 {
        return match policy {
            DegeneratePolicy::Reject => Err(PredictionError::DegenerateFit),
            DegeneratePolicy::Constant => Ok(TrendModel {
                slope: 0.0,
                intercept: mean_y,
                origin,
                observations: observations.len(),
                degenerate: true,
            }),
        };
    }

    let slope = sxy / sxx;
    Ok(TrendModel {
        slope,
        intercept: mean_y - slope * mean_x,
        origin,
        observations: observations.len(),
        degenerate: false,
    })
}

/// Extrapolate the rate on `target_date`, measuring offsets from `origin_date`.
///
/// Negative offsets (target before origin) evaluate the same line backwards.
/// No clamping is applied.
pub fn predict(model: &TrendModel, origin_date: Date, target_date: Date) -> f64 {
    model.rate_at(days_between(origin_date, target_date))
}

/// One day on a predicted trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub rate: f64,
}

/// Daily trend values from `start_date` through `end_date` inclusive.
///
/// Holds no points of its own; each call to [`Trajectory::iter`] starts a
/// fresh pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trajectory {
    model: TrendModel,
    origin: Date,
    start: Date,
    end: Date,
}

pub fn predict_trajectory(
    model: &TrendModel,
    origin_date: Date,
    start_date: Date,
    end_date: Date,
) -> Trajectory {
    Trajectory {
        model: *model,
        origin: origin_date,
        start: start_date,
        end: end_date,
    }
}

impl Trajectory {
    pub fn iter(&self) -> TrajectoryIter {
        TrajectoryIter {
            model: self.model,
            origin: self.origin,
            next: (self.start <= self.end).then_some(self.start),
            end: self.end,
        }
    }

    pub fn len(&self) -> usize {
        remaining(Some(self.start), self.end)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn start(&self) -> Date {
        self.start
    }

    pub fn end(&self) -> Date {
        self.end
    }
}

impl IntoIterator for Trajectory {
    type Item = TrajectoryPoint;
    type IntoIter = TrajectoryIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for &Trajectory {
    type Item = TrajectoryPoint;
    type IntoIter = TrajectoryIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy pass over a [`Trajectory`].
#[derive(Debug, Clone)]
pub struct TrajectoryIter {
    model: TrendModel,
    origin: Date,
    next: Option<Date>,
    end: Date,
}

impl Iterator for TrajectoryIter {
    type Item = TrajectoryPoint;

    fn next(&mut self) -> Option<Self::Item> {
        let date = self.next?;
        self.next = date.next_day().filter(|next| *next <= self.end);
        Some(TrajectoryPoint {
            date,
            rate: predict(&self.model, self.origin, date),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = remaining(self.next, self.end);
        (len, Some(len))
    }
}

impl ExactSizeIterator for TrajectoryIter {}

impl std::iter::FusedIterator for TrajectoryIter {}

fn remaining(next: Option<Date>, end: Date) -> usize {
    match next {
        Some(next) if next <= end => (days_between(next, end) + 1) as usize,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CurrencyCode, RateObservation};
    use time::macros::date;

    const EPS: f64 = 1e-9;

    fn series(points: &[(Date, f64)]) -> RateSeries {
        RateSeries::new(
            CurrencyCode::parse("USD").expect("code"),
            CurrencyCode::parse("INR").expect("code"),
            points
                .iter()
                .map(|(date, rate)| RateObservation::new(*date, *rate).expect("observation"))
                .collect(),
        )
        .expect("series")
    }

    #[test]
    fn two_points_give_exact_line() {
        let s = series(&[(date!(2024 - 01 - 01), 1.0), (date!(2024 - 01 - 11), 2.0)]);
        let model = fit(&s, DegeneratePolicy::Constant).expect("fit");

        assert!((model.slope() - 0.1).abs() < EPS);
        assert!((model.intercept() - 1.0).abs() < EPS);
        assert!((model.rate_on(date!(2024 - 01 - 21)) - 3.0).abs() < EPS);
        assert!((model.rate_at(20) - 3.0).abs() < EPS);
        assert!(!model.is_degenerate());
    }

    #[test]
    fn single_point_constant_policy_is_flat() {
        let s = series(&[(date!(2024 - 01 - 01), 83.0)]);
        let model = fit(&s, DegeneratePolicy::Constant).expect("fit");

        assert_eq!(model.slope(), 0.0);
        assert_eq!(model.intercept(), 83.0);
        assert!(model.is_degenerate());
        assert_eq!(predict(&model, s.origin(), date!(2024 - 01 - 31)), 83.0);
    }

    #[test]
    fn single_point_reject_policy_fails() {
        let s = series(&[(date!(2024 - 01 - 01), 83.0)]);
        let err = fit(&s, DegeneratePolicy::Reject).expect_err("must fail");
        assert_eq!(err, PredictionError::DegenerateFit);
    }

    #[test]
    fn irregular_spacing_uses_calendar_offsets() {
        // Friday, Monday, Tuesday: offsets 0, 3, 4.
        let s = series(&[
            (date!(2024 - 01 - 05), 1.0),
            (date!(2024 - 01 - 08), 1.3),
            (date!(2024 - 01 - 09), 1.4),
        ]);
        let model = fit(&s, DegeneratePolicy::Constant).expect("fit");

        assert!((model.slope() - 0.1).abs() < EPS);
        assert!((model.intercept() - 1.0).abs() < EPS);
    }

    #[test]
    fn backward_target_extrapolates_without_panicking() {
        let s = series(&[(date!(2024 - 01 - 01), 1.0), (date!(2024 - 01 - 11), 2.0)]);
        let model = fit(&s, DegeneratePolicy::Constant).expect("fit");

        let rate = predict(&model, s.origin(), date!(2023 - 12 - 22));
        assert!((rate - 0.0).abs() < EPS);
    }

    #[test]
    fn trajectory_is_restartable_and_sized() {
        let s = series(&[(date!(2024 - 01 - 01), 1.0), (date!(2024 - 01 - 11), 2.0)]);
        let model = fit(&s, DegeneratePolicy::Constant).expect("fit");
        let trajectory = predict_trajectory(&model, s.origin(), s.origin(), date!(2024 - 01 - 21));

        assert_eq!(trajectory.len(), 21);
        let mut iter = trajectory.iter();
        assert_eq!(iter.len(), 21);
        iter.next();
        assert_eq!(iter.len(), 20);

        let first: Vec<_> = trajectory.iter().collect();
        let second: Vec<_> = trajectory.iter().collect();
        assert_eq!(first, second);
        assert!((first[20].rate - 3.0).abs() < EPS);
    }

    #[test]
    fn inverted_trajectory_is_empty() {
        let s = series(&[(date!(2024 - 01 - 01), 1.0)]);
        let model = fit(&s, DegeneratePolicy::Constant).expect("fit");
        let trajectory =
            predict_trajectory(&model, s.origin(), date!(2024 - 01 - 05), date!(2024 - 01 - 04));

        assert!(trajectory.is_empty());
        assert_eq!(trajectory.iter().count(), 0);
    }

    #[test]
    fn trajectory_stops_at_last_representable_date() {
        let s = series(&[(date!(2024 - 01 - 01), 1.0)]);
        let model = fit(&s, DegeneratePolicy::Constant).expect("fit");
        let start = Date::MAX.previous_day().expect("day before max");
        let trajectory = predict_trajectory(&model, s.origin(), start, Date::MAX);

        assert_eq!(trajectory.iter().count(), 2);
    }
}
