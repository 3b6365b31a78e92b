//! Properties of the linear trend predictor.
//!
//! Every case builds a small series by hand so the expected coefficients can
//! be checked against the closed form.

use fxtrend_core::{
    fit, predict, predict_trajectory, CurrencyCode, DegeneratePolicy, PredictionError,
    RateObservation, RateSeries,
};
use time::macros::date;
use time::{Date, Duration};

const EPSILON: f64 = 1e-9;

fn series(points: &[(Date, f64)]) -> RateSeries {
    RateSeries::new(
        CurrencyCode::parse("EUR").expect("valid code"),
        CurrencyCode::parse("USD").expect("valid code"),
        points
            .iter()
            .map(|(date, rate)| RateObservation::new(*date, *rate).expect("valid observation"))
            .collect(),
    )
    .expect("valid series")
}

fn day(offset: i64) -> Date {
    date!(2024 - 01 - 01) + Duration::days(offset)
}

/// Deterministic wiggly series: a trend plus a bounded zig-zag.
fn wiggly(len: i64, slope: f64) -> RateSeries {
    let points = (0..len)
        .map(|i| {
            let noise = if i % 2 == 0 { 0.003 } else { -0.003 };
            (day(i * 2 - i / 3), 1.1 + slope * i as f64 + noise)
        })
        .collect::<Vec<_>>();
    series(&points)
}

#[test]
fn prediction_at_origin_is_the_intercept() {
    for len in 2..12 {
        let series = wiggly(len, 0.002);
        let model = fit(&series, DegeneratePolicy::Constant).expect("fit");

        let at_origin = predict(&model, series.origin(), series.origin());
        assert!(
            (at_origin - model.intercept()).abs() < EPSILON,
            "len {len}: {at_origin} != {}",
            model.intercept()
        );
    }
}

#[test]
fn constant_series_predicts_the_constant_everywhere() {
    let series = series(&[(day(0), 1.25), (day(1), 1.25), (day(4), 1.25), (day(5), 1.25)]);
    let model = fit(&series, DegeneratePolicy::Constant).expect("fit");

    assert!(model.slope().abs() < EPSILON);
    for offset in [-30, 0, 3, 17, 365] {
        let rate = predict(&model, series.origin(), day(offset));
        assert!((rate - 1.25).abs() < EPSILON, "offset {offset}: {rate}");
    }
}

#[test]
fn two_points_give_exact_line() {
    // Given: (0, 1.0) and (10, 2.0)
    let series = series(&[(day(0), 1.0), (day(10), 2.0)]);

    // When
    let model = fit(&series, DegeneratePolicy::Constant).expect("fit");

    // Then
    assert!((model.slope() - 0.1).abs() < EPSILON);
    assert!((model.intercept() - 1.0).abs() < EPSILON);
    assert!((predict(&model, series.origin(), day(20)) - 3.0).abs() < EPSILON);
}

#[test]
fn end_to_end_usd_inr_reaches_84() {
    let series = RateSeries::new(
        CurrencyCode::parse("USD").expect("valid code"),
        CurrencyCode::parse("INR").expect("valid code"),
        vec![
            RateObservation::new(date!(2024 - 01 - 01), 83.0).expect("obs"),
            RateObservation::new(date!(2024 - 01 - 02), 83.2).expect("obs"),
            RateObservation::new(date!(2024 - 01 - 03), 83.4).expect("obs"),
        ],
    )
    .expect("series");

    let model = fit(&series, DegeneratePolicy::Constant).expect("fit");
    let rate = predict(&model, series.origin(), date!(2024 - 01 - 06));

    assert!((rate - 84.0).abs() < EPSILON, "got {rate}");
}

#[test]
fn gaps_in_dates_change_the_fit() {
    // Same rates, once on consecutive days and once with a weekend gap.
    let dense = series(&[(day(0), 1.0), (day(1), 1.1), (day(2), 1.2)]);
    let gapped = series(&[(day(0), 1.0), (day(1), 1.1), (day(4), 1.2)]);

    let dense_model = fit(&dense, DegeneratePolicy::Constant).expect("fit");
    let gapped_model = fit(&gapped, DegeneratePolicy::Constant).expect("fit");

    assert!((dense_model.slope() - 0.1).abs() < EPSILON);
    assert!(gapped_model.slope() < dense_model.slope());
}

#[test]
fn fitting_is_deterministic() {
    let series = wiggly(9, -0.004);

    let first = fit(&series, DegeneratePolicy::Constant).expect("fit");
    let second = fit(&series, DegeneratePolicy::Constant).expect("fit");

    assert_eq!(first.slope().to_bits(), second.slope().to_bits());
    assert_eq!(first.intercept().to_bits(), second.intercept().to_bits());
}

#[test]
fn trajectory_has_one_point_per_day_matching_predict() {
    let series = wiggly(7, 0.01);
    let model = fit(&series, DegeneratePolicy::Constant).expect("fit");
    let origin = series.origin();
    let target = origin + Duration::days(14);

    let trajectory = predict_trajectory(&model, origin, origin, target);
    let points = trajectory.iter().collect::<Vec<_>>();

    assert_eq!(points.len(), 15);
    assert_eq!(trajectory.len(), 15);
    assert!(points.windows(2).all(|pair| pair[0].date < pair[1].date));
    for point in &points {
        let expected = predict(&model, origin, point.date);
        assert!((point.rate - expected).abs() < EPSILON);
    }

    // Restartable: a second pass yields the same sequence.
    assert_eq!(trajectory.iter().collect::<Vec<_>>(), points);
}

#[test]
fn single_observation_follows_policy() {
    let series = series(&[(day(0), 0.92)]);

    let model = fit(&series, DegeneratePolicy::Constant).expect("constant fallback");
    assert!(model.is_degenerate());
    assert_eq!(model.slope(), 0.0);
    assert!((predict(&model, series.origin(), day(10)) - 0.92).abs() < EPSILON);

    let err = fit(&series, DegeneratePolicy::Reject).expect_err("must reject");
    assert_eq!(err, PredictionError::DegenerateFit);
}

#[test]
fn backward_target_extrapolates_without_panicking() {
    let series = series(&[(day(0), 1.0), (day(10), 2.0)]);
    let model = fit(&series, DegeneratePolicy::Constant).expect("fit");

    let rate = predict(&model, series.origin(), day(-5));
    assert!((rate - 0.5).abs() < EPSILON);
}
