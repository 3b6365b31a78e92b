//! Core contracts for fxtrend.
//!
//! This crate contains:
//! - Canonical domain models and validation (currencies, dated rates, series)
//! - Provider identifiers and the [`RateSource`] contract with HTTP adapters
//! - A TTL cache that can wrap any rate source
//! - The linear trend predictor ([`fit`], [`predict`], [`predict_trajectory`])
//! - A request-scoped [`Forecaster`] and the JSON response envelope

pub mod adapters;
pub mod cache;
pub mod data_source;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod forecast;
pub mod http_client;
pub mod predictor;
pub mod source;

pub use adapters::{ExchangeRateHostAdapter, FrankfurterAdapter};
pub use cache::{CacheMode, CacheStore, CachedSource, DEFAULT_CACHE_TTL};
pub use data_source::{
    HistoryRequest, LatestRequest, RateSource, SourceError, SourceErrorKind, DEFAULT_LOOKBACK_DAYS,
};
pub use domain::{CurrencyCode, LatestRates, RateObservation, RateSeries, UtcDateTime};
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta, SCHEMA_VERSION};
pub use error::{PredictionError, ValidationError};
pub use forecast::{
    forecast_from_series, Conversion, ConversionRequest, Forecast, ForecastConfig, Forecaster,
    PredictionRequest, DEFAULT_MAX_HORIZON_DAYS,
};
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient, StaticHttpClient,
    DEFAULT_TIMEOUT_MS,
};
pub use predictor::{
    fit, predict, predict_trajectory, DegeneratePolicy, Trajectory, TrajectoryIter,
    TrajectoryPoint, TrendModel,
};
pub use source::ProviderId;
