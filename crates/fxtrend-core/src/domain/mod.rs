//! # Domain Models
//!
//! Canonical domain types for fxtrend.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`CurrencyCode`] | Opaque, upper-cased currency code |
//! | [`RateObservation`] | One dated exchange rate |
//! | [`RateSeries`] | Non-empty, date-ascending history for a pair |
//! | [`LatestRates`] | Latest rates for a base currency |
//! | [`UtcDateTime`] | UTC timestamp for metadata |
//!
//! All series invariants (non-empty, strictly ascending, unique dates,
//! positive finite rates) are enforced at construction, including when
//! deserializing.

pub mod calendar;
mod currency;
mod latest;
mod rate;

pub use calendar::UtcDateTime;
pub use currency::CurrencyCode;
pub use latest::LatestRates;
pub use rate::{RateObservation, RateSeries};
