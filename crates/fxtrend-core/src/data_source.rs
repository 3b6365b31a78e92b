//! Rate history provider contract and request/error types.
//!
//! Every adapter implements [`RateSource`]. Adapters return a validated
//! [`RateSeries`] or a [`SourceError`] whose kind tells callers *why* no
//! series is available:
//!
//! | Kind | Meaning |
//! |------|---------|
//! | `Unavailable` | transport failure or non-2xx status |
//! | `Timeout` | request exceeded its timeout |
//! | `RateLimited` | upstream answered 429 |
//! | `InvalidRequest` | upstream rejected the parameters |
//! | `Malformed` | body could not be parsed |
//! | `NoData` | well-formed answer without usable observations |
//! | `Internal` | adapter bug or invariant violation |
//!
//! `NoData` is deliberately separate from the transport failures so a
//! forecast can report "nothing to fit" instead of "try again later".

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use time::Date;

use crate::domain::calendar::{add_days, format_date, today_utc};
use crate::{CurrencyCode, LatestRates, ProviderId, RateSeries};

/// Default history window, in calendar days.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 60;

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    Timeout,
    RateLimited,
    InvalidRequest,
    Malformed,
    NoData,
    Internal,
}

/// Structured source error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Timeout,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Malformed,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn no_data(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::NoData,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::Timeout => "source.timeout",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Malformed => "source.malformed",
            SourceErrorKind::NoData => "source.no_data",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Request payload for history endpoints.
///
/// The window runs from `lookback_days` days before `end` through `end`, both
/// ends included; the provider may return fewer observations than days.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryRequest {
    pub base: CurrencyCode,
    pub quote: CurrencyCode,
    pub lookback_days: u32,
    pub end: Date,
}

impl HistoryRequest {
    /// Window of `lookback_days` ending today (UTC).
    pub fn new(
        base: CurrencyCode,
        quote: CurrencyCode,
        lookback_days: u32,
    ) -> Result<Self, SourceError> {
        Self::ending_on(base, quote, lookback_days, today_utc())
    }

    pub fn ending_on(
        base: CurrencyCode,
        quote: CurrencyCode,
        lookback_days: u32,
        end: Date,
    ) -> Result<Self, SourceError> {
        if lookback_days == 0 {
            return Err(SourceError::invalid_request(
                "history lookback must be at least one day",
            ));
        }
        if add_days(end, -i64::from(lookback_days)).is_none() {
            return Err(SourceError::invalid_request(format!(
                "history lookback of {lookback_days} days before {} is out of range",
                format_date(end)
            )));
        }

        Ok(Self {
            base,
            quote,
            lookback_days,
            end,
        })
    }

    /// First calendar day of the window.
    pub fn start(&self) -> Date {
        add_days(self.end, -i64::from(self.lookback_days)).unwrap_or(Date::MIN)
    }
}

/// Request payload for latest-rate endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LatestRequest {
    pub base: CurrencyCode,
}

impl LatestRequest {
    pub fn new(base: CurrencyCode) -> Self {
        Self { base }
    }
}

/// Rate history provider contract.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; a single adapter may serve
/// several sequential requests and may be wrapped in a cache.
pub trait RateSource: Send + Sync {
    /// Returns the unique provider identifier.
    fn id(&self) -> ProviderId;

    /// Fetches the daily rate series for `req.base`/`req.quote` over the window.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] with kind `NoData` when the provider answered
    /// but no observation carried the quote currency; any other kind means
    /// the fetch itself failed.
    fn history<'a>(
        &'a self,
        req: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RateSeries, SourceError>> + Send + 'a>>;

    /// Fetches the latest published rates for `req.base`.
    fn latest<'a>(
        &'a self,
        req: LatestRequest,
    ) -> Pin<Box<dyn Future<Output = Result<LatestRates, SourceError>> + Send + 'a>>;
}

impl<S: RateSource + ?Sized> RateSource for Box<S> {
    fn id(&self) -> ProviderId {
        (**self).id()
    }

    fn history<'a>(
        &'a self,
        req: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RateSeries, SourceError>> + Send + 'a>> {
        (**self).history(req)
    }

    fn latest<'a>(
        &'a self,
        req: LatestRequest,
    ) -> Pin<Box<dyn Future<Output = Result<LatestRates, SourceError>> + Send + 'a>> {
        (**self).latest(req)
    }
}

impl<S: RateSource + ?Sized> RateSource for Arc<S> {
    fn id(&self) -> ProviderId {
        (**self).id()
    }

    fn history<'a>(
        &'a self,
        req: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RateSeries, SourceError>> + Send + 'a>> {
        (**self).history(req)
    }

    fn latest<'a>(
        &'a self,
        req: LatestRequest,
    ) -> Pin<Box<dyn Future<Output = Result<LatestRates, SourceError>> + Send + 'a>> {
        (**self).latest(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::calendar::days_between;
    use time::macros::date;

    fn code(value: &str) -> CurrencyCode {
        CurrencyCode::parse(value).expect("valid code")
    }

    #[test]
    fn history_window_spans_lookback_days() {
        let request = HistoryRequest::ending_on(code("USD"), code("INR"), 60, date!(2024 - 03 - 01))
            .expect("valid request");
        assert_eq!(request.start(), date!(2024 - 01 - 01));
        assert_eq!(days_between(request.start(), request.end), 60);
    }

    #[test]
    fn zero_lookback_is_rejected() {
        let err = HistoryRequest::new(code("USD"), code("INR"), 0).expect_err("must fail");
        assert_eq!(err.kind(), SourceErrorKind::InvalidRequest);
        assert!(!err.retryable());
    }

    #[test]
    fn no_data_is_distinct_from_transport_failures() {
        let empty = SourceError::no_data("nothing");
        let down = SourceError::unavailable("down");
        assert_ne!(empty.kind(), down.kind());
        assert_eq!(empty.code(), "source.no_data");
        assert!(down.retryable());
        assert!(SourceError::timeout("slow").retryable());
    }
}
