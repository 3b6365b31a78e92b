use thiserror::Error;

use crate::data_source::SourceError;

/// Validation and contract errors exposed by `fxtrend-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("currency code cannot be empty")]
    EmptyCurrency,

    #[error("invalid source '{value}', expected one of frankfurter, exchangerate-host")]
    InvalidSource { value: String },

    #[error("date must be formatted as YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },
    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("rate on {date} must be strictly positive")]
    NonPositiveRate { date: String },

    #[error("rate series must contain at least one observation")]
    EmptySeries,
    #[error("rate series has a duplicate observation on {date}")]
    DuplicateDate { date: String },
    #[error("rate series must be ordered by date: {date} follows {previous}")]
    UnorderedDates { previous: String, date: String },

    #[error("request_id must be at least 8 characters")]
    InvalidRequestId,
    #[error("schema_version must match vMAJOR.MINOR.PATCH: '{value}'")]
    InvalidSchemaVersion { value: String },
    #[error("source_chain must contain at least one source")]
    EmptySourceChain,

    #[error("error code cannot be empty")]
    EmptyErrorCode,
    #[error("error message cannot be empty")]
    EmptyErrorMessage,
}

/// Per-request prediction failures.
///
/// None of these are process-fatal; each one terminates a single request.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PredictionError {
    /// Transport, timeout, non-2xx or unparseable provider response.
    #[error("cannot predict: rate history fetch failed: {0}")]
    FetchFailure(SourceError),

    /// The fetch succeeded but produced no usable observations.
    #[error("cannot predict: no {base}/{quote} observations available")]
    EmptySeries { base: String, quote: String },

    #[error("cannot fit a trend on a single observation")]
    DegenerateFit,

    #[error("invalid target date {target}: {reason}")]
    InvalidTargetDate { target: String, reason: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl PredictionError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::FetchFailure(_) => "predict.fetch_failure",
            Self::EmptySeries { .. } => "predict.empty_series",
            Self::DegenerateFit => "predict.degenerate_fit",
            Self::InvalidTargetDate { .. } => "predict.invalid_target_date",
            Self::InvalidRequest(_) => "predict.invalid_request",
            Self::Validation(_) => "predict.validation",
        }
    }

    pub fn retryable(&self) -> bool {
        match self {
            Self::FetchFailure(error) => error.retryable(),
            _ => false,
        }
    }
}
