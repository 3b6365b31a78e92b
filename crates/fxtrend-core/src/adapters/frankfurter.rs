use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use super::{
    check_status, latest_from_payload, parse_body, series_from_daily_rates, transport_error,
    DailyRates, LatestPayload,
};
use crate::data_source::{HistoryRequest, LatestRequest, RateSource, SourceError};
use crate::domain::calendar::format_date;
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient, DEFAULT_TIMEOUT_MS};
use crate::{LatestRates, ProviderId, RateSeries};

const DEFAULT_BASE_URL: &str = "https://api.frankfurter.app";
const PROVIDER: ProviderId = ProviderId::Frankfurter;

/// Frankfurter (ECB reference rates) adapter. Publishes business days only.
#[derive(Clone)]
pub struct FrankfurterAdapter {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
}

impl Default for FrankfurterAdapter {
    fn default() -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()))
    }
}

impl FrankfurterAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: std::env::var("FXTREND_FRANKFURTER_URL")
                .unwrap_or_else(|_| String::from(DEFAULT_BASE_URL)),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }

    async fn fetch_history(&self, req: &HistoryRequest) -> Result<RateSeries, SourceError> {
        let range = format!("{}..{}", format_date(req.start()), format_date(req.end));
        let request = HttpRequest::get(self.endpoint(&range))
            .with_query("from", req.base.as_str())
            .with_query("to", req.quote.as_str())
            .with_header("Accept", "application/json")
            .with_timeout_ms(self.timeout_ms);

        debug!(provider = %PROVIDER, base = %req.base, quote = %req.quote, %range, "fetching rate history");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|error| transport_error(PROVIDER, error))?;
        // 404: unknown currency; 422: range outside published data.
        check_status(PROVIDER, &response, &[404, 422])?;

        let payload: TimeseriesPayload = parse_body(PROVIDER, &response.body)?;
        let rates = payload
            .rates
            .ok_or_else(|| SourceError::malformed("frankfurter response has no rates"))?;

        series_from_daily_rates(PROVIDER, &req.base, &req.quote, rates)
    }

    async fn fetch_latest(&self, req: &LatestRequest) -> Result<LatestRates, SourceError> {
        let request = HttpRequest::get(self.endpoint("latest"))
            .with_query("from", req.base.as_str())
            .with_header("Accept", "application/json")
            .with_timeout_ms(self.timeout_ms);

        debug!(provider = %PROVIDER, base = %req.base, "fetching latest rates");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|error| transport_error(PROVIDER, error))?;
        check_status(PROVIDER, &response, &[404, 422])?;

        let payload: LatestPayload = parse_body(PROVIDER, &response.body)?;
        latest_from_payload(PROVIDER, &req.base, payload)
    }
}

impl RateSource for FrankfurterAdapter {
    fn id(&self) -> ProviderId {
        PROVIDER
    }

    fn history<'a>(
        &'a self,
        req: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RateSeries, SourceError>> + Send + 'a>> {
        Box::pin(async move { self.fetch_history(&req).await })
    }

    fn latest<'a>(
        &'a self,
        req: LatestRequest,
    ) -> Pin<Box<dyn Future<Output = Result<LatestRates, SourceError>> + Send + 'a>> {
        Box::pin(async move { self.fetch_latest(&req).await })
    }
}

#[derive(Debug, Deserialize)]
struct TimeseriesPayload {
    #[serde(default)]
    rates: Option<DailyRates>,
}
