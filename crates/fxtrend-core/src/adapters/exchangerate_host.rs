use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{
    check_status, latest_from_payload, parse_body, series_from_daily_rates, transport_error,
    DailyRates, LatestPayload,
};
use crate::data_source::{HistoryRequest, LatestRequest, RateSource, SourceError};
use crate::domain::calendar::format_date;
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient, DEFAULT_TIMEOUT_MS};
use crate::{LatestRates, ProviderId, RateSeries};

const DEFAULT_BASE_URL: &str = "https://api.exchangerate.host";
const PROVIDER: ProviderId = ProviderId::ExchangerateHost;

/// exchangerate.host adapter.
///
/// The access key, when configured, is sent as the `access_key` query
/// parameter and is never logged.
#[derive(Clone)]
pub struct ExchangeRateHostAdapter {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    api_key: Option<String>,
    timeout_ms: u64,
}

impl Default for ExchangeRateHostAdapter {
    fn default() -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()))
    }
}

impl ExchangeRateHostAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: std::env::var("FXTREND_EXCHANGERATE_HOST_URL")
                .unwrap_or_else(|_| String::from(DEFAULT_BASE_URL)),
            api_key: std::env::var("FXTREND_EXCHANGERATE_HOST_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    fn request(&self, path: &str) -> HttpRequest {
        let request = HttpRequest::get(format!(
            "{}/{path}",
            self.base_url.trim_end_matches('/')
        ))
        .with_header("Accept", "application/json")
        .with_timeout_ms(self.timeout_ms);

        match &self.api_key {
            Some(key) => request.with_query("access_key", key),
            None => request,
        }
    }

    async fn fetch_history(&self, req: &HistoryRequest) -> Result<RateSeries, SourceError> {
        let request = self
            .request("timeseries")
            .with_query("start_date", &format_date(req.start()))
            .with_query("end_date", &format_date(req.end))
            .with_query("base", req.base.as_str())
            .with_query("symbols", req.quote.as_str());

        debug!(
            provider = %PROVIDER,
            base = %req.base,
            quote = %req.quote,
            lookback_days = req.lookback_days,
            "fetching rate history"
        );

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|error| transport_error(PROVIDER, error))?;
        check_status(PROVIDER, &response, &[404])?;

        let payload: TimeseriesPayload = parse_body(PROVIDER, &response.body)?;
        payload.status.check_success()?;
        let rates = payload
            .rates
            .ok_or_else(|| SourceError::malformed("exchangerate-host response has no rates"))?;

        series_from_daily_rates(PROVIDER, &req.base, &req.quote, rates)
    }

    async fn fetch_latest(&self, req: &LatestRequest) -> Result<LatestRates, SourceError> {
        let request = self.request("latest").with_query("base", req.base.as_str());

        debug!(provider = %PROVIDER, base = %req.base, "fetching latest rates");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|error| transport_error(PROVIDER, error))?;
        check_status(PROVIDER, &response, &[404])?;

        let status: StatusPayload = parse_body(PROVIDER, &response.body)?;
        status.check_success()?;
        let payload: LatestPayload = parse_body(PROVIDER, &response.body)?;
        latest_from_payload(PROVIDER, &req.base, payload)
    }
}

impl RateSource for ExchangeRateHostAdapter {
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

/// `{"success": false, "error": {...}}` is returned with HTTP 200.
fn rejected(error: Option<&Value>) -> SourceError {
    let detail = error
        .and_then(|value| {
            value
                .get("info")
                .or_else(|| value.get("type"))
                .and_then(Value::as_str)
                .map(str::to_owned)
        })
        .unwrap_or_else(|| String::from("request rejected"));
    SourceError::invalid_request(format!("exchangerate-host: {detail}"))
}

#[derive(Debug, Deserialize)]
struct StatusPayload {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    error: Option<Value>,
}

impl StatusPayload {
    fn check_success(&self) -> Result<(), SourceError> {
        match self.success {
            Some(false) => Err(rejected(self.error.as_ref())),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TimeseriesPayload {
    #[serde(flatten)]
    status: StatusPayload,
    #[serde(default)]
    rates: Option<DailyRates>,
}
