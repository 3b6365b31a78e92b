//! Contract every rate provider must satisfy, checked against canned HTTP
//! answers so the suite runs offline.

use std::sync::Arc;

use fxtrend_core::{
    CurrencyCode, ExchangeRateHostAdapter, FrankfurterAdapter, HistoryRequest, HttpError,
    HttpResponse, LatestRequest, ProviderId, RateSource, SourceErrorKind, StaticHttpClient,
};
use time::macros::date;

const FRANKFURTER_HISTORY: &str = r#"{"amount":1.0,"base":"USD","start_date":"2024-01-02",
    "end_date":"2024-01-05","rates":{"2024-01-05":{"INR":83.5},"2024-01-02":{"INR":83.2},
    "2024-01-03":{"INR":83.3}}}"#;

const EXCHANGERATE_HOST_HISTORY: &str = r#"{"success":true,"timeseries":true,"base":"USD",
    "rates":{"2024-01-02":{"INR":83.2},"2024-01-03":{"INR":83.3},"2024-01-05":{"INR":83.5}}}"#;

const FRANKFURTER_LATEST: &str =
    r#"{"amount":1.0,"base":"USD","date":"2024-01-05","rates":{"INR":83.5,"EUR":0.91}}"#;

const EXCHANGERATE_HOST_LATEST: &str =
    r#"{"success":true,"base":"USD","date":"2024-01-05","rates":{"INR":83.5,"EUR":0.91}}"#;

struct ProviderCase {
    id: ProviderId,
    history_body: &'static str,
    latest_body: &'static str,
}

fn provider_cases() -> Vec<ProviderCase> {
    vec![
        ProviderCase {
            id: ProviderId::Frankfurter,
            history_body: FRANKFURTER_HISTORY,
            latest_body: FRANKFURTER_LATEST,
        },
        ProviderCase {
            id: ProviderId::ExchangerateHost,
            history_body: EXCHANGERATE_HOST_HISTORY,
            latest_body: EXCHANGERATE_HOST_LATEST,
        },
    ]
}

fn adapter(id: ProviderId, client: StaticHttpClient) -> Arc<dyn RateSource> {
    let client = Arc::new(client);
    match id {
        ProviderId::Frankfurter => Arc::new(
            FrankfurterAdapter::with_http_client(client).with_base_url("https://fx.example.test"),
        ),
        ProviderId::ExchangerateHost => Arc::new(
            ExchangeRateHostAdapter::with_http_client(client)
                .with_base_url("https://fx.example.test"),
        ),
    }
}

fn code(value: &str) -> CurrencyCode {
    CurrencyCode::parse(value).expect("valid code")
}

fn history_request() -> HistoryRequest {
    HistoryRequest::ending_on(code("USD"), code("INR"), 5, date!(2024 - 01 - 06))
        .expect("valid request")
}

#[tokio::test]
async fn history_is_ordered_and_positive_for_all_providers() {
    for case in provider_cases() {
        let source = adapter(
            case.id,
            StaticHttpClient::always(Ok(HttpResponse::ok_json(case.history_body))),
        );

        let series = source
            .history(history_request())
            .await
            .unwrap_or_else(|error| panic!("provider '{}' history failed: {error}", case.id));

        assert_eq!(source.id(), case.id);
        assert_eq!(series.len(), 3, "provider '{}': observation count", case.id);
        assert_eq!(series.base().as_str(), "USD");
        assert_eq!(series.quote().as_str(), "INR");
        assert_eq!(series.origin(), date!(2024 - 01 - 02), "provider '{}'", case.id);
        assert!(
            series
                .observations()
                .windows(2)
                .all(|pair| pair[0].date < pair[1].date),
            "provider '{}': dates must ascend",
            case.id
        );
        assert!(series.observations().iter().all(|obs| obs.rate > 0.0));
    }
}

#[tokio::test]
async fn providers_agree_on_identical_data() {
    let mut signatures = Vec::new();

    for case in provider_cases() {
        let source = adapter(
            case.id,
            StaticHttpClient::always(Ok(HttpResponse::ok_json(case.history_body))),
        );
        let series = source.history(history_request()).await.expect("history");
        signatures.push(series.observations().to_vec());
    }

    for signature in signatures.iter().skip(1) {
        assert_eq!(signature, &signatures[0]);
    }
}

#[tokio::test]
async fn latest_rates_resolve_quote_for_all_providers() {
    for case in provider_cases() {
        let source = adapter(
            case.id,
            StaticHttpClient::always(Ok(HttpResponse::ok_json(case.latest_body))),
        );

        let latest = source
            .latest(LatestRequest::new(code("USD")))
            .await
            .unwrap_or_else(|error| panic!("provider '{}' latest failed: {error}", case.id));

        assert_eq!(latest.date, date!(2024 - 01 - 05));
        assert_eq!(latest.rate_for(&code("INR")), Some(83.5));
        assert_eq!(latest.rate_for(&code("USD")), Some(1.0));
        assert_eq!(latest.rate_for(&code("XYZ")), None);
    }
}

#[tokio::test]
async fn missing_quote_is_no_data_not_a_fetch_failure() {
    for case in provider_cases() {
        let body = case.history_body.replace("INR", "GBP");
        let source = adapter(
            case.id,
            StaticHttpClient::always(Ok(HttpResponse::ok_json(body))),
        );

        let err = source
            .history(history_request())
            .await
            .expect_err("quote absent from payload");
        assert_eq!(err.kind(), SourceErrorKind::NoData, "provider '{}'", case.id);
        assert!(!err.retryable());
    }
}

#[tokio::test]
async fn transport_failures_are_classified_for_all_providers() {
    let failures = [
        (Err(HttpError::timeout("elapsed")), SourceErrorKind::Timeout),
        (Err(HttpError::new("connection refused")), SourceErrorKind::Unavailable),
        (Ok(HttpResponse::new(429, "{}")), SourceErrorKind::RateLimited),
        (Ok(HttpResponse::new(503, "down")), SourceErrorKind::Unavailable),
        (Ok(HttpResponse::ok_json("not json")), SourceErrorKind::Malformed),
    ];

    for case in provider_cases() {
        for (answer, expected) in failures.iter().cloned() {
            let source = adapter(case.id, StaticHttpClient::always(answer));

            let err = source
                .history(history_request())
                .await
                .expect_err("must fail");
            assert_eq!(err.kind(), expected, "provider '{}'", case.id);
        }
    }
}

#[tokio::test]
async fn unparseable_dates_and_rates_are_malformed() {
    let bodies = [
        r#"{"rates":{"01/02/2024":{"INR":83.2}}}"#,
        r#"{"rates":{"2024-01-02":{"INR":-1.0}}}"#,
    ];

    for case in provider_cases() {
        for body in bodies {
            let source = adapter(
                case.id,
                StaticHttpClient::always(Ok(HttpResponse::ok_json(body))),
            );

            let err = source
                .history(history_request())
                .await
                .expect_err("must fail");
            assert_eq!(err.kind(), SourceErrorKind::Malformed, "provider '{}'", case.id);
        }
    }
}
