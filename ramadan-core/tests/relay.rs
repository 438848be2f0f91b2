//! End-to-end tests for the relay router against a mocked provider.
//!
//! Run with: `cargo test -p ramadan-core --test relay`

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use ramadan_core::{
    CalendarEntry, Config, ErrorResponse, RootMessage,
    relay::{AppState, cors_layer, router},
};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

const UPSTREAM_PATH: &str = "/api/v1/ramadan/";

// ============================================================================
// Test Helpers
// ============================================================================

fn config_for(server: &MockServer, api_key: Option<&str>) -> Config {
    Config {
        api_key: api_key.map(str::to_string),
        upstream_url: format!("{}{}", server.uri(), UPSTREAM_PATH),
        request_timeout_secs: 1,
        ..Config::default()
    }
}

fn app_for(config: &Config) -> Router {
    let state = AppState::from_config(config).expect("state should build");
    router(state, cors_layer(&config.allowed_origins).expect("default origins are valid"))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> T {
    serde_json::from_slice(body).expect("response should be JSON")
}

fn fasting_body(days: &[(&str, &str, &str)]) -> serde_json::Value {
    let fasting: Vec<_> = days
        .iter()
        .map(|(date, sahur, iftar)| json!({ "date": date, "time": { "sahur": sahur, "iftar": iftar } }))
        .collect();
    json!({ "status": "success", "data": { "fasting": fasting } })
}

// ============================================================================
// Root
// ============================================================================

#[tokio::test]
async fn root_greets_without_configuration() {
    let server = MockServer::start().await;
    let (status, body) = get(app_for(&config_for(&server, None)), "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(decode::<RootMessage>(&body).message, "Salaam World");
}

#[tokio::test]
async fn root_greets_with_configuration() {
    let server = MockServer::start().await;
    let (status, body) = get(app_for(&config_for(&server, Some("test-key"))), "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(decode::<serde_json::Value>(&body), json!({ "message": "Salaam World" }));
}

// ============================================================================
// Calendar
// ============================================================================

#[tokio::test]
async fn missing_key_fails_without_calling_provider() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fasting_body(&[])))
        .expect(0)
        .mount(&server)
        .await;

    let (status, body) = get(app_for(&config_for(&server, None)), "/ramadan?lat=21.4225&lon=39.8262").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        decode::<ErrorResponse>(&body),
        ErrorResponse { error: "configuration_error".into(), detail: "API key not setup".into() }
    );
}

#[tokio::test]
async fn success_is_flattened_exactly() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(UPSTREAM_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": { "fasting": [
                { "date": "2025-03-01", "time": { "sahur": "05:10", "iftar": "18:42" } }
            ] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) =
        get(app_for(&config_for(&server, Some("test-key"))), "/ramadan?lat=21.4225&lon=39.8262").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        decode::<serde_json::Value>(&body),
        json!([{ "date": "2025-03-01", "sahur": "05:10", "iftar": "18:42" }])
    );
}

#[tokio::test]
async fn provider_error_status_is_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "error" })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) =
        get(app_for(&config_for(&server, Some("test-key"))), "/ramadan?lat=1&lon=2").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        decode::<ErrorResponse>(&body),
        ErrorResponse { error: "upstream_failure".into(), detail: "Failed to get Ramadan data".into() }
    );
}

#[tokio::test]
async fn order_is_preserved() {
    let days = [
        ("2025-03-01", "05:10", "18:42"),
        ("2025-03-02", "05:09", "18:43"),
        ("2025-03-03", "05:08", "18:44"),
        ("2025-02-28", "05:11", "18:41"),
        ("2025-03-04", "05:06", "18:45"),
    ];

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fasting_body(&days)))
        .mount(&server)
        .await;

    let (status, body) =
        get(app_for(&config_for(&server, Some("test-key"))), "/ramadan?lat=1&lon=2").await;
    assert_eq!(status, StatusCode::OK);

    let entries: Vec<CalendarEntry> = decode(&body);
    let expected: Vec<CalendarEntry> = days
        .iter()
        .map(|(date, sahur, iftar)| CalendarEntry {
            date: date.to_string(),
            sahur: sahur.to_string(),
            iftar: iftar.to_string(),
        })
        .collect();
    assert_eq!(entries, expected);
}

#[tokio::test]
async fn coordinates_and_key_are_forwarded_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(UPSTREAM_PATH))
        .and(query_param("lat", "40.712800"))
        .and(query_param("lon", "-074.00600"))
        .and(query_param("api_key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fasting_body(&[])))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = get(
        app_for(&config_for(&server, Some("test-key"))),
        "/ramadan?lat=40.712800&lon=-074.00600",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(decode::<Vec<CalendarEntry>>(&body), Vec::new());
}

#[tokio::test]
async fn missing_lon_is_rejected_before_provider() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fasting_body(&[])))
        .expect(0)
        .mount(&server)
        .await;

    let (status, body) = get(app_for(&config_for(&server, Some("test-key"))), "/ramadan?lat=1").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        decode::<ErrorResponse>(&body),
        ErrorResponse {
            error: "invalid_query".into(),
            detail: "Query parameters `lat` and `lon` are required".into(),
        }
    );
}

#[tokio::test]
async fn missing_query_is_json_even_without_key() {
    let server = MockServer::start().await;
    let (status, body) = get(app_for(&config_for(&server, None)), "/ramadan").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(decode::<ErrorResponse>(&body).error, "invalid_query");
}

#[tokio::test]
async fn zero_timeout_fails_state_construction() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fasting_body(&[])))
        .expect(0)
        .mount(&server)
        .await;

    let config = Config { request_timeout_secs: 0, ..config_for(&server, Some("test-key")) };
    let err = AppState::from_config(&config).unwrap_err();

    assert!(err.to_string().contains("request_timeout_secs"));
}

// ============================================================================
// Classified upstream faults
// ============================================================================

#[tokio::test]
async fn slow_provider_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(fasting_body(&[]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let (status, body) =
        get(app_for(&config_for(&server, Some("test-key"))), "/ramadan?lat=1&lon=2").await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(decode::<ErrorResponse>(&body).error, "upstream_timeout");
}

#[tokio::test]
async fn html_error_page_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let (status, body) =
        get(app_for(&config_for(&server, Some("test-key"))), "/ramadan?lat=1&lon=2").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(decode::<ErrorResponse>(&body).error, "upstream_http_error");
}

#[tokio::test]
async fn success_without_fasting_is_schema_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success", "data": {} })))
        .mount(&server)
        .await;

    let (status, body) =
        get(app_for(&config_for(&server, Some("test-key"))), "/ramadan?lat=1&lon=2").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(decode::<ErrorResponse>(&body).error, "upstream_schema");
}

#[tokio::test]
async fn unreachable_provider_is_bad_gateway() {
    let config = Config {
        api_key: Some("test-key".into()),
        // Port 9 (discard) is not expected to have a listener on loopback.
        upstream_url: "http://127.0.0.1:9/api/v1/ramadan/".into(),
        request_timeout_secs: 1,
        ..Config::default()
    };

    let (status, body) = get(app_for(&config), "/ramadan?lat=1&lon=2").await;

    assert!(
        status == StatusCode::BAD_GATEWAY || status == StatusCode::GATEWAY_TIMEOUT,
        "unexpected status {status}"
    );
    let error = decode::<ErrorResponse>(&body).error;
    assert!(error == "upstream_unreachable" || error == "upstream_timeout");
}

// ============================================================================
// CORS
// ============================================================================

#[tokio::test]
async fn preflight_from_dev_origin_is_allowed_with_credentials() {
    let server = MockServer::start().await;
    let app = app_for(&config_for(&server, Some("test-key")));

    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/ramadan?lat=1&lon=2")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "x-custom-header")
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();

    let headers = res.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:5173");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "x-custom-header");
}

#[tokio::test]
async fn unknown_origin_gets_no_cors_headers() {
    let server = MockServer::start().await;
    let app = app_for(&config_for(&server, None));

    let req = Request::builder()
        .uri("/")
        .header(header::ORIGIN, "https://evil.example")
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[test]
fn invalid_origin_fails_layer_construction() {
    let err = cors_layer(&["http://bad\norigin".to_string()]).unwrap_err();
    assert!(err.to_string().contains("Invalid CORS origin"));
}
