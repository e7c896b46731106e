//! Upstream relay tests with outbound calls stubbed by `wiremock`.

use std::time::Duration;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
    response::IntoResponse,
};
use request_helpers::config::HelpersConfig;
use request_helpers::error::AppError;
use request_helpers::proxy::{UpstreamClient, simple_http_request};
use request_helpers::response::ResponseSink;
use request_helpers::routes::app;
use request_helpers::state::AppState;
use serde_json::Value;
use tower::ServiceExt;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

#[tokio::test]
async fn test_relays_upstream_body_with_ok() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_string("success"))
        .expect(1)
        .mount(&mock)
        .await;

    let client = UpstreamClient::default();
    let mut res = ResponseSink::new();
    simple_http_request(&client, &format!("{}/users", mock.uri()), &mut res)
        .await
        .expect("relay");

    let response = res.into_response();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "success");
}

#[tokio::test]
async fn test_relays_json_body_verbatim() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cards"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"cards":[ 1, 2 ]}"#))
        .mount(&mock)
        .await;

    let mut res = ResponseSink::new();
    simple_http_request(
        &UpstreamClient::default(),
        &format!("{}/cards", mock.uri()),
        &mut res,
    )
    .await
    .expect("relay");

    assert_eq!(body_string(res.into_response()).await, r#"{"cards":[ 1, 2 ]}"#);
}

#[tokio::test]
async fn test_upstream_error_status_is_returned_and_sink_untouched() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fail"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&mock)
        .await;

    let mut res = ResponseSink::new();
    let err = simple_http_request(
        &UpstreamClient::default(),
        &format!("{}/fail", mock.uri()),
        &mut res,
    )
    .await
    .expect_err("upstream failure");

    assert!(matches!(err, AppError::Upstream(_)));
    assert!(err.to_string().contains("502"), "unexpected message: {err}");
    assert!(!res.is_sent());
}

#[tokio::test]
async fn test_transport_failure_is_returned() {
    // Port 1 is reserved and refuses connections
    let url = "http://127.0.0.1:1/gone";

    let mut res = ResponseSink::new();
    let err = simple_http_request(&UpstreamClient::default(), url, &mut res)
        .await
        .expect_err("transport failure");

    assert!(matches!(err, AppError::Upstream(_)));
    assert!(!res.is_sent());
}

#[tokio::test]
async fn test_timeout_is_applied() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&mock)
        .await;

    let client = UpstreamClient::new(Some(Duration::from_millis(100))).expect("client");
    let mut res = ResponseSink::new();
    let err = simple_http_request(&client, &mock.uri(), &mut res)
        .await
        .expect_err("timeout");

    match err {
        AppError::Upstream(e) => assert!(e.is_timeout()),
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_upstream_route_relays_configured_url() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_string("success"))
        .mount(&mock)
        .await;

    let config = HelpersConfig {
        upstream_url: Some(Url::parse(&format!("{}/users", mock.uri())).expect("url")),
        ..HelpersConfig::default()
    };
    let response = app(AppState::new(config).expect("state"))
        .oneshot(
            Request::builder()
                .uri("/upstream")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "success");
}

#[tokio::test]
async fn test_upstream_route_failure_is_generic_500() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("stack trace here"))
        .mount(&mock)
        .await;

    let config = HelpersConfig {
        upstream_url: Some(Url::parse(&mock.uri()).expect("url")),
        ..HelpersConfig::default()
    };
    let response = app(AppState::new(config).expect("state"))
        .oneshot(
            Request::builder()
                .uri("/upstream")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_str(&body_string(response).await).expect("json");
    assert_eq!(body, serde_json::json!({"message": "Internal Server Error"}));
}
