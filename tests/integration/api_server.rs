//! Integration tests for the API Server
//!
//! Tests HTTP endpoints, health checks, metrics and signal/chart routes.

use axum::http::{HeaderName, HeaderValue};
use serde_json::{json, Value};

use crate::test_utils::{
    candles_body, mock_candles, mock_candles_status, mock_search, rally_then_reversal, TestApp,
    CHAIN, PAIR,
};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

fn signals_url(extra: &str) -> String {
    format!("/signals?chain={}&pair={}{}", CHAIN, PAIR, extra)
}

fn chart_url(extra: &str) -> String {
    format!("/chart?chain={}&pair={}{}", CHAIN, PAIR, extra)
}

#[tokio::test]
async fn health_endpoint_reports_healthy_status() {
    let app = TestApp::new().await;
    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(body["uptime_seconds"].as_u64().is_some());
    assert_eq!(body["service"], "masterdex-api");
}

#[tokio::test]
async fn status_endpoint_reports_running() {
    let app = TestApp::new().await;
    let response = app.server.get("/status").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body, json!({ "status": "MasterDex API, running" }));
}

#[tokio::test]
async fn chains_endpoint_lists_supported_chains() {
    let app = TestApp::new().await;
    let body: Value = app.server.get("/chains").await.json();

    let chains = body["chains"].as_array().expect("chains array");
    assert_eq!(chains.len(), 11);
    assert!(chains.contains(&json!("solana")));
    assert!(chains.contains(&json!("osmosis")));
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let app = TestApp::new().await;
    let response = app
        .server
        .get("/status")
        .add_header(
            HeaderName::from_static("origin"),
            HeaderValue::from_static("https://extension.example"),
        )
        .await;

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_metrics() {
    let app = TestApp::new().await;
    let _ = app.server.get("/health").await;

    let response = app.server.get("/metrics").await;
    assert_eq!(response.status_code(), 200);

    let body = response.text();
    assert!(body.contains("http_requests_total"));
    assert!(body.contains("http_request_duration_seconds"));
    assert!(body.contains("http_requests_in_flight"));
    assert!(body.contains("upstream_errors_total"));
    assert!(body.contains("charts_rendered_total"));
}

#[tokio::test]
async fn signals_report_sell_cross_on_reversal() {
    let app = TestApp::new().await;
    mock_candles(&app.upstream, "5m", candles_body(&rally_then_reversal())).await;

    let response = app.server.get(&signals_url("&fast=3&slow=9")).await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["length"], 30);
    assert_eq!(body["fast"], 3);
    assert_eq!(body["slow"], 9);
    assert_eq!(body["timeframe"], "5m");
    assert_eq!(body["cross"], json!({ "side": "sell", "index": 29 }));
    assert!(body["pre_alert"].is_null());
    assert!(body.get("ema_fast").is_none());

    assert_eq!(
        app.metrics
            .signals_evaluated_total
            .with_label_values(&["cross"])
            .get(),
        1
    );
}

#[tokio::test]
async fn signals_report_pre_alert_before_cross() {
    let app = TestApp::new().await;
    let prices = rally_then_reversal();
    mock_candles(&app.upstream, "15m", candles_body(&prices[..28])).await;

    let response = app
        .server
        .get(&signals_url("&fast=3&slow=9&timeframe=15m"))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert!(body["cross"].is_null());
    assert_eq!(body["pre_alert"]["side"], "sell");
    let bars = body["pre_alert"]["bars_ahead"].as_f64().unwrap();
    assert!((bars - 1.0839138704733).abs() < 1e-9);
}

#[tokio::test]
async fn signals_respect_pre_bars_override() {
    let app = TestApp::new().await;
    let prices = rally_then_reversal();
    mock_candles(&app.upstream, "5m", candles_body(&prices[..28])).await;

    let body: Value = app
        .server
        .get(&signals_url("&fast=3&slow=9&pre_bars=1"))
        .await
        .json();
    assert!(body["pre_alert"].is_null());
}

#[tokio::test]
async fn signals_with_defaults_and_short_history_are_empty() {
    let app = TestApp::new().await;
    mock_candles(&app.upstream, "5m", candles_body(&rally_then_reversal()[..23])).await;

    let response = app.server.get(&signals_url("&series=true")).await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["fast"], 7);
    assert_eq!(body["slow"], 21);
    assert_eq!(body["length"], 23);
    assert!(body["cross"].is_null());
    assert!(body["pre_alert"].is_null());
    assert_eq!(body["ema_fast"], json!([]));
    assert_eq!(body["ema_slow"], json!([]));
    assert_eq!(body["diff"], json!([]));
}

#[tokio::test]
async fn signals_can_include_series() {
    let app = TestApp::new().await;
    mock_candles(&app.upstream, "5m", candles_body(&rally_then_reversal())).await;

    let body: Value = app
        .server
        .get(&signals_url("&fast=3&slow=9&series=true"))
        .await
        .json();

    assert_eq!(body["ema_fast"].as_array().unwrap().len(), 30);
    assert_eq!(body["ema_slow"].as_array().unwrap().len(), 30);
    assert_eq!(body["diff"].as_array().unwrap().len(), 30);
    assert_eq!(body["ema_fast"][0], 100.0);
}

#[tokio::test]
async fn signals_reject_out_of_range_periods() {
    let app = TestApp::new().await;

    for query in ["&fast=1", "&fast=201", "&slow=1", "&slow=401", "&pre_bars=0"] {
        let response = app.server.get(&signals_url(query)).await;
        assert_eq!(response.status_code(), 422, "query {}", query);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
    }

    assert!(app
        .upstream
        .received_requests()
        .await
        .unwrap_or_default()
        .is_empty());
}

#[tokio::test]
async fn malformed_query_strings_are_unprocessable_json() {
    let app = TestApp::new().await;

    for url in [
        signals_url("&fast=abc"),
        format!("/signals?pair={}", PAIR),
        chart_url("&slow=nine"),
        format!("/chart?chain={}", CHAIN),
        "/pairs?query=x&limit=-1".to_string(),
    ] {
        let response = app.server.get(&url).await;
        assert_eq!(response.status_code(), 422, "url {}", url);
        let body: Value = response.json();
        assert_eq!(body["success"], false, "url {}", url);
        assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
    }

    let body: Value = app.server.get(&signals_url("&fast=abc")).await.json();
    assert!(body["error"].as_str().unwrap().contains("fast"));
    let body: Value = app
        .server
        .get(&format!("/signals?pair={}", PAIR))
        .await
        .json();
    assert!(body["error"].as_str().unwrap().contains("chain"));

    assert!(app
        .upstream
        .received_requests()
        .await
        .unwrap_or_default()
        .is_empty());
}

#[tokio::test]
async fn signals_surface_upstream_status_as_bad_gateway() {
    let app = TestApp::new().await;
    mock_candles_status(&app.upstream, 404).await;

    let response = app.server.get(&signals_url("")).await;
    assert_eq!(response.status_code(), 502);

    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("404"));
    assert_eq!(app.metrics.upstream_errors_total.get(), 1);
}

#[tokio::test]
async fn signals_reject_malformed_candles() {
    let app = TestApp::new().await;
    mock_candles(
        &app.upstream,
        "5m",
        json!({ "candles": [{ "t": 0, "c": "1.0" }, { "t": 1, "c": "n/a" }] }),
    )
    .await;

    let response = app.server.get(&signals_url("")).await;
    assert_eq!(response.status_code(), 502);
}

#[tokio::test]
async fn pairs_search_by_query_with_limit() {
    let app = TestApp::new().await;
    let pairs: Vec<Value> = (0..5).map(|i| json!({ "pairAddress": i })).collect();
    mock_search(&app.upstream, "bonk", json!({ "pairs": pairs })).await;

    let response = app.server.get("/pairs?query=bonk&limit=3").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["query"], "bonk");
    assert_eq!(body["results"], 3);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
    assert_eq!(body["data"][0]["pairAddress"], 0);
}

#[tokio::test]
async fn pairs_fall_back_to_chain_then_solana() {
    let app = TestApp::new().await;
    mock_search(&app.upstream, "bsc", json!({ "pairs": [{ "id": "bsc" }] })).await;
    mock_search(&app.upstream, "solana", json!({ "tokens": [{ "id": "sol" }] })).await;

    let body: Value = app.server.get("/pairs?chain=bsc").await.json();
    assert_eq!(body["query"], "bsc");
    assert_eq!(body["data"], json!([{ "id": "bsc" }]));

    let body: Value = app.server.get("/pairs").await.json();
    assert!(body["query"].is_null());
    assert_eq!(body["results"], 1);
    assert_eq!(body["data"], json!([{ "id": "sol" }]));
}

#[tokio::test]
async fn pairs_reject_invalid_limit() {
    let app = TestApp::new().await;
    let response = app.server.get("/pairs?query=x&limit=0").await;
    assert_eq!(response.status_code(), 422);
    let response = app.server.get("/pairs?query=x&limit=201").await;
    assert_eq!(response.status_code(), 422);
}

#[tokio::test]
async fn chart_returns_png() {
    let app = TestApp::new().await;
    mock_candles(&app.upstream, "5m", candles_body(&rally_then_reversal())).await;

    let response = app.server.get(&chart_url("&fast=3&slow=9")).await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("image/png")
    );

    let bytes = response.as_bytes();
    assert!(bytes.len() > 8);
    assert_eq!(bytes[..8], PNG_SIGNATURE);
    assert_eq!(app.metrics.charts_rendered_total.get(), 1);
}

#[tokio::test]
async fn chart_without_candles_is_not_found() {
    let app = TestApp::new().await;
    mock_candles(&app.upstream, "5m", json!({ "candles": [] })).await;

    let response = app.server.get(&chart_url("")).await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn chart_rejects_out_of_range_periods() {
    let app = TestApp::new().await;
    let response = app.server.get(&chart_url("&slow=500")).await;
    assert_eq!(response.status_code(), 422);
}
