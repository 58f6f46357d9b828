//! HTTP endpoint server using Axum

use axum::{
    extract::{rejection::QueryRejection, Query, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

use crate::chart::{render_chart_png, ChartRequest};
use crate::config::{self, ApiSettings, SUPPORTED_CHAINS};
use crate::core::error::ApiError;
use crate::metrics::Metrics;
use crate::models::{CandleSeries, SignalParams};
use crate::services::{DexscreenerClient, MarketDataProvider};
use crate::signals::compute_signals;

pub const FAST_PERIOD_RANGE: (usize, usize) = (2, 200);
pub const SLOW_PERIOD_RANGE: (usize, usize) = (2, 400);
pub const PAIRS_LIMIT_RANGE: (usize, usize) = (1, 200);

#[derive(Clone)]
pub struct AppState {
    pub health: Arc<RwLock<HealthStatus>>,
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
    pub market_data: Arc<dyn MarketDataProvider>,
    pub settings: Arc<ApiSettings>,
}

impl AppState {
    pub fn new(
        market_data: Arc<dyn MarketDataProvider>,
        settings: ApiSettings,
    ) -> Result<Self, prometheus::Error> {
        Ok(Self {
            health: Arc::new(RwLock::new(HealthStatus::default())),
            metrics: Arc::new(Metrics::new()?),
            start_time: Arc::new(Instant::now()),
            market_data,
            settings: Arc::new(settings),
        })
    }
}

#[derive(Clone, Debug)]
pub struct HealthStatus {
    pub status: String,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let health = state.health.read().await;
    let uptime_seconds = state.start_time.elapsed().as_secs();
    Ok(Json(json!({
        "status": health.status,
        "uptime_seconds": uptime_seconds,
        "service": "masterdex-api"
    })))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Middleware to track HTTP request metrics
async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.metrics.http_requests_in_flight.inc();

    let response = next.run(request).await;
    let status = response.status();
    let duration = start.elapsed();

    state.metrics.http_requests_in_flight.dec();
    state.metrics.http_requests_total.inc();
    state
        .metrics
        .http_request_duration_seconds
        .observe(duration.as_secs_f64());

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = duration.as_millis(),
            "HTTP request error"
        );
    }

    response
}

fn default_limit() -> usize {
    30
}

fn default_fast() -> usize {
    SignalParams::default().fast
}

fn default_slow() -> usize {
    SignalParams::default().slow
}

fn default_timeframe() -> String {
    "5m".to_string()
}

#[derive(Debug, Deserialize)]
struct PairsQuery {
    query: Option<String>,
    chain: Option<String>,
    #[serde(default = "default_limit")]
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct SignalQuery {
    chain: String,
    pair: String,
    #[serde(default = "default_fast")]
    fast: usize,
    #[serde(default = "default_slow")]
    slow: usize,
    #[serde(default = "default_timeframe")]
    timeframe: String,
    pre_bars: Option<f64>,
    /// Include `ema_fast`, `ema_slow` and `diff` in the response.
    #[serde(default)]
    series: bool,
}

#[derive(Debug, Deserialize)]
struct ChartQuery {
    chain: String,
    pair: String,
    #[serde(default = "default_fast")]
    fast: usize,
    #[serde(default = "default_slow")]
    slow: usize,
    #[serde(default = "default_timeframe")]
    timeframe: String,
}

fn check_range(name: &str, value: usize, (min, max): (usize, usize)) -> Result<(), ApiError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ApiError::InvalidParameter(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )))
    }
}

fn validate_periods(fast: usize, slow: usize) -> Result<(), ApiError> {
    check_range("fast", fast, FAST_PERIOD_RANGE)?;
    check_range("slow", slow, SLOW_PERIOD_RANGE)
}

async fn fetch_candles(
    state: &AppState,
    chain: &str,
    pair: &str,
    timeframe: &str,
) -> Result<CandleSeries, ApiError> {
    state
        .market_data
        .get_candles(chain, pair, timeframe, state.settings.candle_limit)
        .await
        .map_err(|e| {
            state.metrics.upstream_errors_total.inc();
            warn!(
                error = %e,
                chain = %chain,
                pair = %pair,
                timeframe = %timeframe,
                "Candle fetch failed"
            );
            ApiError::Upstream(e)
        })
}

async fn status() -> Json<Value> {
    Json(json!({ "status": "MasterDex API, running" }))
}

async fn list_chains() -> Json<Value> {
    Json(json!({ "chains": SUPPORTED_CHAINS }))
}

/// Search pairs/tokens by free text, falling back to the chain name.
async fn search_pairs(
    State(state): State<AppState>,
    query: Result<Query<PairsQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(params) = query?;
    check_range("limit", params.limit, PAIRS_LIMIT_RANGE)?;

    let label = params.query.clone().or_else(|| params.chain.clone());
    let search = label.as_deref().unwrap_or("solana");

    let mut entries = state.market_data.search_pairs(search).await.map_err(|e| {
        state.metrics.upstream_errors_total.inc();
        warn!(error = %e, query = %search, "Pair search failed");
        ApiError::Upstream(e)
    })?;
    entries.truncate(params.limit);

    Ok(Json(json!({
        "success": true,
        "query": label,
        "results": entries.len(),
        "data": entries,
    })))
}

/// EMA crossover and pre-alert for a pair (JSON).
async fn get_signals(
    State(state): State<AppState>,
    query: Result<Query<SignalQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(params) = query?;
    validate_periods(params.fast, params.slow)?;
    let pre_bars = params.pre_bars.unwrap_or(state.settings.pre_alert_bars);
    if !(pre_bars.is_finite() && pre_bars > 0.0) {
        return Err(ApiError::InvalidParameter(format!(
            "pre_bars must be a positive number, got {}",
            pre_bars
        )));
    }

    let candles = fetch_candles(&state, &params.chain, &params.pair, &params.timeframe).await?;
    let report = compute_signals(
        &candles.closes,
        &SignalParams::new(params.fast, params.slow, pre_bars),
    );
    state.metrics.record_signal(&report);

    let mut body = json!({
        "success": true,
        "length": candles.len(),
        "fast": params.fast,
        "slow": params.slow,
        "timeframe": params.timeframe,
        "cross": report.cross,
        "pre_alert": report.pre_alert,
    });
    if params.series {
        body["ema_fast"] = json!(report.ema_fast);
        body["ema_slow"] = json!(report.ema_slow);
        body["diff"] = json!(report.diff);
    }

    Ok(Json(body))
}

/// PNG with price, fast/slow EMA, the latest crossover and any pre-alert.
async fn get_chart(
    State(state): State<AppState>,
    query: Result<Query<ChartQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = query?;
    validate_periods(params.fast, params.slow)?;

    let candles = fetch_candles(&state, &params.chain, &params.pair, &params.timeframe).await?;
    if candles.is_empty() {
        return Err(ApiError::NotFound(format!(
            "no candles for {}/{} at {}",
            params.chain, params.pair, params.timeframe
        )));
    }

    let signal_params = SignalParams::new(params.fast, params.slow, state.settings.pre_alert_bars);
    let report = compute_signals(&candles.closes, &signal_params);
    state.metrics.record_signal(&report);

    let title = format!(
        "{} • {} • TF {}  –  EMA {}/{}",
        params.chain.to_uppercase(),
        params.pair,
        params.timeframe,
        params.fast,
        params.slow
    );

    let png = tokio::task::spawn_blocking(move || {
        render_chart_png(&ChartRequest {
            times: &candles.times,
            prices: &candles.closes,
            fast: signal_params.fast,
            slow: signal_params.slow,
            title: &title,
            report: &report,
        })
    })
    .await
    .map_err(|e| ApiError::Internal(format!("chart task failed: {}", e)))??;

    state.metrics.charts_rendered_total.inc();
    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/status", get(status))
        .route("/chains", get(list_chains))
        .route("/pairs", get(search_pairs))
        .route("/signals", get(get_signals))
        .route("/chart", get(get_chart))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn start_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let client = DexscreenerClient::from_env()?;
    info!(base_url = %client.base_url(), "Dexscreener client configured");

    let state = AppState::new(Arc::new(client), ApiSettings::from_env())?;
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!(port = port, "HTTP server listening on port {}", port);
    info!(
        upstream_timeout_secs = config::get_upstream_timeout().as_secs(),
        "Metrics endpoint available at http://0.0.0.0:{}/metrics",
        port
    );
    axum::serve(listener, app).await?;

    Ok(())
}
