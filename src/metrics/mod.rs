//! Prometheus metrics for the API server.
//!
//! Each `Metrics` owns its own registry so tests can build independent
//! instances without clashing on global registration.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

use crate::models::SignalReport;

pub struct Metrics {
    registry: Registry,
    pub http_requests_total: IntCounter,
    pub http_request_duration_seconds: Histogram,
    pub http_requests_in_flight: IntGauge,
    pub signals_evaluated_total: IntCounterVec,
    pub upstream_errors_total: IntCounter,
    pub charts_rendered_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total =
            IntCounter::new("http_requests_total", "Total number of HTTP requests")?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        ))?;
        let http_requests_in_flight = IntGauge::new(
            "http_requests_in_flight",
            "Number of HTTP requests currently being served",
        )?;
        let signals_evaluated_total = IntCounterVec::new(
            Opts::new(
                "signals_evaluated_total",
                "Signal evaluations grouped by outcome",
            ),
            &["outcome"],
        )?;
        let upstream_errors_total = IntCounter::new(
            "upstream_errors_total",
            "Failed requests to the market data upstream",
        )?;
        let charts_rendered_total =
            IntCounter::new("charts_rendered_total", "Number of PNG charts rendered")?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(signals_evaluated_total.clone()))?;
        registry.register(Box::new(upstream_errors_total.clone()))?;
        registry.register(Box::new(charts_rendered_total.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            signals_evaluated_total,
            upstream_errors_total,
            charts_rendered_total,
        })
    }

    /// Count one signal evaluation under its outcome label.
    pub fn record_signal(&self, report: &SignalReport) {
        self.signals_evaluated_total
            .with_label_values(&[report.outcome()])
            .inc();
    }

    /// Render all registered metrics in the Prometheus text format.
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
