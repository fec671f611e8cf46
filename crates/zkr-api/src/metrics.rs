//! # Prometheus Metrics
//!
//! HTTP-level metrics (request counts, latency, errors) are recorded by
//! [`track_requests`] middleware. Domain-level gauges — ceremony progress
//! per circuit and the proof cache population — are updated on each
//! `/metrics` scrape (pull model) by [`get_metrics`].

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Extension;
use prometheus::{
    core::Collector, Encoder, Gauge, GaugeVec, HistogramVec, IntCounterVec, Opts, Registry,
    TextEncoder,
};

use crate::state::AppState;

/// Shared metrics state backed by a Prometheus registry.
#[derive(Clone)]
pub struct ApiMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,

    // HTTP middleware metrics (push model).
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    http_errors_total: IntCounterVec,

    // Domain gauges (pull model, updated on /metrics scrape).
    ceremony_contributions: GaugeVec,
    ceremony_min_contributions: Gauge,
    ceremony_total_contributions: Gauge,
    proof_cache_entries: Gauge,
}

impl std::fmt::Debug for ApiMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiMetrics")
            .field("requests", &self.requests())
            .field("errors", &self.errors())
            .finish()
    }
}

impl ApiMetrics {
    /// Create a new metrics instance with a fresh Prometheus registry.
    pub fn new() -> Self {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("zkr_http_requests_total", "Total HTTP requests"),
            &["method", "path", "status"],
        )
        .expect("metric can be created");

        let http_request_duration_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "zkr_http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["method", "path"],
        )
        .expect("metric can be created");

        let http_errors_total = IntCounterVec::new(
            Opts::new("zkr_http_errors_total", "Total HTTP errors (4xx and 5xx)"),
            &["method", "path", "status"],
        )
        .expect("metric can be created");

        let ceremony_contributions = GaugeVec::new(
            Opts::new(
                "zkr_ceremony_contributions",
                "Current contribution index per circuit",
            ),
            &["circuit"],
        )
        .expect("metric can be created");

        let ceremony_min_contributions = Gauge::new(
            "zkr_ceremony_min_contributions",
            "Minimum contribution count across circuits (the finalization gate)",
        )
        .expect("metric can be created");

        let ceremony_total_contributions = Gauge::new(
            "zkr_ceremony_total_contributions",
            "Total contributions across all circuits",
        )
        .expect("metric can be created");

        let proof_cache_entries = Gauge::new(
            "zkr_proof_cache_entries",
            "Proof results currently held by the cache",
        )
        .expect("metric can be created");

        registry
            .register(Box::new(http_requests_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(http_request_duration_seconds.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(http_errors_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(ceremony_contributions.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(ceremony_min_contributions.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(ceremony_total_contributions.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(proof_cache_entries.clone()))
            .expect("metric can be registered");

        Self {
            inner: Arc::new(Inner {
                registry,
                http_requests_total,
                http_request_duration_seconds,
                http_errors_total,
                ceremony_contributions,
                ceremony_min_contributions,
                ceremony_total_contributions,
                proof_cache_entries,
            }),
        }
    }

    /// Current total request count (sum across all labels).
    pub fn requests(&self) -> u64 {
        let mut total = 0u64;
        for mf in &self.inner.http_requests_total.collect() {
            for m in mf.get_metric() {
                total += m.get_counter().get_value() as u64;
            }
        }
        total
    }

    /// Current total error count (sum across all labels).
    pub fn errors(&self) -> u64 {
        let mut total = 0u64;
        for mf in &self.inner.http_errors_total.collect() {
            for m in mf.get_metric() {
                total += m.get_counter().get_value() as u64;
            }
        }
        total
    }

    /// Record an HTTP request (called by the middleware).
    fn record_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.inner
            .http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();

        self.inner
            .http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);

        if status >= 400 {
            self.inner
                .http_errors_total
                .with_label_values(&[method, path, &status_str])
                .inc();
        }
    }

    /// Update the domain gauges from the current application state.
    async fn update_domain_gauges(&self, state: &AppState) {
        let status = state.coordinator.ceremony_status().await;

        self.inner.ceremony_contributions.reset();
        for (circuit, circuit_status) in &status.per_circuit {
            self.inner
                .ceremony_contributions
                .with_label_values(&[circuit.as_str()])
                .set(f64::from(circuit_status.current_index));
        }
        self.inner
            .ceremony_min_contributions
            .set(f64::from(status.min_contributions));
        self.inner
            .ceremony_total_contributions
            .set(f64::from(status.total_contributions));

        self.inner.proof_cache_entries.set(state.proofs.len() as f64);
    }

    /// Gather all metrics and encode to Prometheus text format.
    pub fn gather_and_encode(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| format!("failed to encode metrics: {e}"))?;
        String::from_utf8(buffer)
            .map_err(|e| format!("metrics encoding produced invalid UTF-8: {e}"))
    }
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Middleware that records HTTP request metrics.
///
/// The API has no dynamic path segments, so request paths are used as
/// labels directly without normalization.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        let duration = start.elapsed().as_secs_f64();
        m.record_request(&method, &path, response.status().as_u16(), duration);
    }

    response
}

/// GET /metrics — Prometheus scrape endpoint.
///
/// Refreshes the domain gauges from current state on each scrape, then
/// encodes the whole registry in text exposition format.
pub(crate) async fn get_metrics(
    State(state): State<AppState>,
    Extension(metrics): Extension<ApiMetrics>,
) -> Response {
    metrics.update_domain_gauges(&state).await;
    match metrics.gather_and_encode() {
        Ok(text) => text.into_response(),
        Err(err) => {
            tracing::error!(error = %err, "metrics encoding failed");
            crate::error::AppError::Internal(err).into_response()
        }
    }
}
