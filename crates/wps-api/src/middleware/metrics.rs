//! # Prometheus Metrics
//!
//! Per-instance Prometheus registry. HTTP-level metrics are recorded by
//! [`metrics_middleware`]; cache outcomes and transcode timings are recorded
//! by the orchestration layer; the in-flight generation gauge is refreshed on
//! each `/metrics` scrape (pull model).
//!
//! Request paths are deliberately not a label: every image is a distinct
//! path and the series count would grow without bound.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry,
    TextEncoder,
};

/// Shared metrics state backed by a Prometheus registry.
#[derive(Clone)]
pub struct ApiMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,

    // -- HTTP middleware metrics (push model) --
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,

    // -- Cache metrics (push model, recorded by orchestration) --
    cache_outcomes_total: IntCounterVec,
    transcode_duration_seconds: Histogram,
    transcode_failures_total: IntCounterVec,

    // -- Gauges (pull model, updated on /metrics scrape) --
    generations_in_flight: Gauge,
}

impl std::fmt::Debug for ApiMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiMetrics")
            .field("hits", &self.outcome_count("hit"))
            .field("misses", &self.outcome_count("miss"))
            .finish()
    }
}

impl ApiMetrics {
    /// Create a new metrics instance with a fresh Prometheus registry.
    pub fn new() -> Self {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("wps_http_requests_total", "Total HTTP requests"),
            &["method", "status"],
        )
        .expect("metric can be created");

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "wps_http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["method"],
        )
        .expect("metric can be created");

        let cache_outcomes_total = IntCounterVec::new(
            Opts::new(
                "wps_cache_outcomes_total",
                "Image requests by cache outcome (hit, miss, evicted, not_found, forbidden, unsupported, error)",
            ),
            &["outcome"],
        )
        .expect("metric can be created");

        let transcode_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "wps_transcode_duration_seconds",
                "Time spent generating one artifact (read, transcode, write)",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        )
        .expect("metric can be created");

        let transcode_failures_total = IntCounterVec::new(
            Opts::new("wps_transcode_failures_total", "Failed artifact generations by kind"),
            &["kind"],
        )
        .expect("metric can be created");

        let generations_in_flight = Gauge::new(
            "wps_generations_in_flight",
            "Artifact paths currently being generated or awaited",
        )
        .expect("metric can be created");

        registry
            .register(Box::new(http_requests_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(http_request_duration_seconds.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(cache_outcomes_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(transcode_duration_seconds.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(transcode_failures_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(generations_in_flight.clone()))
            .expect("metric can be registered");

        Self {
            inner: Arc::new(Inner {
                registry,
                http_requests_total,
                http_request_duration_seconds,
                cache_outcomes_total,
                transcode_duration_seconds,
                transcode_failures_total,
                generations_in_flight,
            }),
        }
    }

    /// Record an HTTP request (called by the middleware).
    fn record_request(&self, method: &str, status: u16, duration_secs: f64) {
        self.inner
            .http_requests_total
            .with_label_values(&[method, &status.to_string()])
            .inc();
        self.inner
            .http_request_duration_seconds
            .with_label_values(&[method])
            .observe(duration_secs);
    }

    /// Count one image request under `outcome`.
    pub fn record_outcome(&self, outcome: &str) {
        self.inner
            .cache_outcomes_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Record the wall time of one successful generation.
    pub fn observe_transcode(&self, duration_secs: f64) {
        self.inner.transcode_duration_seconds.observe(duration_secs);
    }

    /// Count one failed generation.
    pub fn record_transcode_failure(&self, kind: &str) {
        self.inner
            .transcode_failures_total
            .with_label_values(&[kind])
            .inc();
    }

    pub fn set_generations_in_flight(&self, n: usize) {
        self.inner.generations_in_flight.set(n as f64);
    }

    /// Current count for one cache outcome label.
    pub fn outcome_count(&self, outcome: &str) -> u64 {
        self.inner
            .cache_outcomes_total
            .with_label_values(&[outcome])
            .get()
    }

    /// Total HTTP requests recorded by the middleware.
    pub fn requests(&self) -> u64 {
        use prometheus::core::Collector;
        self.inner
            .http_requests_total
            .collect()
            .iter()
            .flat_map(|mf| mf.get_metric())
            .map(|m| m.get_counter().get_value() as u64)
            .sum()
    }

    /// Gather all metrics and encode them in Prometheus text format.
    pub fn gather_and_encode(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let families = self.inner.registry.gather();
        let mut buf = Vec::new();
        encoder
            .encode(&families, &mut buf)
            .map_err(|e| format!("failed to encode metrics: {e}"))?;
        String::from_utf8(buf).map_err(|e| format!("metrics are not UTF-8: {e}"))
    }
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Middleware that records request count and latency.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();
    let method = request.method().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        m.record_request(
            &method,
            response.status().as_u16(),
            started.elapsed().as_secs_f64(),
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_are_counted_per_label() {
        let m = ApiMetrics::new();
        m.record_outcome("hit");
        m.record_outcome("hit");
        m.record_outcome("miss");
        assert_eq!(m.outcome_count("hit"), 2);
        assert_eq!(m.outcome_count("miss"), 1);
        assert_eq!(m.outcome_count("evicted"), 0);
    }

    #[test]
    fn requests_sum_across_labels() {
        let m = ApiMetrics::new();
        m.record_request("GET", 200, 0.01);
        m.record_request("GET", 404, 0.01);
        m.record_request("HEAD", 200, 0.01);
        assert_eq!(m.requests(), 3);
    }

    #[test]
    fn encodes_text_exposition() {
        let m = ApiMetrics::new();
        m.record_outcome("miss");
        m.observe_transcode(0.2);
        m.record_transcode_failure("decode");
        m.set_generations_in_flight(3);
        let text = m.gather_and_encode().unwrap();
        assert!(text.contains("wps_cache_outcomes_total{outcome=\"miss\"} 1"));
        assert!(text.contains("wps_transcode_duration_seconds_count 1"));
        assert!(text.contains("wps_transcode_failures_total{kind=\"decode\"} 1"));
        assert!(text.contains("wps_generations_in_flight 3"));
    }

    #[test]
    fn instances_do_not_share_state() {
        let a = ApiMetrics::new();
        let b = ApiMetrics::new();
        a.record_outcome("hit");
        assert_eq!(b.outcome_count("hit"), 0);
    }
}
