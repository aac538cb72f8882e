use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Initialize the Prometheus recorder and expose a static gauge with the
    /// configured fetch timeout.
    pub fn init(fetch_timeout_ms: u64) -> Self {
        let builder = PrometheusBuilder::new();

        let handle = builder
            .install_recorder()
            .expect("prometheus: install recorder");

        ensure_metrics_described();
        gauge!("fetch_timeout_ms").set(fetch_timeout_ms as f64);

        Self { handle }
    }

    /// Router exposing `/metrics` in the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// One-time metric registration so the series show up on /metrics.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("analyze_requests_total", "Analyze requests received.");
        describe_counter!(
            "analyze_validation_rejected_total",
            "Requests rejected before the scoring pipeline."
        );
        describe_counter!(
            "analyze_degraded_total",
            "Analyses answered with the degraded low-confidence result."
        );
        describe_counter!("fetch_failures_total", "Transport-level page fetch failures.");
        describe_histogram!("fetch_duration_ms", "Page fetch time in milliseconds.");
    });
}
