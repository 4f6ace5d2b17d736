// src/metrics.rs
use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and publish the dataset cache TTL as a static gauge.
    pub fn init(ttl_ms: u64) -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("installing prometheus recorder")?;

        describe_counter!("labeler_rows_total", "Headlines labeled.");
        describe_histogram!("classifier_latency_ms", "Classifier round trip in milliseconds.");
        describe_counter!("dashboard_cache_loads_total", "Dataset loads from disk.");
        describe_counter!("dashboard_bootstrap_runs_total", "Pipeline runs started by the dashboard.");

        gauge!("dashboard_cache_ttl_ms").set(ttl_ms as f64);

        Ok(Self { handle })
    }

    /// `/metrics` in the Prometheus exposition format.
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
