//! Prometheus metrics & middleware helper.

use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};

/// Request metrics exposed at `/metrics`.
pub fn build() -> anyhow::Result<PrometheusMetrics> {
    PrometheusMetricsBuilder::new("rpg")
        .endpoint("/metrics")
        .build()
        .map_err(|e| anyhow::anyhow!("building metrics: {e}"))
}
