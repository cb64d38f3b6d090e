//! Prometheus metrics collection for KEYGATE server

use async_trait::async_trait;
use keygate_core::{DocumentFetcher, DocumentKind, DocumentUrls, FetchError};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::sync::Arc;
use std::time::Instant;

/// Initialize all metric descriptions
pub fn init_metrics() {
    // Counters
    describe_counter!("keygate_decisions_total", "Total number of gate decisions by outcome");
    describe_counter!("keygate_errors_total", "Total number of failed gate evaluations by type");
    describe_counter!(
        "keygate_document_fetches_total",
        "Total number of control document fetches by document and outcome"
    );

    // Histograms
    describe_histogram!(
        "keygate_decision_latency_seconds",
        "Gate evaluation latency in seconds"
    );
    describe_histogram!(
        "keygate_document_fetch_latency_seconds",
        "Control document fetch latency in seconds"
    );
}

/// Record a completed gate decision
pub fn record_decision(decision: &str, latency_seconds: f64) {
    counter!("keygate_decisions_total", 1, "decision" => decision.to_string());
    histogram!("keygate_decision_latency_seconds", latency_seconds);
}

/// Record a failed gate evaluation
pub fn record_error(error_type: &str) {
    counter!("keygate_errors_total", 1, "type" => error_type.to_string());
}

/// Record one control document fetch
pub fn record_fetch(document: &str, success: bool, latency_seconds: f64) {
    let outcome = if success { "ok" } else { "error" };
    counter!(
        "keygate_document_fetches_total",
        1,
        "document" => document.to_string(),
        "outcome" => outcome
    );
    histogram!(
        "keygate_document_fetch_latency_seconds",
        latency_seconds,
        "document" => document.to_string()
    );
}

/// Timer for measuring operation latency
pub struct LatencyTimer {
    start: Instant,
}

impl LatencyTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Fetcher wrapper that counts and times every document fetch
pub struct MeteredFetcher {
    inner: Arc<dyn DocumentFetcher>,
    urls: DocumentUrls,
}

impl MeteredFetcher {
    pub fn new(inner: Arc<dyn DocumentFetcher>, urls: DocumentUrls) -> Self {
        Self { inner, urls }
    }

    fn document_label(&self, url: &str) -> &'static str {
        DocumentKind::ALL
            .iter()
            .find(|kind| self.urls.url(**kind) == url)
            .map(|kind| kind.as_str())
            .unwrap_or("unknown")
    }
}

#[async_trait]
impl DocumentFetcher for MeteredFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let timer = LatencyTimer::start();
        let result = self.inner.fetch(url).await;
        record_fetch(self.document_label(url), result.is_ok(), timer.elapsed_seconds());
        result
    }
}

/// Storage for Prometheus handle
static PROMETHEUS_HANDLE: std::sync::OnceLock<metrics_exporter_prometheus::PrometheusHandle> =
    std::sync::OnceLock::new();

/// Initialize Prometheus exporter and return the handle
pub fn init_prometheus() -> anyhow::Result<()> {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let handle = builder.install_recorder()?;
    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| anyhow::anyhow!("Failed to set Prometheus handle"))?;
    Ok(())
}

/// Get Prometheus metrics string
pub fn get_prometheus_metrics() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Prometheus metrics not initialized\n".to_string())
}
