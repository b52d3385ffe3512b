//! # Metrics Collection
//!
//! Prometheus metrics for the gateway's HTTP and backend call paths.

use crate::config::ObservabilityConfig;
use crate::errors::{GatewayError, Result};
use ::tracing::{info, warn};
use metrics::{counter, describe_counter, describe_histogram, gauge, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Metrics recorder that tracks gateway request and backend activity.
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorder;

impl MetricsRecorder {
    pub fn new() -> Self {
        Self
    }

    /// Record an inbound HTTP request outcome.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration: f64) {
        let labels = [
            ("method", method.to_string()),
            ("path", path.to_string()),
            ("status", status.to_string()),
        ];
        counter!("http_requests_total", &labels).increment(1);
        histogram!("http_request_duration_seconds", &labels).record(duration);
    }

    /// Record a document backend call.
    pub fn record_backend_call(&self, operation: &str, collection: &str, duration: f64, success: bool) {
        let status = if success { "success" } else { "error" };
        let labels = [
            ("operation", operation.to_string()),
            ("collection", collection.to_string()),
            ("status", status.to_string()),
        ];
        counter!("backend_calls_total", &labels).increment(1);
        histogram!("backend_call_duration_seconds", &labels).record(duration);
    }

    /// Record an endpoint registry rebuild.
    pub fn record_registry_rebuild(&self, success: bool, endpoint_count: usize) {
        let status = if success { "success" } else { "error" };
        counter!("registry_rebuilds_total", "status" => status).increment(1);
        if success {
            gauge!("registry_endpoints_active").set(endpoint_count as f64);
        }
    }

    /// Record a filter validation rejection.
    pub fn record_filter_rejected(&self, endpoint: &str) {
        let labels = [("endpoint", endpoint.to_string())];
        counter!("filter_validation_rejected_total", &labels).increment(1);
    }

    /// Record a document write validated against its JSON schema.
    pub fn record_schema_validation(&self, schema_name: &str, success: bool) {
        let status = if success { "success" } else { "error" };
        let labels = [("schema", schema_name.to_string()), ("status", status.to_string())];
        counter!("schema_validations_total", &labels).increment(1);
    }

    /// Register baseline metrics so Prometheus exports them before any
    /// requests arrive.
    pub fn register_baseline_metrics(&self) {
        describe_counter!("http_requests_total", Unit::Count, "HTTP requests served by the gateway");
        describe_histogram!(
            "http_request_duration_seconds",
            Unit::Seconds,
            "HTTP request latency"
        );
        describe_counter!(
            "backend_calls_total",
            Unit::Count,
            "Document backend calls issued by the orchestrator"
        );
        describe_histogram!(
            "backend_call_duration_seconds",
            Unit::Seconds,
            "Document backend call latency"
        );
        describe_counter!(
            "registry_rebuilds_total",
            Unit::Count,
            "Endpoint registry rebuilds triggered by config store events"
        );
        describe_counter!(
            "filter_validation_rejected_total",
            Unit::Count,
            "Requests rejected by filter policy validation"
        );
        describe_counter!(
            "schema_validations_total",
            Unit::Count,
            "Document writes validated against their JSON schema"
        );

        counter!("registry_rebuilds_total", "status" => "success").absolute(0);
        counter!("registry_rebuilds_total", "status" => "error").absolute(0);
    }
}

static METRICS: once_cell::sync::Lazy<Arc<RwLock<Option<MetricsRecorder>>>> =
    once_cell::sync::Lazy::new(|| Arc::new(RwLock::new(None)));

/// Initialize metrics collection and the Prometheus exporter.
pub async fn init_metrics(config: &ObservabilityConfig) -> Result<()> {
    if !config.enable_metrics {
        return Ok(());
    }

    let metrics_addr = match config.metrics_bind_address() {
        Some(addr) => addr,
        None => {
            warn!("metrics disabled: no bind address configured");
            return Ok(());
        }
    };

    let socket_addr: SocketAddr = metrics_addr.parse().map_err(|e| {
        GatewayError::config_missing(format!("invalid metrics bind address '{}': {}", metrics_addr, e))
    })?;

    let builder = PrometheusBuilder::new().with_http_listener(socket_addr);
    builder
        .install()
        .map_err(|e| GatewayError::internal(format!("failed to initialize metrics exporter: {}", e)))?;

    let recorder = MetricsRecorder::new();
    {
        let mut metrics = METRICS.write().await;
        *metrics = Some(recorder.clone());
    }
    recorder.register_baseline_metrics();

    info!(metrics_addr = %metrics_addr, "metrics collection initialized");
    Ok(())
}

pub async fn get_metrics() -> Option<MetricsRecorder> {
    METRICS.read().await.clone()
}

pub async fn record_http_request(method: &str, path: &str, status: u16, duration: f64) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_http_request(method, path, status, duration);
    }
}

pub async fn record_backend_call(operation: &str, collection: &str, duration: f64, success: bool) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_backend_call(operation, collection, duration, success);
    }
}

pub async fn record_registry_rebuild(success: bool, endpoint_count: usize) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_registry_rebuild(success, endpoint_count);
    }
}

pub async fn record_filter_rejected(endpoint: &str) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_filter_rejected(endpoint);
    }
}

pub async fn record_schema_validation(schema_name: &str, success: bool) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_schema_validation(schema_name, success);
    }
}
