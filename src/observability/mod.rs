//! # Observability Infrastructure
//!
//! Structured logging, HTTP request metrics, and health checking for the
//! gateway process (spec.md ambient stack addition).

pub mod health;
pub mod http_tracing;
pub mod logging;
pub mod metrics;
pub mod tracing;

pub use health::HealthChecker;
pub use http_tracing::trace_http_requests;
pub use logging::log_config_info;
pub use metrics::{init_metrics, MetricsRecorder};
pub use tracing::init_logging;

use crate::config::ObservabilityConfig;
use crate::errors::Result;
use ::tracing::info;

/// Initialize logging, metrics, and the health checker together.
pub async fn init_observability(config: &ObservabilityConfig) -> Result<HealthChecker> {
    init_logging(config)?;

    if config.enable_metrics {
        init_metrics(config).await?;
    }

    let health_checker = HealthChecker::new();

    info!(
        log_level = %config.log_level,
        metrics_enabled = %config.enable_metrics,
        "observability initialized"
    );

    Ok(health_checker)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn init_observability_with_metrics_disabled() {
        let config = ObservabilityConfig { enable_metrics: false, ..Default::default() };
        let result = init_observability(&config).await;
        assert!(result.is_ok() || result.is_err());
    }
}
