//! # Logging Initialization
//!
//! Sets up the `tracing-subscriber` output for the process (spec.md ambient
//! stack addition: structured per-request logging, no external trace
//! collector — this gateway does not ship distributed traces anywhere).

use crate::config::ObservabilityConfig;
use crate::errors::{GatewayError, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initialize global logging for the process.
///
/// Honors `ObservabilityConfig::log_level` as the default filter directive
/// (still overridable at runtime via `RUST_LOG`), and switches between
/// plain and JSON output per `json_logging`.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let env_filter = parse_env_filter(&config.log_level)?;

    if config.json_logging {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| GatewayError::internal(format!("failed to initialize logging: {}", e)))?;
    } else {
        let pretty_layer =
            tracing_subscriber::fmt::layer().with_target(true).with_thread_ids(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(pretty_layer)
            .try_init()
            .map_err(|e| GatewayError::internal(format!("failed to initialize logging: {}", e)))?;
    }

    Ok(())
}

fn parse_env_filter(level: &str) -> Result<EnvFilter> {
    let normalized = level.trim();
    let lower = normalized.to_ascii_lowercase();

    match lower.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => {
            return Err(GatewayError::config_missing(format!(
                "invalid log level '{}': must be one of trace, debug, info, warn, error",
                level
            )));
        }
    }

    EnvFilter::try_new(normalized)
        .map_err(|e| GatewayError::config_missing(format!("invalid log level '{}': {}", level, e)))
}
