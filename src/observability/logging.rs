//! # Structured Logging Helpers
//!
//! Span-construction macros used across the gateway's request path.

/// Create a tracing span for an inbound HTTP request.
#[macro_export]
macro_rules! request_span {
    ($method:expr, $path:expr) => {
        tracing::info_span!(
            "http_request",
            method = %$method,
            path = %$path,
            request_id = tracing::field::Empty
        )
    };
    ($method:expr, $path:expr, $($field:tt)*) => {
        tracing::info_span!(
            "http_request",
            method = %$method,
            path = %$path,
            request_id = tracing::field::Empty,
            $($field)*
        )
    };
}

/// Create a tracing span for a document backend operation.
#[macro_export]
macro_rules! backend_span {
    ($operation:expr, $collection:expr) => {
        tracing::debug_span!(
            "backend_operation",
            operation = %$operation,
            collection = %$collection
        )
    };
}

/// Log the effective configuration once at startup.
pub fn log_config_info(config: &crate::config::AppConfig) {
    tracing::info!(
        server_address = %config.server.bind_address(),
        config_store_root = %config.config_store.root_prefix,
        backend_kind = %config.backend.kind,
        enum_service_enabled = %config.enum_service.enabled,
        metrics_enabled = %config.observability.enable_metrics,
        log_level = %config.observability.log_level,
        "gateway configuration loaded"
    );
}
