//! # HTTP Request Tracing Middleware
//!
//! Axum middleware that wraps every request in a `tracing::Span`, stamps a
//! per-request id for correlation with the gateway's task-local
//! `RequestContext` (spec.md §4.8), and records HTTP metrics.

use crate::request_context::current_request_id;
use axum::{extract::Request, middleware::Next, response::Response};
use metrics::{counter, histogram};
use std::time::Instant;
use tracing::Instrument;

/// Wrap the request in a span, time it, and record Prometheus metrics.
///
/// Must run inside the `RequestContext::scope` layer so `current_request_id`
/// resolves; falls back to `"-"` if called outside that scope (should not
/// happen on the real request path).
pub async fn trace_http_requests(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let uri = request.uri().path().to_string();
    let start = Instant::now();

    let request_id =
        current_request_id().map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
    let span = tracing::info_span!(
        "http_request",
        method = %method,
        path = %uri,
        request_id = %request_id,
    );

    let response = async move { next.run(request).await }.instrument(span).await;

    let status_code = response.status().as_u16();
    let elapsed = start.elapsed();
    let path_label = normalize_path_for_metrics(&uri);

    counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => path_label.clone(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "path" => path_label
    )
    .record(elapsed.as_secs_f64());

    tracing::debug!(status_code, elapsed_ms = elapsed.as_millis(), "request completed");

    response
}

/// Normalize a path for metrics to avoid high cardinality: replaces
/// dynamic resource-id segments (UUIDs, numeric ids) with `:id`.
fn normalize_path_for_metrics(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').collect();
    let mut normalized = Vec::with_capacity(segments.len());

    for segment in &segments {
        if segment.is_empty() {
            normalized.push(*segment);
            continue;
        }

        let is_uuid =
            segment.len() == 36 && segment.chars().all(|c| c.is_ascii_hexdigit() || c == '-');
        let is_numeric = !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit());

        if is_uuid || is_numeric {
            normalized.push(":id");
        } else {
            normalized.push(*segment);
        }
    }

    normalized.join("/")
}
