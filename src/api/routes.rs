//! Route wiring (spec.md §6): a catch-all dynamic handler under the API
//! base path, plus static liveness/readiness/metrics-adjacent endpoints.

use crate::api::handler::dynamic_handler;
use crate::api::middleware::ambient_context;
use crate::api::state::ApiState;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

async fn healthz(axum::extract::State(state): axum::extract::State<ApiState>) -> impl IntoResponse {
    if state.health.is_alive().await {
        (StatusCode::OK, Json(json!({ "status": "alive" })))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "dead" })))
    }
}

async fn readyz(axum::extract::State(state): axum::extract::State<ApiState>) -> impl IntoResponse {
    if state.health.is_ready().await {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "not ready" })))
    }
}

/// Builds the full router: `/healthz` and `/readyz` outside the ambient
/// context middleware (they don't need a request id or env check), every
/// other path dynamically dispatched through the endpoint registry.
pub fn build_router(state: ApiState, enable_cors: bool) -> Router {
    let mut dynamic = Router::new()
        .fallback(dynamic_handler)
        .layer(axum::middleware::from_fn_with_state(state.clone(), ambient_context))
        .layer(axum::middleware::from_fn(crate::observability::trace_http_requests));

    if enable_cors {
        dynamic = dynamic.layer(CorsLayer::permissive());
    }

    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .merge(dynamic)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
