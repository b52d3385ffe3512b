//! Ambient-context and environment-validation middleware (spec.md §4.8,
//! §5, §6). Runs before every handler: establishes the request-scoped
//! `RequestContext` (request id, time format, env) for the duration of the
//! request, enforces the environment-validation filter, and always echoes
//! `X-Request-Id` and `env` on the response.

use crate::api::state::ApiState;
use crate::domain::id::RequestId;
use crate::errors::GatewayError;
use crate::request_context::{self, RequestContext, TimeFormat};
use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;

const REQUEST_ID_HEADER: &str = "x-request-id";
const TIME_FORMAT_HEADER: &str = "x-time-format";
const ENV_HEADER: &str = "env";

/// The request-id filter (spec.md §4.8): prefer an incoming `X-Request-Id`;
/// else fall back to a fresh UUIDv7. This gateway has no upstream trace id
/// of its own to fall back to second, so that tier of the spec's fallback
/// chain collapses into "generate a fresh identifier".
fn resolve_request_id(request: &Request) -> RequestId {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| RequestId::from_string(s.to_string()))
        .unwrap_or_else(RequestId::new)
}

fn resolve_time_format(request: &Request) -> TimeFormat {
    request
        .headers()
        .get(TIME_FORMAT_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(TimeFormat::parse)
        .unwrap_or_default()
}

fn resolve_env_header(request: &Request) -> Option<String> {
    request.headers().get(ENV_HEADER).and_then(|v| v.to_str().ok()).map(str::to_string)
}

/// Binds the ambient `RequestContext` around the rest of the middleware
/// stack and the handler, enforces the environment-validation filter when
/// `state.env_validation_enabled`, and always echoes `X-Request-Id` and
/// `env` on the response (spec.md §4.8, §6).
pub async fn ambient_context(
    State(state): State<ApiState>,
    request: Request,
    next: Next,
) -> Response {
    let request_id = resolve_request_id(&request);
    let time_format = resolve_time_format(&request);
    let env_header = resolve_env_header(&request);

    let context = RequestContext {
        request_id: request_id.clone(),
        time_format,
        env: env_header.clone(),
    };
    let time_format_value = time_format.header_value();

    let env_validation_enabled = state.env_validation_enabled;
    let configured_env = state.configured_env.clone();

    let mut response = request_context::scope(context, async move {
        if env_validation_enabled {
            let matches = env_header
                .as_deref()
                .is_some_and(|actual| actual.eq_ignore_ascii_case(&configured_env));
            if !matches {
                return crate::api::error::ApiError::from(GatewayError::EnvironmentMismatch)
                    .into_response();
            }
        }
        next.run(request).await
    })
    .await;

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        headers.insert(HeaderName::from_static("x-request-id"), value);
    }
    if let Ok(value) = HeaderValue::from_str(&state.configured_env) {
        headers.insert(HeaderName::from_static("env"), value);
    }
    if let Ok(value) = HeaderValue::from_str(time_format_value) {
        headers.insert(HeaderName::from_static("x-time-format"), value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::observability::HealthChecker;
    use crate::registry::{EndpointRegistry, EnumRegistry, SchemaRegistry};
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use http::Request as HttpRequest;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state(env_validation_enabled: bool) -> ApiState {
        ApiState {
            endpoints: Arc::new(EndpointRegistry::new()),
            schemas: Arc::new(SchemaRegistry::new()),
            enums: Arc::new(EnumRegistry::new()),
            backend: Arc::new(InMemoryBackend::new()),
            health: Arc::new(HealthChecker::new()),
            env_validation_enabled,
            configured_env: "prod".to_string(),
        }
    }

    async fn ok_handler() -> &'static str {
        "ok"
    }

    fn app(state: ApiState) -> Router {
        Router::new()
            .route("/ok", get(ok_handler))
            .layer(axum::middleware::from_fn_with_state(state.clone(), ambient_context))
            .with_state(state)
    }

    #[tokio::test]
    async fn env_header_always_echoed() {
        let app = app(test_state(false));
        let request = HttpRequest::builder().uri("/ok").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.headers().get("env").unwrap(), "prod");
    }

    #[tokio::test]
    async fn mismatched_env_is_rejected_with_exact_body() {
        let app = app(test_state(true));
        let request = HttpRequest::builder()
            .uri("/ok")
            .header("env", "staging")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn matching_env_passes_through() {
        let app = app(test_state(true));
        let request =
            HttpRequest::builder().uri("/ok").header("env", "PROD").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn time_format_is_echoed_back_as_its_canonical_token() {
        let app = app(test_state(false));
        let request = HttpRequest::builder()
            .uri("/ok")
            .header("x-time-format", "unix_millis")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.headers().get("x-time-format").unwrap(), "UNIX-MILLIS");
    }

    #[tokio::test]
    async fn request_id_is_echoed_back() {
        let app = app(test_state(false));
        let request = HttpRequest::builder()
            .uri("/ok")
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.headers().get("x-request-id").unwrap(), "abc-123");
    }
}
