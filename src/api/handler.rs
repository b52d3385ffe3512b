//! The single dynamic-dispatch handler (spec.md §4.4–§4.7): every request
//! under the API base path funnels through here, regardless of which
//! endpoint it resolves to.

use crate::api::error::ApiError;
use crate::api::state::ApiState;
use crate::dispatch::dispatcher::{self, RequestClass};
use crate::dispatch::parser;
use crate::domain::endpoint::EndpointDescriptor;
use crate::domain::id::RequestId;
use crate::errors::GatewayError;
use crate::orchestrator;
use crate::registry::EndpointRegistry;
use crate::request_context::current_request_id;
use crate::response;
use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use std::sync::Arc;

/// Resolve `(method, path)` against the registry, falling back to
/// `(method, parent_path)` with the trailing segment peeled off as a
/// document id — the convention for by-id reads, updates and deletes
/// against an endpoint declared once at its collection path.
fn resolve_with_id(
    registry: &EndpointRegistry,
    method: &str,
    path: &str,
) -> Result<(Arc<EndpointDescriptor>, RequestClass, Option<String>), GatewayError> {
    if let Ok((descriptor, class)) = dispatcher::resolve(registry, method, path) {
        return Ok((descriptor, class, None));
    }

    let trimmed = path.trim_end_matches('/');
    let (parent, id) = match trimmed.rfind('/') {
        Some(0) | None => return Err(GatewayError::endpoint_not_found(method, path)),
        Some(index) => (&trimmed[..index], &trimmed[index + 1..]),
    };
    if parent.is_empty() || id.is_empty() {
        return Err(GatewayError::endpoint_not_found(method, path));
    }

    let (descriptor, class) = dispatcher::resolve(registry, method, parent)?;
    Ok((descriptor, class, Some(id.to_string())))
}

fn parse_query_params(request: &Request) -> Vec<(String, String)> {
    request
        .uri()
        .query()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

/// Handles every request under the API base path (spec.md §4.4): resolves
/// the endpoint, checks method permission, parses the body into a query or
/// write request, runs it through the orchestrator, and maps the outcome
/// to an HTTP response.
pub async fn dynamic_handler(State(state): State<ApiState>, request: Request) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let query_params = parse_query_params(&request);

    let (descriptor, class, id) = match resolve_with_id(&state.endpoints, &method, &path) {
        Ok(resolved) => resolved,
        Err(error) => return ApiError::from(error).into_response(),
    };

    let request_id = current_request_id().unwrap_or_else(RequestId::new);

    match class {
        RequestClass::Read => handle_read(&state, descriptor, request_id, &query_params, request).await,
        RequestClass::Write => {
            if !descriptor.is_write_method(&method) {
                return ApiError::from(GatewayError::method_not_allowed(method)).into_response();
            }
            handle_write(&state, descriptor, request_id, &method, id, &query_params, request).await
        }
    }
}

async fn handle_read(
    state: &ApiState,
    descriptor: Arc<EndpointDescriptor>,
    request_id: RequestId,
    query_params: &[(String, String)],
    request: Request,
) -> Response {
    let filter_body = match read_json_body(request).await {
        Ok(value) => value,
        Err(error) => return ApiError::from(error).into_response(),
    };

    let query = match parser::parse_query(
        request_id,
        &descriptor.name,
        &descriptor.collection,
        query_params,
        filter_body.as_ref(),
        descriptor.default_bulk_size,
    ) {
        Ok(query) => query,
        Err(error) => return ApiError::from(error).into_response(),
    };

    let outcome = orchestrator::execute_query(
        state.backend.as_ref(),
        &state.schemas,
        &state.enums,
        &descriptor,
        query,
    )
    .await;
    let (status, body) = response::query_response(outcome);
    (status, axum::Json(body)).into_response()
}

async fn handle_write(
    state: &ApiState,
    descriptor: Arc<EndpointDescriptor>,
    request_id: RequestId,
    method: &str,
    id: Option<String>,
    query_params: &[(String, String)],
    request: Request,
) -> Response {
    let body = match read_json_body(request).await {
        Ok(body) => body,
        Err(error) => return ApiError::from(error).into_response(),
    };

    let upsert = query_params
        .iter()
        .any(|(k, v)| k == "upsert" && v.eq_ignore_ascii_case("true"));

    let write = match parser::parse_write(
        request_id,
        &descriptor.name,
        &descriptor.collection,
        method,
        id,
        body,
        upsert,
    ) {
        Ok(write) => write,
        Err(error) => return ApiError::from(error).into_response(),
    };

    let now = chrono::Utc::now();
    let outcome = orchestrator::execute_write(
        state.backend.as_ref(),
        &state.schemas,
        &state.enums,
        &descriptor,
        write,
        &now,
    )
    .await;
    let (status, body) = response::write_response(outcome);
    (status, axum::Json(body)).into_response()
}

async fn read_json_body(request: Request) -> Result<Option<Value>, GatewayError> {
    let bytes = axum::body::to_bytes(request.into_body(), usize::MAX)
        .await
        .map_err(|e| GatewayError::invalid_filter(format!("failed to read request body: {e}")))?;

    if bytes.is_empty() {
        return Ok(None);
    }

    serde_json::from_slice::<Value>(&bytes)
        .map(Some)
        .map_err(|e| GatewayError::invalid_filter(format!("malformed JSON body: {e}")))
}
