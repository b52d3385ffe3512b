//! API-layer error adapter: turns a `GatewayError` surfaced before the
//! orchestrator (bad JSON body, unresolvable endpoint) into an HTTP
//! response with the same status/body mapping `response::error_response`
//! uses for orchestrator outcomes (spec.md §4.7).

use crate::errors::GatewayError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

pub struct ApiError(pub GatewayError);

impl From<GatewayError> for ApiError {
    fn from(error: GatewayError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut body = json!({ "error": self.0.to_string() });
        if let Some(details) = self.0.details() {
            body["details"] = json!(details);
        }
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_mismatch_is_403_with_exact_body() {
        let response = ApiError::from(GatewayError::EnvironmentMismatch).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
