//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use firecmd_types::error::GatewayError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Failure talking to the agent runtime.
    Gateway(GatewayError),
    /// Malformed request body.
    Validation(String),
}

impl From<GatewayError> for AppError {
    fn from(e: GatewayError) -> Self {
        AppError::Gateway(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Gateway(GatewayError::NotConfigured(msg)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "RUNTIME_NOT_CONFIGURED", msg.clone())
            }
            AppError::Gateway(GatewayError::Upstream { status, message }) => (
                StatusCode::BAD_GATEWAY,
                "RUNTIME_ERROR",
                format!("runtime returned {status}: {message}"),
            ),
            AppError::Gateway(e) => (StatusCode::BAD_GATEWAY, "RUNTIME_UNAVAILABLE", e.to_string()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        };

        let body = json!({
            "data": null,
            "meta": {
                "request_id": "",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
