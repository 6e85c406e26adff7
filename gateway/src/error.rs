//! Gateway API error type and its HTTP mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use xfunc_vendor::VendorError;

/// Errors surfaced by the gateway API handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request body failed a constraint. Surfaced as 400.
    #[error("{0}")]
    Validation(String),
    /// The deployment vendor rejected the operation or was unreachable.
    /// Surfaced as 502.
    #[error(transparent)]
    Vendor(#[from] VendorError),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR".to_string(),
                message,
            ),
            ApiError::Vendor(err) => {
                tracing::error!(code = %err.code, message = %err.message, "vendor call failed");
                (StatusCode::BAD_GATEWAY, err.code, err.message)
            }
        };
        let body = Json(json!({ "error": { "code": code, "message": message } }));
        (status, body).into_response()
    }
}
