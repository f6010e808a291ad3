//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{ErrorKind, InventoryError};

/// API-level error type that maps to HTTP responses.
///
/// Every response carries `{ "error": <message>, "code": <code> }`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Failure raised by the inventory engine.
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error("{0}")]
    BadRequest(String),

    #[error("too many requests, retry later")]
    RateLimited,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Inventory(err) => match err.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Invalid => StatusCode::BAD_REQUEST,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Inventory(err) => err.code(),
            ApiError::BadRequest(_) => "bad_request",
            ApiError::RateLimited => "rate_limited",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %message, "internal server error");
        }

        let body = serde_json::json!({ "error": message, "code": self.code() });
        (status, axum::Json(body)).into_response()
    }
}
