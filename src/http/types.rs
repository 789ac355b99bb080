use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// JSON error body: `{"message": "..."}`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self { Self { status: StatusCode::BAD_REQUEST, message: message.into() } }

    pub fn not_found(message: impl Into<String>) -> Self { Self { status: StatusCode::NOT_FOUND, message: message.into() } }

    /// Logs the cause and answers with a fixed message; store errors never reach the caller.
    pub fn internal<E: std::fmt::Display>(e: E) -> Self {
        tracing::error!(error = %e, "request failed");
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: "Internal server error.".to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response { (self.status, axum::Json(self)).into_response() }
}
