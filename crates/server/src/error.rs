//! Server error type. Implements `IntoResponse` directly so a single match
//! produces both the status code and the `{error: "..."}` JSON body,
//! instead of scattering `StatusCode` matches across handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("forbidden")]
    Forbidden,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Forbidden => StatusCode::FORBIDDEN,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Forbidden is the expected outcome of a probe; don't flood error
        // logs for it. Everything else gets logged with its message.
        if !matches!(self, ServerError::Forbidden) {
            tracing::warn!(error = %self, "request failed");
        }

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
