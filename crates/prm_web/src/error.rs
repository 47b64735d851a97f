use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Errors surfaced by the HTTP API, rendered as `{"detail": ...}`.
#[derive(Debug)]
pub enum ApiError {
    JobNotFound,
    BadRequest(String),
    Internal(prm_core::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::JobNotFound => (StatusCode::NOT_FOUND, "Job not found".to_string()),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(e) => {
                tracing::error!("[API] Request failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<prm_core::Error> for ApiError {
    fn from(e: prm_core::Error) -> Self {
        match e {
            prm_core::Error::JobNotFound(_) => ApiError::JobNotFound,
            other => ApiError::Internal(other),
        }
    }
}
