use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::pipeline::PipelineError;
use crate::store::StoreError;

const INVALID_FIELDS: &str = "Invalid upload fields";

/// Errors as the HTTP caller sees them. Only the generic message leaves the
/// process; details go to the log and the request span.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("File too large")]
    PayloadTooLarge,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Internal(&'static str),

    #[error("Service shutting down")]
    Unavailable,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Maps a pipeline failure, logging the cause. `failure` is the generic
    /// message used for every server-side error of the operation.
    pub fn from_pipeline(err: PipelineError, failure: &'static str) -> Self {
        let span = tracing::Span::current();
        span.record("error", tracing::field::display(&err));

        match err {
            PipelineError::MissingFile => ApiError::BadRequest("File not found".to_string()),
            PipelineError::InvalidInput(reason) => {
                tracing::warn!(%reason, "rejected upload input");
                ApiError::BadRequest(INVALID_FIELDS.to_string())
            }
            PipelineError::TooLarge { size, limit } => {
                tracing::warn!(size, limit, "rejected oversized upload");
                ApiError::PayloadTooLarge
            }
            PipelineError::Cancelled => {
                tracing::warn!("upload cancelled before completion");
                ApiError::Unavailable
            }
            err @ (PipelineError::Upstream(_) | PipelineError::Persistence { .. }) => {
                tracing::error!(error = %err, "{}", failure);
                ApiError::Internal(failure)
            }
        }
    }

    pub fn from_store(err: StoreError, failure: &'static str) -> Self {
        tracing::Span::current().record("error", tracing::field::display(&err));
        tracing::error!(error = %err, "{}", failure);
        ApiError::Internal(failure)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (
            status,
            Json(json!({"error": self.to_string(), "status": status.as_u16()})),
        )
            .into_response()
    }
}
