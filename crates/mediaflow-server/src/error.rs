//! Server-specific error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::api::response::ErrorResponse;
use crate::pipeline::PipelineError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl AppError {
    /// HTTP status and envelope code for this error
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::Pipeline(err) => match err {
                PipelineError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                PipelineError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
                PipelineError::Cancelled { .. } => {
                    (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
                },
                PipelineError::Stage { .. } if err.is_upstream() => {
                    (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR")
                },
                PipelineError::Stage { .. }
                | PipelineError::WorkerPanicked { .. }
                | PipelineError::Internal(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                },
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();

        let message = match &self {
            AppError::Pipeline(err) => {
                if status.is_server_error() {
                    tracing::error!(stage = ?err.stage(), "Ingestion failed: {}", err);
                }
                err.to_string()
            },
            AppError::Validation(message) | AppError::BadRequest(message) => message.clone(),
        };

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}
