//! Ingestion API routes
//!
//! - `POST /screenshot` - Render a page and attach the image to a record
//! - `POST /attachment` - Attach one or more hosted files to a record
//!
//! Both respond with the created child records once the parent has been
//! linked, or with the standard error envelope.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};

use super::commands::{self, IngestAttachmentCommand, IngestError, IngestScreenshotCommand};
use crate::api::response::ApiResponse;
use crate::api::AppState;
use crate::error::AppError;

pub fn ingest_routes() -> Router<AppState> {
    Router::new()
        .route("/screenshot", post(ingest_screenshot))
        .route("/attachment", post(ingest_attachment))
}

/// Screenshot a page
///
/// # Request Body
///
/// ```json
/// { "id": "recListing1", "url": "https://listing.example.com/42" }
/// ```
///
/// # Response
///
/// - `200 OK` - Screenshot stored and linked
/// - `400 Bad Request` - Malformed body or missing field
/// - `500 Internal Server Error` - Screenshot service not configured
/// - `502 Bad Gateway` - Rendering, storage or record store failure
async fn ingest_screenshot(
    State(state): State<AppState>,
    payload: Result<Json<IngestScreenshotCommand>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(command) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let outcome = commands::screenshot::handle(
        state.pipeline.clone(),
        state.shutdown.child_token(),
        command,
    )
    .await?;

    tracing::info!(
        parent_id = %outcome.parent_id,
        children = outcome.children.len(),
        "Screenshot ingested via API"
    );

    Ok(ApiResponse::success(outcome).into_response())
}

/// Attach hosted files
///
/// # Request Body
///
/// ```json
/// { "id": "recListing1", "downloadUrl": "https://cdn.example.com/1.jpg,https://cdn.example.com/2.jpg" }
/// ```
///
/// # Response
///
/// - `200 OK` - Every file stored and linked
/// - `400 Bad Request` - Malformed body, missing field or invalid URL list
/// - `502 Bad Gateway` - Source, storage or record store failure
async fn ingest_attachment(
    State(state): State<AppState>,
    payload: Result<Json<IngestAttachmentCommand>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(command) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let outcome = commands::attachment::handle(
        state.pipeline.clone(),
        state.shutdown.child_token(),
        command,
    )
    .await?;

    tracing::info!(
        parent_id = %outcome.parent_id,
        children = outcome.children.len(),
        "Attachments ingested via API"
    );

    Ok(ApiResponse::success(outcome).into_response())
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::IdRequired | IngestError::UrlRequired => {
                AppError::Validation(err.to_string())
            },
            IngestError::Pipeline(e) => AppError::Pipeline(e),
        }
    }
}
