pub mod response;

use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::compression::CompressionLayer;

use crate::config::CorsConfig;
use crate::features;
use crate::middleware;
use crate::pipeline::MediaPipeline;

/// Shared state for every handler
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<MediaPipeline>,
    /// Root token; each request runs under a child of it
    pub shutdown: CancellationToken,
}

/// Create the application router with all routes and middleware
pub fn create_router(state: AppState, cors: &CorsConfig) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(features::router())
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(cors))
}

async fn root() -> &'static str {
    "mediaflow ingestion service"
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
