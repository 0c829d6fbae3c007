//! Feature modules implementing the mediaflow API
//!
//! Each feature is a vertical slice with its own `commands/` and `routes.rs`.
//!
//! - **ingest**: screenshot and attachment ingestion into a parent record

pub mod ingest;

use axum::Router;

use crate::api::AppState;

/// Router with every feature's routes mounted at the root
pub fn router() -> Router<AppState> {
    Router::new().merge(ingest::ingest_routes())
}
