//! Route modules for the pizarra server

pub mod clipboard;
pub mod files;
pub mod messages;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check(State(_state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Assemble the full API router. Middleware layers are the caller's job.
pub fn app(state: AppState) -> Router {
    // axum caps request bodies at 2 MB unless told otherwise; one chunk of
    // the configured window size must fit through the files surface.
    let upload_limit =
        DefaultBodyLimit::max(state.config().transfer.chunk_size.saturating_add(4096));
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1/messages", messages::router())
        .nest("/api/v1/files", files::router().layer(upload_limit))
        .nest("/api/v1/clipboard", clipboard::router())
        .with_state(state)
}
