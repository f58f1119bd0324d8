//! Message routes
//!
//! Endpoints:
//! - POST /api/v1/messages - Store a message (or fragment list), returns the derived key
//! - GET /api/v1/messages/:key - Fetch content and category
//! - DELETE /api/v1/messages/:key - Remove an entry
//! - PUT /api/v1/messages/:key/ttl - Reset an entry's TTL

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::keys::KeySource;
use crate::state::AppState;
use crate::store::Category;

/// Create the messages router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(store_message))
        .route("/:key", get(fetch_message).delete(delete_message))
        .route("/:key/ttl", put(touch_message))
}

#[derive(Deserialize)]
pub struct StoreMessageRequest {
    pub content: String,
    /// Wire category tag; defaults to `__message__`.
    pub category: Option<String>,
    /// TTL in seconds; defaults by category.
    pub ttl: Option<u64>,
}

#[derive(Serialize)]
pub struct StoreMessageResponse {
    pub key: String,
    pub category: Category,
    pub ttl: u64,
}

#[derive(Serialize)]
pub struct FetchMessageResponse {
    pub key: String,
    pub content: String,
    pub category: Option<Category>,
}

#[derive(Deserialize)]
pub struct TouchRequest {
    /// TTL in seconds; defaults by the entry's category.
    pub ttl: Option<u64>,
}

/// POST /api/v1/messages
async fn store_message(
    State(state): State<AppState>,
    Json(request): Json<StoreMessageRequest>,
) -> Result<Json<StoreMessageResponse>> {
    let category = match request.category.as_deref() {
        None => Category::Message,
        Some(tag) => Category::parse(tag)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown category: {}", tag)))?,
    };
    let ttl = request.ttl.unwrap_or_else(|| state.config().default_ttl(category));

    let source = KeySource::for_message(&request.content);
    let key = state.deriver().derive(&source);
    state
        .store()
        .put(&key, request.content.as_bytes(), category, ttl, &source)
        .await?;

    tracing::info!(
        key = key.as_str(),
        category = %category,
        size = request.content.len(),
        ttl,
        "Message stored"
    );

    Ok(Json(StoreMessageResponse {
        key: key.into_string(),
        category,
        ttl,
    }))
}

/// GET /api/v1/messages/:key
///
/// Serves message and fragment list entries. File entries belong to the
/// files endpoint and are refused here.
async fn fetch_message(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<FetchMessageResponse>> {
    let entry = state.store().get(&key).await?;

    if entry.category() == Some(Category::File) {
        return Err(AppError::Forbidden(format!(
            "Entry {} is a file, fetch it from the files endpoint",
            key
        )));
    }

    // Binary payloads reach here only when the sidecar is gone; steer the
    // caller to the files surface instead of failing the request.
    let content = String::from_utf8(entry.payload).map_err(|_| {
        AppError::Forbidden(format!(
            "Entry {} is not text, fetch it from the files endpoint",
            key
        ))
    })?;

    Ok(Json(FetchMessageResponse {
        key,
        content,
        category: entry.metadata.map(|m| m.category),
    }))
}

/// DELETE /api/v1/messages/:key
async fn delete_message(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode> {
    if state.store().metadata(&key).await?.map(|m| m.category) == Some(Category::File) {
        return Err(AppError::Forbidden(format!(
            "Entry {} is a file, remove it through the files endpoint",
            key
        )));
    }
    state.store().delete(&key).await?;
    tracing::info!(%key, "Message deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/messages/:key/ttl
///
/// File entries are refused, mirroring the fetch guard. Fragment lists are
/// touched like any other message-shaped entry.
async fn touch_message(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(request): Json<TouchRequest>,
) -> Result<Json<StoreMessageResponse>> {
    let metadata = state.store().metadata(&key).await?;
    let category = metadata.as_ref().map(|m| m.category);
    if category == Some(Category::File) {
        return Err(AppError::Forbidden(format!(
            "Entry {} is a file, refresh it through the files endpoint",
            key
        )));
    }

    let reported = category.unwrap_or(Category::Message);
    let ttl = request.ttl.unwrap_or_else(|| state.config().default_ttl(reported));
    state.store().touch(&key, ttl, None).await?;

    Ok(Json(StoreMessageResponse {
        key,
        category: reported,
        ttl,
    }))
}
