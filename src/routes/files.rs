//! File routes
//!
//! Files travel as raw request/response bodies. A whole file and a single
//! chunk of a larger one look identical here; chunking is a client concern
//! and the server just stores bytes under derived keys.
//!
//! Endpoints:
//! - POST /api/v1/files - Store file bytes, returns the derived key
//! - GET /api/v1/files/:key - Fetch file bytes
//! - DELETE /api/v1/files/:key - Remove an entry
//! - PUT /api/v1/files/:key/ttl - Reset an entry's TTL

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::keys::KeySource;
use crate::state::AppState;
use crate::store::Category;

use super::messages::TouchRequest;

/// Create the files router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(store_file))
        .route("/:key", get(fetch_file).delete(delete_file))
        .route("/:key/ttl", put(touch_file))
}

#[derive(Serialize)]
pub struct StoreFileResponse {
    pub key: String,
    pub category: Category,
    pub size: u64,
    pub ttl: u64,
}

/// POST /api/v1/files
///
/// The file bytes are the raw request body. `X-Filename` carries the
/// percent-encoded file name and `X-TTL` an optional TTL override.
async fn store_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<StoreFileResponse>> {
    let filename = decode_filename(&headers)?;
    let ttl = match headers.get("X-TTL") {
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| AppError::BadRequest("Unparseable X-TTL header".to_string()))?,
        None => state.config().default_ttl(Category::File),
    };

    let source = KeySource::for_file(&filename);
    let key = state.deriver().derive(&source);
    state
        .store()
        .put(&key, &body, Category::File, ttl, &source)
        .await?;

    tracing::info!(
        key = key.as_str(),
        filename = %filename,
        size = body.len(),
        ttl,
        "File stored"
    );

    Ok(Json(StoreFileResponse {
        key: key.into_string(),
        category: Category::File,
        size: body.len() as u64,
        ttl,
    }))
}

/// GET /api/v1/files/:key
///
/// Serves file entries as octet-stream. Message and fragment list entries
/// belong to the messages endpoint and are refused here.
async fn fetch_file(State(state): State<AppState>, Path(key): Path<String>) -> Result<Response> {
    let entry = state.store().get(&key).await?;

    match entry.category() {
        Some(Category::File) | None => {}
        Some(other) => {
            return Err(AppError::Forbidden(format!(
                "Entry {} is {}, fetch it from the messages endpoint",
                key, other
            )));
        }
    }

    let filename = entry
        .metadata
        .as_ref()
        .and_then(|m| m.key_source.rsplit_once(':'))
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| key.clone());

    let size = entry.payload.len();
    // Headers must stay ASCII, so the name travels percent-encoded.
    let encoded_name = urlencoding::encode(&filename).into_owned();
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, size)
        .header("X-Filename", encoded_name.clone())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", encoded_name),
        )
        .body(Body::from(entry.payload))
        .map_err(|e| AppError::Internal(e.to_string()))?)
}

/// DELETE /api/v1/files/:key
async fn delete_file(State(state): State<AppState>, Path(key): Path<String>) -> Result<StatusCode> {
    if let Some(meta) = state.store().metadata(&key).await? {
        if meta.category != Category::File {
            return Err(AppError::Forbidden(format!(
                "Entry {} is {}, remove it through the messages endpoint",
                key, meta.category
            )));
        }
    }
    state.store().delete(&key).await?;
    tracing::info!(%key, "File deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/files/:key/ttl
async fn touch_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(request): Json<TouchRequest>,
) -> Result<Json<StoreFileResponse>> {
    let ttl = request
        .ttl
        .unwrap_or_else(|| state.config().default_ttl(Category::File));

    let size = state
        .store()
        .metadata(&key)
        .await?
        .map(|m| m.size)
        .unwrap_or_default();
    state.store().touch(&key, ttl, Some(Category::File)).await?;

    Ok(Json(StoreFileResponse {
        key,
        category: Category::File,
        size,
        ttl,
    }))
}

fn decode_filename(headers: &HeaderMap) -> Result<String> {
    let raw = headers
        .get("X-Filename")
        .ok_or_else(|| AppError::BadRequest("Missing X-Filename header".to_string()))?
        .to_str()
        .map_err(|_| AppError::BadRequest("Unreadable X-Filename header".to_string()))?;
    let decoded = urlencoding::decode(raw)
        .map_err(|_| AppError::BadRequest("X-Filename is not valid percent-encoding".to_string()))?;
    if decoded.is_empty() {
        return Err(AppError::BadRequest("Empty X-Filename header".to_string()));
    }
    Ok(decoded.into_owned())
}
