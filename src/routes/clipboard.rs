//! Clipboard-wide routes
//!
//! Endpoints:
//! - GET /api/v1/clipboard - Liveness ack, echoing the caller's address
//! - DELETE /api/v1/clipboard - Flush every entry

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::error::Result;
use crate::state::AppState;

/// Create the clipboard router
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(status).delete(flush))
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub ack: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientInfo>,
}

#[derive(Serialize)]
pub struct ClientInfo {
    pub host: String,
    pub port: u16,
}

#[derive(Serialize)]
pub struct FlushResponse {
    pub flushed: usize,
}

/// GET /api/v1/clipboard
///
/// Peer info is unavailable when the router is driven without a real
/// socket, so the echo is optional.
async fn status(peer: Option<ConnectInfo<SocketAddr>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        ack: "pong",
        version: env!("CARGO_PKG_VERSION"),
        client: peer.map(|ConnectInfo(addr)| ClientInfo {
            host: addr.ip().to_string(),
            port: addr.port(),
        }),
    })
}

/// DELETE /api/v1/clipboard
async fn flush(State(state): State<AppState>) -> Result<Json<FlushResponse>> {
    let flushed = state.store().flush_all().await?;
    Ok(Json(FlushResponse { flushed }))
}
