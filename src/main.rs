//! Pizarra Server
//!
//! A self-hosted ephemeral clipboard. Entries live under short derived keys
//! and vanish when their TTL runs out.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pizarra::config::Config;
use pizarra::routes;
use pizarra::state::AppState;
use pizarra::store::{EntryStore, MemoryStore};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pizarra=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing::info!("Starting Pizarra Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        message_ttl = config.store.message_ttl,
        file_ttl = config.store.file_ttl,
        key_width = config.store.key_width,
        "Store defaults loaded"
    );

    // In-memory store with a background sweeper for expired records
    let backend = MemoryStore::new();
    backend
        .clone()
        .start_sweeper(Duration::from_secs(config.store.sweep_interval));
    let store = EntryStore::new(Arc::new(backend));

    let app_state = AppState::new(config.clone(), store);

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = routes::app(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server with graceful shutdown
    let host: IpAddr = config
        .server
        .host
        .parse()
        .expect("PIZARRA_HOST is not a valid IP address");
    let addr = SocketAddr::from((host, config.server.port));
    tracing::info!("Pizarra Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .unwrap();

    tracing::info!("Server shutdown complete");
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
