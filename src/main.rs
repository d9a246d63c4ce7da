//! Royale Server - match orchestration service
//!
//! This is the main entry point for the server. It handles:
//! - The logical tick loop driving every active match
//! - Matchmaking queues with a periodic start check
//! - HTTP endpoints for status, queueing and match reports

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use royale_server::app::AppState;
use royale_server::arena::StaticArenaProvider;
use royale_server::config::Config;
use royale_server::http::build_router;
use royale_server::util::time::init_server_time;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    // Initialize server time tracking
    init_server_time();

    info!("Starting Royale Server");
    info!("Server address: {}", config.server_addr);

    let settings = config.game_settings()?;
    let arenas = StaticArenaProvider::load(&config.arenas_path)
        .with_context(|| format!("loading arenas from {}", config.arenas_path.display()))?;
    info!(
        arenas = arenas.valid_count(),
        path = %config.arenas_path.display(),
        "Arenas loaded"
    );

    // Create application state
    let state = AppState::new(config.clone(), settings, Arc::new(arenas));

    // Spawn the match tick loop
    let registry = state.registry.clone();
    tokio::spawn(async move {
        registry.run().await;
    });

    // Spawn the matchmaking safety-net check
    let queue = state.queue.clone();
    tokio::spawn(async move {
        queue.run().await;
    });

    // Build router
    let router = build_router(state.clone());

    // Start server
    let addr: SocketAddr = config.server_addr;
    let listener = TcpListener::bind(addr).await?;

    info!("Server listening on {}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.registry.force_end_all();
    state.queue.shutdown().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
