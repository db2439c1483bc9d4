//! Server startup and graceful shutdown

use crate::state::AppState;
use anyhow::Result;
use axum::Router;
use mediaferry_core::Config;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on how long shutdown waits for running ingestions after the
/// listener closes.
const DRAIN_LIMIT: Duration = Duration::from_secs(30);

/// Start the server. On shutdown the listener stops accepting connections and
/// the process waits for ingestions already in the pipeline.
pub async fn start_server(config: &Config, state: Arc<AppState>, app: Router) -> Result<()> {
    let addr = format!("0.0.0.0:{}", config.server_port());
    tracing::info!(addr = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        max_upload_mb = config.max_upload_size_bytes() / 1024 / 1024,
        uploads_dir = %config.uploads_dir().display(),
        ffmpeg_path = %config.ffmpeg_path(),
        soffice_path = %config.soffice_path(),
        max_concurrent_conversions = config.max_concurrent_conversions(),
        conversion_timeout_secs = config.conversion_timeout_secs(),
        "Server ready and accepting connections"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state.clone()))
        .await?;

    let remaining = state.pipeline.wait_idle(DRAIN_LIMIT).await;
    if remaining == 0 {
        tracing::info!("All ingestions settled, server stopped");
    } else {
        tracing::warn!(
            remaining,
            drain_limit_secs = DRAIN_LIMIT.as_secs(),
            "Stopping with ingestions still running"
        );
    }

    Ok(())
}

/// Signal handler for graceful shutdown
///
/// Listens for Ctrl+C (SIGINT) and SIGTERM signals to initiate graceful shutdown.
///
/// # Panics
/// - Panics if Ctrl+C signal handler cannot be installed (unrecoverable system error)
/// - On Unix systems, panics if SIGTERM signal handler cannot be installed (unrecoverable system error)
async fn shutdown_signal(state: Arc<AppState>) {
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
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal");
        },
    }

    tracing::info!(
        in_flight = state.pipeline.in_flight(),
        "Shutting down, waiting for running ingestions"
    );
}
