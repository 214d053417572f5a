//! HTTP server startup.

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use crate::api::{AppState, create_router};

/// Serve the API on `bind` (e.g. `0.0.0.0:6543`) until SIGINT/SIGTERM.
pub async fn start_http(state: AppState, bind: &str) -> Result<()> {
    let strategies: Vec<String> = state
        .registry
        .names()
        .into_iter()
        .map(str::to_string)
        .collect();
    let router = create_router(state);
    let listener = TcpListener::bind(bind).await?;

    info!(?strategies, "Media API listening on http://{}", bind);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Media API stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, shutting down"),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, shutting down");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
