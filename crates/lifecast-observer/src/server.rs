//! HTTP server lifecycle management.
//!
//! Binding and serving are split so the binary can treat a failed bind as
//! fatal before any producer starts. [`serve`] runs until the shared
//! shutdown token is cancelled; open streams end on the same token, so
//! graceful shutdown does not wait on them forever.

use std::net::SocketAddr;
use std::sync::Arc;

use lifecast_core::ServerConfig;
use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Errors that can occur when starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listening socket could not be bound.
    #[error("cannot listen: {0}")]
    Bind(String),

    /// Accepting connections failed after startup.
    #[error("stream server failed: {0}")]
    Serve(String),
}

/// Bind the listening socket described by `config`.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address cannot be resolved or is
/// already in use.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let addr = config.address();
    TcpListener::bind(&addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))
}

/// Serve requests on `listener` until `state.shutdown` is cancelled.
///
/// # Errors
///
/// Returns [`ServerError::Serve`] on a fatal I/O error.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<(), ServerError> {
    let addr: Option<SocketAddr> = listener.local_addr().ok();
    let shutdown = state.shutdown.clone();
    let router = build_router(state);

    info!(addr = ?addr, "stream server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| ServerError::Serve(e.to_string()))?;

    info!("stream server stopped");
    Ok(())
}
