//! Shared application state for the streaming server.

use std::sync::Arc;

use lifecast_hub::Hub;
use tokio_util::sync::CancellationToken;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor. The
/// hubs are the only link between HTTP handlers and the producers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Hub fed by the simulation engine (`/game.svg`).
    pub game: Arc<Hub>,
    /// Hub fed by the viewer counter (`/viewers.svg`).
    pub viewers: Arc<Hub>,
    /// Process-wide shutdown signal; ends every open stream.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Create state with two empty hubs.
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            game: Arc::new(Hub::new("game")),
            viewers: Arc::new(Hub::new("viewers")),
            shutdown,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(CancellationToken::new())
    }
}
