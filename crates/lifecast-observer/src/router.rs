//! Axum router construction for the streaming server.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- landing page
/// - `GET /game.svg` -- simulation stream
/// - `GET /viewers.svg` -- viewer-count stream
///
/// Anything else gets a JSON 404.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/game.svg", get(handlers::game_stream))
        .route("/viewers.svg", get(handlers::viewers_stream))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
