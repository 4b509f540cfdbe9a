//! Endpoint handlers for the streaming server.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Landing page |
//! | `GET` | `/game.svg` | Simulation stream |
//! | `GET` | `/viewers.svg` | Viewer-count stream |

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::Uri;
use axum::response::{Html, IntoResponse, Response};
use lifecast_hub::Hub;
use tokio_util::sync::CancellationToken;

use crate::error::ObserverError;
use crate::session::{STREAM_CONTENT_TYPE, StreamSession};
use crate::state::AppState;

/// Landing page embedding both streams.
const INDEX_HTML: &str = include_str!("../static/index.html");

/// Serve the landing page.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Stream simulation frames until the client goes away.
///
/// # Route
///
/// `GET /game.svg`
pub async fn game_stream(State(state): State<Arc<AppState>>) -> Result<Response, ObserverError> {
    stream_response(&state.game, &state.shutdown)
}

/// Stream viewer-count frames until the client goes away.
///
/// # Route
///
/// `GET /viewers.svg`
pub async fn viewers_stream(
    State(state): State<Arc<AppState>>,
) -> Result<Response, ObserverError> {
    stream_response(&state.viewers, &state.shutdown)
}

/// Fallback for unknown paths.
pub async fn not_found(uri: Uri) -> ObserverError {
    ObserverError::NotFound(uri.path().to_owned())
}

/// Join `hub` and build the never-ending multipart response.
///
/// The session joins before the response is returned, so the viewer is
/// counted as soon as the headers are on their way.
fn stream_response(hub: &Arc<Hub>, shutdown: &CancellationToken) -> Result<Response, ObserverError> {
    if shutdown.is_cancelled() {
        return Err(ObserverError::ShuttingDown);
    }

    let mut session = StreamSession::new(Arc::clone(hub), shutdown.clone());
    session.open();

    Ok((
        [(CONTENT_TYPE, STREAM_CONTENT_TYPE), (CACHE_CONTROL, "no-cache")],
        session.into_body(),
    )
        .into_response())
}
