//! Error types for the HTTP layer.
//!
//! [`ObserverError`] converts into a JSON error response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors a request handler can return.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// No route matches the request path.
    #[error("not found: {0}")]
    NotFound(String),

    /// The server is shutting down and accepts no new streams.
    #[error("server is shutting down")]
    ShuttingDown,
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
