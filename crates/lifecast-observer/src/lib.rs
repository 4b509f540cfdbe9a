//! HTTP front end for the Lifecast streams.
//!
//! This crate provides an Axum server that exposes:
//!
//! - **`GET /`** -- the landing page embedding both streams
//! - **`GET /game.svg`** -- the simulation as a `multipart/x-mixed-replace`
//!   image stream
//! - **`GET /viewers.svg`** -- the live viewer count, same framing
//!
//! # Architecture
//!
//! Every streaming request becomes one [`StreamSession`]. The session owns
//! a single-slot sink joined to the stream's hub and is itself owned by
//! the response body, so whatever ends the response (client disconnect,
//! write failure, server shutdown) also ends the hub membership.
//!
//! [`StreamSession`]: session::StreamSession

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod session;
pub mod state;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerError, bind, serve};
pub use session::{SessionState, StreamSession};
pub use state::AppState;
