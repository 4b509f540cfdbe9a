//! Error types for the Lifecast binary.
//!
//! [`EngineError`] is the top-level error that `main` propagates with `?`.
//! Every variant is a startup failure; once the server is running, errors
//! stay inside the session or tick that produced them.

/// Top-level error for the Lifecast binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: lifecast_core::ConfigError,
    },

    /// The initial grid could not be built.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: lifecast_world::WorldError,
    },

    /// The HTTP server failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: lifecast_observer::ServerError,
    },
}
