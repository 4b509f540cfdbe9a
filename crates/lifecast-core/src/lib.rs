//! Frame producers and configuration for the Lifecast server.
//!
//! Two producers feed the two streams:
//!
//! - [`SimulationEngine`] is clock-driven. It owns the grid, advances it
//!   once per step while anyone watches, and publishes each generation.
//! - [`ViewerCounter`] is event-driven. It watches the simulation hub's
//!   membership and publishes the viewer count as a small badge.
//!
//! Both implement [`FrameProducer`] and publish through a
//! [`lifecast_hub::Hub`]; neither knows anything about HTTP.

pub mod config;
pub mod producer;
pub mod simulation;
pub mod viewers;

pub use config::{ConfigError, LifecastConfig, ServerConfig};
pub use producer::{FrameProducer, spawn_producer};
pub use simulation::{EngineStats, SimulationEngine};
pub use viewers::ViewerCounter;
