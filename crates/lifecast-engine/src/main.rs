//! Lifecast server binary.
//!
//! Wires the simulation engine, the viewer counter and the HTTP streams
//! together and runs them until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `lifecast-config.yaml` (defaults if absent)
//! 3. Seed and build the initial grid
//! 4. Bind the listening socket (failure here is fatal)
//! 5. Start the simulation engine and the viewer counter
//! 6. Serve until shutdown, then wait for the producers to stop

mod error;

use std::path::Path;
use std::sync::Arc;

use lifecast_core::config::DEFAULT_CONFIG_PATH;
use lifecast_core::{LifecastConfig, SimulationEngine, ViewerCounter, spawn_producer};
use lifecast_observer::AppState;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the listening socket
/// cannot be bound.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("lifecast starting");

    // 2. Load configuration.
    let config = LifecastConfig::load_or_default(Path::new(DEFAULT_CONFIG_PATH))?;
    info!(
        address = config.server.address(),
        width = config.world.width,
        height = config.world.height,
        density_percent = config.world.density_percent,
        scale = config.render.scale,
        format = %config.render.format,
        step_interval_ms = config.timing.step_interval_ms,
        counter_interval_ms = config.timing.counter_interval_ms,
        "Configuration loaded"
    );

    // 3. Build the initial grid.
    let seed = config.world.resolve_seed();
    let grid = config.world.build_grid(seed)?;
    info!(seed, live_cells = grid.live_count(), "Initial grid seeded");

    // 4. Bind before anything else runs.
    let shutdown = CancellationToken::new();
    let state = Arc::new(AppState::new(shutdown.clone()));
    let listener = lifecast_observer::bind(&config.server).await?;

    // 5. Start producers.
    let engine = SimulationEngine::new(
        grid,
        Arc::clone(&state.game),
        config.render.format.encoder(config.render.cell_scale()?),
        config.timing.step_interval(),
    );
    let counter = ViewerCounter::new(
        Arc::clone(&state.game),
        Arc::clone(&state.viewers),
        config.timing.counter_interval(),
    );
    let producers = [
        spawn_producer(engine, shutdown.clone()),
        spawn_producer(counter, shutdown.clone()),
    ];

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, shutting down");
                    shutdown.cancel();
                }
                Err(e) => warn!(error = %e, "Ctrl-C handler unavailable"),
            }
        });
    }

    // 6. Serve until shutdown.
    let served = lifecast_observer::serve(listener, state).await;
    if let Err(e) = &served {
        error!(error = %e, "stream server exited");
    }
    shutdown.cancel();
    for producer in producers {
        if let Err(e) = producer.await {
            warn!(error = %e, "frame producer task failed");
        }
    }
    served?;

    info!("lifecast shutdown complete");
    Ok(())
}
