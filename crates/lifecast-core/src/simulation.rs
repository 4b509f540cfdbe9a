//! The simulation engine: the only owner of the grid.
//!
//! Each step replaces the grid with its successor, encodes it and
//! publishes the frame. Nothing is computed while the hub is empty; the
//! engine parks on the hub's membership watch until someone joins.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use lifecast_hub::Hub;
use lifecast_render::{Frame, GridEncoder, RenderError};
use lifecast_world::{Grid, evolve};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::producer::FrameProducer;

/// Counters shared between the engine task and observers of it.
#[derive(Debug, Default)]
pub struct EngineStats {
    generations: AtomicU64,
    live_cells: AtomicUsize,
}

impl EngineStats {
    /// Number of successor grids computed so far.
    pub fn generations(&self) -> u64 {
        self.generations.load(Ordering::Acquire)
    }

    /// Live cells in the most recent grid.
    pub fn live_cells(&self) -> usize {
        self.live_cells.load(Ordering::Acquire)
    }
}

/// Clock-driven producer for the simulation stream.
pub struct SimulationEngine {
    grid: Grid,
    hub: Arc<Hub>,
    encoder: Box<dyn GridEncoder>,
    step_interval: Duration,
    stats: Arc<EngineStats>,
}

impl SimulationEngine {
    /// Create an engine that starts from `grid` and publishes into `hub`.
    pub fn new(
        grid: Grid,
        hub: Arc<Hub>,
        encoder: Box<dyn GridEncoder>,
        step_interval: Duration,
    ) -> Self {
        let stats = Arc::new(EngineStats::default());
        stats.live_cells.store(grid.live_count(), Ordering::Release);
        Self {
            grid,
            hub,
            encoder,
            step_interval,
            stats,
        }
    }

    /// Shared handle to the engine's counters.
    pub fn stats(&self) -> Arc<EngineStats> {
        Arc::clone(&self.stats)
    }

    /// The current grid.
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Advance one generation and encode the result.
    ///
    /// The grid advances even if encoding fails.
    pub fn step(&mut self) -> Result<Arc<Frame>, RenderError> {
        self.grid = evolve(&self.grid);
        self.stats.generations.fetch_add(1, Ordering::AcqRel);
        self.stats
            .live_cells
            .store(self.grid.live_count(), Ordering::Release);
        self.encoder.encode(&self.grid).map(Arc::new)
    }
}

impl FrameProducer for SimulationEngine {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    async fn run(mut self, shutdown: CancellationToken) {
        let mut viewers = self.hub.watch_viewers();
        info!(
            width = self.grid.width(),
            height = self.grid.height(),
            live_cells = self.grid.live_count(),
            content_type = self.encoder.content_type(),
            step_interval_ms = self.step_interval.as_millis(),
            "simulation engine starting"
        );

        loop {
            if self.hub.viewer_count() == 0 {
                info!(generation = self.stats.generations(), "no viewers, simulation idle");
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    watched = until_watched(&mut viewers) => {
                        if !watched {
                            break;
                        }
                    }
                }
                info!("viewer connected, simulation resumed");
            }

            match self.step() {
                Ok(frame) => {
                    let report = self.hub.publish(frame);
                    debug!(
                        generation = self.stats.generations(),
                        live_cells = self.stats.live_cells(),
                        delivered = report.delivered,
                        dropped = report.dropped,
                        "generation published"
                    );
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        generation = self.stats.generations(),
                        "failed to encode generation, skipping publish"
                    );
                }
            }

            tokio::select! {
                () = shutdown.cancelled() => break,
                () = tokio::time::sleep(self.step_interval) => {}
            }
        }

        info!(generations = self.stats.generations(), "simulation engine stopped");
    }
}

/// Wait until the hub has at least one member. `false` if the hub is gone.
async fn until_watched(viewers: &mut watch::Receiver<usize>) -> bool {
    viewers.wait_for(|&count| count > 0).await.is_ok()
}
