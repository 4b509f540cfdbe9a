//! The viewer counter: an event-driven producer over another hub.
//!
//! The counter renders how many sinks are joined to the tracked
//! (simulation) hub and publishes that badge into its own hub. It
//! re-renders when the tracked membership changes, when its own audience
//! changes (so a new counter viewer is not left blank until the next
//! tick), and on a fixed period regardless.

use std::sync::Arc;
use std::time::Duration;

use lifecast_hub::Hub;
use lifecast_render::{Frame, RenderError, svg};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::producer::FrameProducer;

/// Why the counter re-rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Tracked,
    Audience,
    Tick,
}

/// Publishes the tracked hub's viewer count as an SVG badge.
#[derive(Debug)]
pub struct ViewerCounter {
    tracked: Arc<Hub>,
    hub: Arc<Hub>,
    tick_interval: Duration,
}

impl ViewerCounter {
    /// Count members of `tracked` and publish into `hub` at least every
    /// `tick_interval`.
    pub const fn new(tracked: Arc<Hub>, hub: Arc<Hub>, tick_interval: Duration) -> Self {
        Self {
            tracked,
            hub,
            tick_interval,
        }
    }

    /// Render the current count.
    pub fn render(&self) -> Result<Arc<Frame>, RenderError> {
        svg::counter_frame(self.tracked.viewer_count()).map(Arc::new)
    }

    fn refresh(&self, trigger: Trigger) {
        if self.hub.viewer_count() == 0 {
            return;
        }
        match self.render() {
            Ok(frame) => {
                let report = self.hub.publish(frame);
                debug!(
                    ?trigger,
                    viewers = self.tracked.viewer_count(),
                    delivered = report.delivered,
                    dropped = report.dropped,
                    "viewer count published"
                );
            }
            Err(e) => warn!(error = %e, ?trigger, "failed to render viewer count"),
        }
    }
}

impl FrameProducer for ViewerCounter {
    fn name(&self) -> &'static str {
        "viewer-counter"
    }

    fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    async fn run(self, shutdown: CancellationToken) {
        let mut tracked = self.tracked.watch_viewers();
        let mut audience = self.hub.watch_viewers();
        let first_tick = Instant::now()
            .checked_add(self.tick_interval)
            .unwrap_or_else(Instant::now);
        let mut ticker = tokio::time::interval_at(first_tick, self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            tracked = self.tracked.name(),
            tick_interval_ms = self.tick_interval.as_millis(),
            "viewer counter starting"
        );

        loop {
            let trigger = tokio::select! {
                () = shutdown.cancelled() => break,
                changed = tracked.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    Trigger::Tracked
                }
                changed = audience.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    Trigger::Audience
                }
                _ = ticker.tick() => Trigger::Tick,
            };
            self.refresh(trigger);
        }

        info!("viewer counter stopped");
    }
}
