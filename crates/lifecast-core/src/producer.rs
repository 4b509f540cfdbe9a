//! The [`FrameProducer`] seam shared by every stream's driver.
//!
//! A producer owns whatever decides when the next frame exists (a
//! simulation clock, a membership aggregate) and publishes into one
//! [`Hub`]. The HTTP side only ever sees hubs, so adding a stream means
//! adding a producer.

use std::future::Future;
use std::sync::Arc;

use lifecast_hub::Hub;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Something that publishes frames into a hub until shutdown.
pub trait FrameProducer: Send + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// The hub this producer publishes into.
    fn hub(&self) -> &Arc<Hub>;

    /// Run until `shutdown` is cancelled. Per-frame failures are logged,
    /// never returned.
    fn run(self, shutdown: CancellationToken) -> impl Future<Output = ()> + Send;
}

/// Run `producer` on its own Tokio task.
pub fn spawn_producer<P: FrameProducer>(producer: P, shutdown: CancellationToken) -> JoinHandle<()> {
    let name = producer.name();
    let hub = producer.hub().name();
    info!(producer = name, hub, "frame producer starting");
    tokio::spawn(async move {
        producer.run(shutdown).await;
        info!(producer = name, "frame producer stopped");
    })
}
