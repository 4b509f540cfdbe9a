//! Single-slot frame handoff between a hub and one session.

use std::fmt;
use std::sync::Arc;

use lifecast_render::Frame;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

/// Unique identifier of a sink within any hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SinkId(pub Uuid);

impl SinkId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SinkId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The receiving end of a one-frame mailbox, owned by a stream session.
///
/// The slot holds at most one frame. While it is occupied, further
/// deliveries are refused instead of queued.
#[derive(Debug)]
pub struct Sink {
    id: SinkId,
    tx: mpsc::Sender<Arc<Frame>>,
    rx: mpsc::Receiver<Arc<Frame>>,
}

impl Sink {
    /// Create an empty sink.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(1);
        Self {
            id: SinkId::new(),
            tx,
            rx,
        }
    }

    /// This sink's identifier.
    pub const fn id(&self) -> SinkId {
        self.id
    }

    /// A non-owning handle that can offer frames to this sink.
    pub fn handle(&self) -> SinkHandle {
        SinkHandle {
            id: self.id,
            tx: self.tx.clone(),
        }
    }

    /// Wait for the next frame.
    ///
    /// The sink keeps its own sender, so this only resolves once a frame
    /// arrives. Callers race it against their own cancellation signal.
    pub async fn recv(&mut self) -> Option<Arc<Frame>> {
        self.rx.recv().await
    }

    /// Take the pending frame, if any, without waiting.
    pub fn try_recv(&mut self) -> Option<Arc<Frame>> {
        self.rx.try_recv().ok()
    }
}

impl Default for Sink {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of offering one frame to one sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The frame now occupies the sink's slot.
    Delivered,
    /// The previous frame has not been consumed yet; this one was skipped.
    Dropped,
    /// The owning session has gone away.
    Closed,
}

/// The hub's side of a [`Sink`]: offer-only and never blocking.
#[derive(Debug, Clone)]
pub struct SinkHandle {
    id: SinkId,
    tx: mpsc::Sender<Arc<Frame>>,
}

impl SinkHandle {
    /// Identifier of the sink this handle feeds.
    pub const fn id(&self) -> SinkId {
        self.id
    }

    /// Offer `frame` without waiting for space.
    pub fn try_deliver(&self, frame: &Arc<Frame>) -> Delivery {
        match self.tx.try_send(Arc::clone(frame)) {
            Ok(()) => Delivery::Delivered,
            Err(TrySendError::Full(_)) => Delivery::Dropped,
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        }
    }
}
