//! The broadcast hub: concurrent membership plus non-blocking fan-out.
//!
//! # Concurrency
//!
//! The membership map lives behind a [`std::sync::Mutex`]. Every critical
//! section is short and never awaits: `join` and `leave` touch one map
//! entry, and `publish` walks the map doing one
//! [`try_deliver`](SinkHandle::try_deliver) per sink, which cannot block.
//! A plain mutex lets [`Registration`] leave from `Drop`, so a session's
//! membership is released on every exit path.
//!
//! The current membership size is mirrored on a [`watch`] channel. The
//! simulation engine waits on it while idle and the viewer counter
//! re-renders whenever it changes.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lifecast_render::Frame;
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::sink::{Delivery, Sink, SinkHandle, SinkId};

/// Per-publish delivery counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Sinks whose slot received the frame.
    pub delivered: usize,
    /// Sinks that still held the previous frame and skipped this one.
    pub dropped: usize,
    /// Sinks whose session has already gone away.
    pub closed: usize,
}

impl PublishReport {
    fn record(&mut self, delivery: Delivery) {
        let counter = match delivery {
            Delivery::Delivered => &mut self.delivered,
            Delivery::Dropped => &mut self.dropped,
            Delivery::Closed => &mut self.closed,
        };
        *counter = counter.saturating_add(1);
    }
}

/// The set of sinks currently watching one stream.
#[derive(Debug)]
pub struct Hub {
    name: &'static str,
    members: Mutex<BTreeMap<SinkId, SinkHandle>>,
    viewers: watch::Sender<usize>,
}

impl Hub {
    /// Create an empty hub. `name` only appears in logs.
    pub fn new(name: &'static str) -> Self {
        let (viewers, _) = watch::channel(0);
        Self {
            name,
            members: Mutex::new(BTreeMap::new()),
            viewers,
        }
    }

    /// The hub's log name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Register `sink` for future frames.
    ///
    /// The returned [`Registration`] removes the sink again when released
    /// or dropped. Joining the same sink twice keeps a single entry, and
    /// both registrations share it: whichever releases first removes it,
    /// after which the other reports itself released too.
    pub fn join(self: &Arc<Self>, sink: &Sink) -> Registration {
        let handle = sink.handle();
        let id = handle.id();
        let viewers = {
            let mut members = self.lock();
            members.insert(id, handle);
            let len = members.len();
            self.viewers.send_replace(len);
            len
        };
        debug!(hub = self.name, sink = %id, viewers, "sink joined");

        Registration {
            hub: Arc::clone(self),
            sink: id,
            released: AtomicBool::new(false),
        }
    }

    /// Remove a sink. Returns `false` if it was not a member.
    pub fn leave(&self, id: SinkId) -> bool {
        let (removed, viewers) = {
            let mut members = self.lock();
            let removed = members.remove(&id).is_some();
            let len = members.len();
            if removed {
                self.viewers.send_replace(len);
            }
            (removed, len)
        };
        if removed {
            debug!(hub = self.name, sink = %id, viewers, "sink left");
        }
        removed
    }

    /// Offer `frame` to every member without waiting on any of them.
    ///
    /// A sink whose slot is still occupied simply misses this frame.
    pub fn publish(&self, frame: Arc<Frame>) -> PublishReport {
        let mut report = PublishReport::default();
        {
            let members = self.lock();
            for handle in members.values() {
                report.record(handle.try_deliver(&frame));
            }
        }
        trace!(
            hub = self.name,
            delivered = report.delivered,
            dropped = report.dropped,
            closed = report.closed,
            "frame published"
        );
        report
    }

    /// Whether `id` is currently joined.
    pub fn contains(&self, id: SinkId) -> bool {
        self.lock().contains_key(&id)
    }

    /// Number of sinks currently joined.
    pub fn viewer_count(&self) -> usize {
        self.lock().len()
    }

    /// Subscribe to membership-size changes.
    pub fn watch_viewers(&self) -> watch::Receiver<usize> {
        self.viewers.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<SinkId, SinkHandle>> {
        // The map is consistent between statements, so a panic elsewhere
        // while holding the lock leaves nothing half-written.
        self.members.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Proof of membership in a [`Hub`], and the capability to leave it.
///
/// Leaving happens at most once: further [`release`](Self::release) calls
/// and the eventual drop are no-ops.
#[derive(Debug)]
#[must_use = "dropping a Registration immediately leaves the hub"]
pub struct Registration {
    hub: Arc<Hub>,
    sink: SinkId,
    released: AtomicBool,
}

impl Registration {
    /// The registered sink.
    pub const fn sink_id(&self) -> SinkId {
        self.sink
    }

    /// Whether this registration's entry is no longer in the hub, either
    /// because it was released here or through another registration of
    /// the same sink.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire) || !self.hub.contains(self.sink)
    }

    /// Leave the hub. Returns `true` only for the call that actually
    /// removed the entry.
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.hub.leave(self.sink)
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn frame(tag: &'static str) -> Arc<Frame> {
        Arc::new(Frame::new("image/svg+xml", tag))
    }

    #[test]
    fn join_then_leave_restores_count() {
        let hub = Arc::new(Hub::new("test"));
        let resident = Sink::new();
        let _resident = hub.join(&resident);
        assert_eq!(hub.viewer_count(), 1);

        let sink = Sink::new();
        let registration = hub.join(&sink);
        assert_eq!(hub.viewer_count(), 2);
        assert!(registration.release());
        assert_eq!(hub.viewer_count(), 1);
    }

    #[test]
    fn release_is_idempotent() {
        let hub = Arc::new(Hub::new("test"));
        let keep = Sink::new();
        let _keep = hub.join(&keep);
        let sink = Sink::new();
        let registration = hub.join(&sink);
        assert_eq!(registration.sink_id(), sink.id());

        assert!(registration.release());
        assert!(!registration.release());
        assert!(!registration.release());
        assert!(registration.is_released());
        assert_eq!(hub.viewer_count(), 1);

        drop(registration);
        assert_eq!(hub.viewer_count(), 1);
    }

    #[test]
    fn leave_of_absent_sink_is_noop() {
        let hub = Hub::new("test");
        assert!(!hub.leave(SinkId::new()));
        assert_eq!(hub.viewer_count(), 0);
    }

    #[test]
    fn dropping_registration_leaves() {
        let hub = Arc::new(Hub::new("test"));
        let sink = Sink::new();
        {
            let _registration = hub.join(&sink);
            assert_eq!(hub.viewer_count(), 1);
        }
        assert_eq!(hub.viewer_count(), 0);
    }

    #[test]
    fn joining_twice_keeps_one_entry() {
        let hub = Arc::new(Hub::new("test"));
        let sink = Sink::new();
        let first = hub.join(&sink);
        let _second = hub.join(&sink);
        assert_eq!(hub.viewer_count(), 1);
        first.release();
        assert_eq!(hub.viewer_count(), 0);
    }

    #[test]
    fn double_join_registrations_share_one_entry() {
        let hub = Arc::new(Hub::new("test"));
        let sink = Sink::new();
        let first = hub.join(&sink);
        let second = hub.join(&sink);
        assert!(hub.contains(sink.id()));
        assert!(!second.is_released());

        assert!(first.release());
        assert!(!hub.contains(sink.id()));
        assert!(second.is_released());
        assert!(!second.release());

        drop(second);
        assert_eq!(hub.viewer_count(), 0);
    }

    #[test]
    fn slow_sink_never_queues_more_than_one_frame() {
        let hub = Arc::new(Hub::new("test"));
        let mut sink = Sink::new();
        let _registration = hub.join(&sink);

        let first = hub.publish(frame("0"));
        assert_eq!(first.delivered, 1);
        for _ in 0..9 {
            let report = hub.publish(frame("n"));
            assert_eq!(report, PublishReport { delivered: 0, dropped: 1, closed: 0 });
        }

        assert_eq!(sink.try_recv().unwrap().payload().as_ref(), b"0");
        assert!(sink.try_recv().is_none());
    }

    #[test]
    fn slow_sink_does_not_hold_back_others() {
        let hub = Arc::new(Hub::new("test"));
        let slow = Sink::new();
        let mut fast = Sink::new();
        let _slow = hub.join(&slow);
        let _fast = hub.join(&fast);

        for tag in ["a", "b", "c"] {
            hub.publish(frame(tag));
            assert_eq!(fast.try_recv().unwrap().payload().as_ref(), tag.as_bytes());
        }
    }

    #[test]
    fn every_free_sink_gets_the_same_frame() {
        let hub = Arc::new(Hub::new("test"));
        let mut a = Sink::new();
        let mut b = Sink::new();
        let _a = hub.join(&a);
        let _b = hub.join(&b);

        let report = hub.publish(frame("same"));
        assert_eq!(report.delivered, 2);

        let from_a = a.try_recv().unwrap();
        let from_b = b.try_recv().unwrap();
        assert!(Arc::ptr_eq(&from_a, &from_b));
    }

    #[test]
    fn dropped_sink_is_reported_closed() {
        let hub = Arc::new(Hub::new("test"));
        let sink = Sink::new();
        let registration = hub.join(&sink);
        drop(sink);

        let report = hub.publish(frame("x"));
        assert_eq!(report.closed, 1);
        drop(registration);
        assert_eq!(hub.viewer_count(), 0);
    }

    #[test]
    fn publish_to_empty_hub_is_noop() {
        let hub = Hub::new("test");
        assert_eq!(hub.publish(frame("x")), PublishReport::default());
    }

    #[tokio::test]
    async fn watch_follows_membership() {
        let hub = Arc::new(Hub::new("test"));
        let mut viewers = hub.watch_viewers();
        assert_eq!(*viewers.borrow_and_update(), 0);

        let sink = Sink::new();
        let registration = hub.join(&sink);
        viewers.changed().await.unwrap();
        assert_eq!(*viewers.borrow_and_update(), 1);

        registration.release();
        viewers.changed().await.unwrap();
        assert_eq!(*viewers.borrow_and_update(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_membership_and_publish() {
        let hub = Arc::new(Hub::new("test"));

        let publisher = {
            let hub = Arc::clone(&hub);
            tokio::spawn(async move {
                for _ in 0..200 {
                    hub.publish(frame("tick"));
                    tokio::task::yield_now().await;
                }
            })
        };

        let mut viewers = Vec::new();
        for _ in 0..32 {
            let hub = Arc::clone(&hub);
            viewers.push(tokio::spawn(async move {
                for _ in 0..20 {
                    let mut sink = Sink::new();
                    let registration = hub.join(&sink);
                    let _ = tokio::time::timeout(Duration::from_millis(1), sink.recv()).await;
                    registration.release();
                    registration.release();
                }
            }));
        }

        for viewer in viewers {
            viewer.await.unwrap();
        }
        publisher.await.unwrap();
        assert_eq!(hub.viewer_count(), 0);
    }
}
