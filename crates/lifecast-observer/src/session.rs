//! One streaming connection: hub membership in, multipart parts out.
//!
//! # Lifecycle
//!
//! ```text
//! Connecting ──open()──> Streaming ──shutdown / drop──> Closed
//! ```
//!
//! `open` creates the sink and joins the hub. While streaming, each frame
//! that lands in the sink becomes one complete multipart part. Hyper
//! writes every body chunk as soon as it is yielded, so a part reaches
//! the client without extra buffering. When the client disconnects or a
//! write fails, hyper drops the body and with it the session; entering
//! `Closed` from any path releases the hub registration exactly once.
//!
//! # Wire format
//!
//! ```text
//! \r\n--BOUNDARY\r\n
//! Content-Type: image/svg+xml\r\n
//! Content-Length: 1234\r\n
//! \r\n
//! <payload>
//! ```
//!
//! No closing boundary is ever sent; the stream ends with the connection.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use bytes::{Bytes, BytesMut};
use lifecast_hub::{Hub, Registration, Sink};
use lifecast_render::Frame;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Multipart boundary token.
pub const BOUNDARY: &str = "BOUNDARY";

/// `Content-Type` of every streaming response.
pub const STREAM_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=BOUNDARY";

/// Serialise `frame` as one multipart part.
///
/// The whole part is built in a single buffer so it is written in one
/// piece: either the client gets the full part or the write fails as a
/// whole.
pub fn encode_part(frame: &Frame) -> Bytes {
    let header = format!(
        "\r\n--{BOUNDARY}\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n",
        frame.content_type(),
        frame.len()
    );
    let mut part = BytesMut::with_capacity(header.len().saturating_add(frame.len()));
    part.extend_from_slice(header.as_bytes());
    part.extend_from_slice(frame.payload());
    part.freeze()
}

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, not yet joined to the hub.
    Connecting,
    /// Joined and forwarding frames.
    Streaming,
    /// Left the hub; yields nothing more.
    Closed,
}

/// What ended a wait for the next frame.
enum Next {
    Frame(Arc<Frame>),
    Ended(&'static str),
}

/// Bridges one HTTP response to one hub membership.
#[derive(Debug)]
pub struct StreamSession {
    hub: Arc<Hub>,
    shutdown: CancellationToken,
    state: SessionState,
    sink: Option<Sink>,
    registration: Option<Registration>,
    parts_sent: u64,
}

impl StreamSession {
    /// Create a session for `hub`. Nothing is joined until [`open`](Self::open).
    pub const fn new(hub: Arc<Hub>, shutdown: CancellationToken) -> Self {
        Self {
            hub,
            shutdown,
            state: SessionState::Connecting,
            sink: None,
            registration: None,
            parts_sent: 0,
        }
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Number of parts handed to the connection so far.
    pub const fn parts_sent(&self) -> u64 {
        self.parts_sent
    }

    /// Create the sink and join the hub. Only acts in `Connecting`.
    pub fn open(&mut self) {
        if self.state != SessionState::Connecting {
            return;
        }
        let sink = Sink::new();
        let registration = self.hub.join(&sink);
        debug!(hub = self.hub.name(), sink = %sink.id(), "stream session opened");
        self.sink = Some(sink);
        self.registration = Some(registration);
        self.state = SessionState::Streaming;
    }

    /// Wait for the next frame and return it as an encoded part.
    ///
    /// Opens the session first if needed. Returns `None` once the session
    /// is closed.
    pub async fn next_part(&mut self) -> Option<Bytes> {
        if self.state == SessionState::Connecting {
            self.open();
        }
        if self.state != SessionState::Streaming {
            return None;
        }

        let next = {
            let sink = self.sink.as_mut()?;
            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => Next::Ended("server shutdown"),
                frame = sink.recv() => frame.map_or(Next::Ended("sink closed"), Next::Frame),
            }
        };

        match next {
            Next::Frame(frame) => {
                self.parts_sent = self.parts_sent.saturating_add(1);
                Some(encode_part(&frame))
            }
            Next::Ended(reason) => {
                self.close(reason);
                None
            }
        }
    }

    /// Leave the hub and stop streaming. Idempotent.
    pub fn close(&mut self, reason: &'static str) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;
        self.sink = None;
        if let Some(registration) = self.registration.take() {
            registration.release();
        }
        debug!(
            hub = self.hub.name(),
            parts_sent = self.parts_sent,
            reason,
            "stream session closed"
        );
    }

    /// Turn the session into a streaming response body.
    ///
    /// The body owns the session; dropping the body closes it.
    pub fn into_body(self) -> Body {
        let parts = futures::stream::unfold(self, |mut session| async move {
            let part = session.next_part().await?;
            Some((Ok::<_, Infallible>(part), session))
        });
        Body::from_stream(parts)
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.close("connection dropped");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn frame() -> Arc<Frame> {
        Arc::new(Frame::new("image/svg+xml", "<svg/>"))
    }

    #[test]
    fn part_layout_matches_wire_format() {
        let part = encode_part(&frame());
        assert_eq!(
            part.as_ref(),
            b"\r\n--BOUNDARY\r\nContent-Type: image/svg+xml\r\nContent-Length: 6\r\n\r\n<svg/>"
        );
    }

    #[test]
    fn part_length_counts_bytes_not_chars() {
        let part = encode_part(&Frame::new("text/plain", "é"));
        assert!(part.ends_with(b"Content-Length: 2\r\n\r\n\xC3\xA9"));
    }

    #[test]
    fn open_joins_and_close_leaves_once() {
        let hub = Arc::new(Hub::new("test"));
        let mut session = StreamSession::new(Arc::clone(&hub), CancellationToken::new());
        assert_eq!(session.state(), SessionState::Connecting);
        assert_eq!(hub.viewer_count(), 0);

        session.open();
        session.open();
        assert_eq!(session.state(), SessionState::Streaming);
        assert_eq!(hub.viewer_count(), 1);

        session.close("test");
        session.close("test");
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(hub.viewer_count(), 0);
    }

    #[test]
    fn drop_leaves_the_hub() {
        let hub = Arc::new(Hub::new("test"));
        let mut session = StreamSession::new(Arc::clone(&hub), CancellationToken::new());
        session.open();
        assert_eq!(hub.viewer_count(), 1);
        drop(session);
        assert_eq!(hub.viewer_count(), 0);
    }

    #[tokio::test]
    async fn forwards_published_frames_as_parts() {
        let hub = Arc::new(Hub::new("test"));
        let mut session = StreamSession::new(Arc::clone(&hub), CancellationToken::new());
        session.open();

        hub.publish(frame());
        let part = session.next_part().await.unwrap();
        assert!(part.starts_with(b"\r\n--BOUNDARY\r\n"));
        assert_eq!(session.parts_sent(), 1);
    }

    #[tokio::test]
    async fn next_part_opens_lazily() {
        let hub = Arc::new(Hub::new("test"));
        let mut session = StreamSession::new(Arc::clone(&hub), CancellationToken::new());

        let waiting = tokio::time::timeout(Duration::from_millis(20), session.next_part()).await;
        assert!(waiting.is_err());
        assert_eq!(session.state(), SessionState::Streaming);
        assert_eq!(hub.viewer_count(), 1);
    }

    #[tokio::test]
    async fn shutdown_closes_the_session() {
        let hub = Arc::new(Hub::new("test"));
        let shutdown = CancellationToken::new();
        let mut session = StreamSession::new(Arc::clone(&hub), shutdown.clone());
        session.open();

        shutdown.cancel();
        assert!(session.next_part().await.is_none());
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(hub.viewer_count(), 0);
        assert!(session.next_part().await.is_none());
    }

    #[tokio::test]
    async fn closed_session_never_reopens() {
        let hub = Arc::new(Hub::new("test"));
        let mut session = StreamSession::new(Arc::clone(&hub), CancellationToken::new());
        session.close("before open");
        assert!(session.next_part().await.is_none());
        assert_eq!(hub.viewer_count(), 0);
    }
}
