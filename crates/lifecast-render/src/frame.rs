//! The immutable [`Frame`] value shared by every sink of a hub.

use bytes::Bytes;

/// Content type of SVG frames.
pub const SVG_CONTENT_TYPE: &str = "image/svg+xml";

/// Content type of PNG frames.
pub const PNG_CONTENT_TYPE: &str = "image/png";

/// Content type of JPEG frames.
pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// One encoded image ready to be written to a stream.
///
/// Frames are read-only once built. Hubs wrap them in an [`Arc`] so a
/// single allocation is shared by every connected viewer.
///
/// [`Arc`]: std::sync::Arc
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    content_type: &'static str,
    payload: Bytes,
}

impl Frame {
    /// Create a frame from an encoded payload and its content type.
    pub fn new(content_type: &'static str, payload: impl Into<Bytes>) -> Self {
        Self {
            content_type,
            payload: payload.into(),
        }
    }

    /// The MIME type of the payload, e.g. `image/svg+xml`.
    pub const fn content_type(&self) -> &'static str {
        self.content_type
    }

    /// The encoded bytes.
    pub const fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
