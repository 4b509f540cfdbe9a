//! Error types for frame encoding.

/// Errors that can occur while encoding a frame.
///
/// Encoding failures are never fatal to a stream: the producer logs the
/// error and skips that tick.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The scaled canvas does not fit the encoder's coordinate range.
    #[error("canvas for {width}x{height} grid at scale {scale} is too large")]
    CanvasTooLarge {
        /// Grid width in cells.
        width: usize,
        /// Grid height in cells.
        height: usize,
        /// Pixels per cell.
        scale: u32,
    },

    /// Writing the vector markup failed.
    #[error("failed to write SVG markup: {0}")]
    Markup(#[from] std::fmt::Error),

    /// The raster encoder rejected the image.
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}
