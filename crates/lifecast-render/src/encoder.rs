//! The [`GridEncoder`] seam between the simulation and the image formats.

use std::fmt;
use std::num::NonZeroU32;

use lifecast_world::Grid;
use serde::Deserialize;

use crate::error::RenderError;
use crate::frame::Frame;
use crate::raster::{JpegEncoder, PngEncoder};
use crate::svg::SvgEncoder;

/// Turns a grid snapshot into an encoded [`Frame`].
///
/// Implementations must be cheap to share across tasks; the simulation
/// engine owns one behind a `Box<dyn GridEncoder>`.
pub trait GridEncoder: Send + Sync {
    /// The content type of every frame this encoder produces.
    fn content_type(&self) -> &'static str;

    /// Encode one grid.
    fn encode(&self, grid: &Grid) -> Result<Frame, RenderError>;
}

/// Image format selected for the simulation stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameFormat {
    /// Scalable vector markup, one `rect` per live cell.
    #[default]
    Svg,
    /// Lossless raster with a transparent background.
    Png,
    /// Lossy raster on a white background.
    Jpeg,
}

impl FrameFormat {
    /// Build the encoder for this format at `scale` pixels per cell.
    pub fn encoder(self, scale: NonZeroU32) -> Box<dyn GridEncoder> {
        match self {
            Self::Svg => Box::new(SvgEncoder::new(scale)),
            Self::Png => Box::new(PngEncoder::new(scale)),
            Self::Jpeg => Box::new(JpegEncoder::new(scale)),
        }
    }
}

impl fmt::Display for FrameFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Svg => "svg",
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        };
        f.write_str(name)
    }
}

/// Pixel size of `grid` drawn at `scale` pixels per cell.
pub(crate) fn canvas_size(grid: &Grid, scale: NonZeroU32) -> Result<(u32, u32), RenderError> {
    let too_large = || RenderError::CanvasTooLarge {
        width: grid.width(),
        height: grid.height(),
        scale: scale.get(),
    };
    let scaled = |cells: usize| {
        u32::try_from(cells)
            .ok()
            .and_then(|n| n.checked_mul(scale.get()))
            .ok_or_else(too_large)
    };
    Ok((scaled(grid.width())?, scaled(grid.height())?))
}
