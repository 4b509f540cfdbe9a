//! Raster grid encoders backed by the `image` crate.

use std::io::Cursor;
use std::num::NonZeroU32;

use image::{ImageBuffer, ImageFormat, Pixel, Rgb, Rgba};
use lifecast_world::Grid;

use crate::encoder::{GridEncoder, canvas_size};
use crate::error::RenderError;
use crate::frame::{Frame, JPEG_CONTENT_TYPE, PNG_CONTENT_TYPE};

/// Draws live cells as opaque black squares on a transparent canvas.
#[derive(Debug, Clone, Copy)]
pub struct PngEncoder {
    scale: NonZeroU32,
}

impl PngEncoder {
    /// Create an encoder drawing `scale` pixels per cell.
    pub const fn new(scale: NonZeroU32) -> Self {
        Self { scale }
    }
}

impl GridEncoder for PngEncoder {
    fn content_type(&self) -> &'static str {
        PNG_CONTENT_TYPE
    }

    fn encode(&self, grid: &Grid) -> Result<Frame, RenderError> {
        let image = rasterize(grid, self.scale, Rgba([0_u8, 0, 0, 255]), Rgba([0_u8, 0, 0, 0]))?;
        encode_image(&image, ImageFormat::Png).map(|bytes| Frame::new(PNG_CONTENT_TYPE, bytes))
    }
}

/// Draws live cells as black squares on a white canvas.
///
/// JPEG has no alpha channel, so the background is filled explicitly.
#[derive(Debug, Clone, Copy)]
pub struct JpegEncoder {
    scale: NonZeroU32,
}

impl JpegEncoder {
    /// Create an encoder drawing `scale` pixels per cell.
    pub const fn new(scale: NonZeroU32) -> Self {
        Self { scale }
    }
}

impl GridEncoder for JpegEncoder {
    fn content_type(&self) -> &'static str {
        JPEG_CONTENT_TYPE
    }

    fn encode(&self, grid: &Grid) -> Result<Frame, RenderError> {
        let image = rasterize(grid, self.scale, Rgb([0_u8, 0, 0]), Rgb([255_u8, 255, 255]))?;
        encode_image(&image, ImageFormat::Jpeg).map(|bytes| Frame::new(JPEG_CONTENT_TYPE, bytes))
    }
}

fn rasterize<P>(
    grid: &Grid,
    scale: NonZeroU32,
    live: P,
    dead: P,
) -> Result<ImageBuffer<P, Vec<P::Subpixel>>, RenderError>
where
    P: Pixel,
{
    let (width, height) = canvas_size(grid, scale)?;
    let k = scale.get();
    Ok(ImageBuffer::from_fn(width, height, |px, py| {
        let cell = |p: u32| {
            p.checked_div(k)
                .and_then(|c| usize::try_from(c).ok())
                .unwrap_or(usize::MAX)
        };
        if grid.is_alive(cell(px), cell(py)) { live } else { dead }
    }))
}

fn encode_image<P>(
    image: &ImageBuffer<P, Vec<P::Subpixel>>,
    format: ImageFormat,
) -> Result<Vec<u8>, RenderError>
where
    P: Pixel + image::PixelWithColorType,
    [P::Subpixel]: image::EncodableLayout,
{
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, format)?;
    Ok(buf.into_inner())
}
