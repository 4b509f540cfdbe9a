//! SVG encoders: the simulation board and the viewer-count badge.

use std::fmt::Write as _;
use std::num::NonZeroU32;

use lifecast_world::Grid;

use crate::encoder::{GridEncoder, canvas_size};
use crate::error::RenderError;
use crate::frame::{Frame, SVG_CONTENT_TYPE};

/// Side length in pixels of one character of the viewer-count badge.
const COUNTER_GLYPH_PX: usize = 14;

/// Draws each live cell as a black `scale`-sized square.
#[derive(Debug, Clone, Copy)]
pub struct SvgEncoder {
    scale: NonZeroU32,
}

impl SvgEncoder {
    /// Create an encoder drawing `scale` pixels per cell.
    pub const fn new(scale: NonZeroU32) -> Self {
        Self { scale }
    }
}

impl GridEncoder for SvgEncoder {
    fn content_type(&self) -> &'static str {
        SVG_CONTENT_TYPE
    }

    fn encode(&self, grid: &Grid) -> Result<Frame, RenderError> {
        let (width, height) = canvas_size(grid, self.scale)?;
        let k = u64::from(self.scale.get());

        let mut out = String::with_capacity(grid.live_count().saturating_mul(64).saturating_add(256));
        open_document(&mut out, u64::from(width), u64::from(height))?;
        for (x, y) in grid.live_cells() {
            let px = u64::try_from(x).unwrap_or(u64::MAX).saturating_mul(k);
            let py = u64::try_from(y).unwrap_or(u64::MAX).saturating_mul(k);
            writeln!(
                out,
                r#"<rect x="{px}" y="{py}" width="{k}" height="{k}" fill="black"/>"#
            )?;
        }
        close_document(&mut out)?;

        Ok(Frame::new(SVG_CONTENT_TYPE, out))
    }
}

/// Render `count` as red text centred in a badge sized to its digits.
pub fn counter_frame(count: usize) -> Result<Frame, RenderError> {
    let text = count.to_string();
    let width = text.len().saturating_mul(COUNTER_GLYPH_PX);
    let height = COUNTER_GLYPH_PX;

    let mut out = String::with_capacity(320);
    open_document(
        &mut out,
        u64::try_from(width).unwrap_or(u64::MAX),
        u64::try_from(height).unwrap_or(u64::MAX),
    )?;
    writeln!(
        out,
        r#"<text x="{cx}" y="{cy}" font-size="{height}" fill="red" dominant-baseline="middle" text-anchor="middle">{text}</text>"#,
        cx = width / 2,
        cy = height / 2,
    )?;
    close_document(&mut out)?;

    Ok(Frame::new(SVG_CONTENT_TYPE, out))
}

fn open_document(out: &mut String, width: u64, height: u64) -> Result<(), RenderError> {
    writeln!(out, r#"<?xml version="1.0"?>"#)?;
    writeln!(
        out,
        r#"<svg width="{width}" height="{height}" xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">"#
    )?;
    Ok(())
}

fn close_document(out: &mut String) -> Result<(), RenderError> {
    writeln!(out, "</svg>")?;
    Ok(())
}
