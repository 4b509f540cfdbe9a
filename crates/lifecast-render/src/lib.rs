//! Frame encoding for the Lifecast streams.
//!
//! A [`Frame`] is an opaque encoded payload plus its content type. Grids
//! are turned into frames by a [`GridEncoder`]; the viewer counter uses
//! [`svg::counter_frame`].
//!
//! # Modules
//!
//! - [`frame`] -- the immutable [`Frame`] value and content-type constants.
//! - [`encoder`] -- the [`GridEncoder`] trait and [`FrameFormat`] selector.
//! - [`svg`] -- vector grid encoder and the viewer-count badge.
//! - [`raster`] -- PNG and JPEG grid encoders.
//! - [`error`] -- [`RenderError`].

pub mod encoder;
pub mod error;
pub mod frame;
pub mod raster;
pub mod svg;

pub use encoder::{FrameFormat, GridEncoder};
pub use error::RenderError;
pub use frame::Frame;
pub use raster::{JpegEncoder, PngEncoder};
pub use svg::SvgEncoder;
