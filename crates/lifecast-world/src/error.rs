//! Error types for the `lifecast-world` crate.

/// Errors that can occur when constructing a [`Grid`](crate::Grid).
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// One of the dimensions is zero.
    #[error("grid dimensions must be non-zero (got {width}x{height})")]
    EmptyDimension {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
    },

    /// The cell count does not fit in memory addressing.
    #[error("grid of {width}x{height} cells is too large")]
    TooLarge {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
    },

    /// The live-cell density is above 100 percent.
    #[error("density must be between 0 and 100 percent (got {0})")]
    InvalidDensity(u32),

    /// A text row does not match the width of the first row.
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRows {
        /// Zero-based index of the offending row.
        row: usize,
        /// Width taken from the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
}
