//! World state for the Lifecast simulation.
//!
//! - [`grid`] -- the immutable [`Grid`] snapshot, seeded random
//!   initialisation, and the pure [`evolve`] transition.
//! - [`error`] -- [`WorldError`] for invalid grid construction.

pub mod error;
pub mod grid;

pub use error::WorldError;
pub use grid::{Grid, evolve, next_state};
