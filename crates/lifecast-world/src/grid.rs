//! The cellular-automaton grid and its transition rule.
//!
//! A [`Grid`] is an immutable snapshot: once built it is never mutated.
//! [`evolve`] reads one snapshot and returns a disjoint successor, so the
//! simulation task can hand out `&Grid` without any locking.
//!
//! # Rule
//!
//! Every cell looks at its eight neighbours. Cells outside the grid are
//! dead (the board does not wrap).
//!
//! | Current | Live neighbours | Next |
//! |---------|-----------------|------|
//! | live    | 2 or 3          | live |
//! | dead    | 3               | live |
//! | any     | anything else   | dead |

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::WorldError;

/// Relative `(dx, dy)` positions of the eight neighbours of a cell.
const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Character used for a live cell in the text form of a grid.
const LIVE_CHAR: char = 'o';

/// Character used for a dead cell in the text form of a grid.
const DEAD_CHAR: char = '*';

/// A fixed-size board of boolean cells stored row-major.
///
/// `x` runs along the width (columns) and `y` along the height (rows).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl Grid {
    /// Create a grid with every cell dead.
    pub fn empty(width: usize, height: usize) -> Result<Self, WorldError> {
        let len = cell_count(width, height)?;
        Ok(Self {
            width,
            height,
            cells: vec![false; len],
        })
    }

    /// Create a grid where each cell is independently live with probability
    /// `density_percent / 100`.
    ///
    /// The same `(width, height, density_percent, seed)` always yields the
    /// same grid.
    pub fn random(
        width: usize,
        height: usize,
        density_percent: u32,
        seed: u64,
    ) -> Result<Self, WorldError> {
        if density_percent > 100 {
            return Err(WorldError::InvalidDensity(density_percent));
        }
        let len = cell_count(width, height)?;
        let mut rng = StdRng::seed_from_u64(seed);
        let cells = (0..len)
            .map(|_| rng.random_ratio(density_percent, 100))
            .collect();
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Build a grid from text rows, `o` marking a live cell.
    ///
    /// Every other character is a dead cell. All rows must have the same
    /// length.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, WorldError> {
        let width = rows.first().map_or(0, |row| row.as_ref().chars().count());
        let height = rows.len();
        let len = cell_count(width, height)?;

        let mut cells = Vec::with_capacity(len);
        for (row_index, row) in rows.iter().enumerate() {
            let before = cells.len();
            cells.extend(row.as_ref().chars().map(|c| c == LIVE_CHAR));
            let found = cells.len().saturating_sub(before);
            if found != width {
                return Err(WorldError::RaggedRows {
                    row: row_index,
                    expected: width,
                    found,
                });
            }
        }

        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Number of columns.
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Read a cell using signed coordinates.
    ///
    /// Anything outside the grid reads as dead.
    pub fn get(&self, x: isize, y: isize) -> bool {
        match (usize::try_from(x), usize::try_from(y)) {
            (Ok(x), Ok(y)) => self.is_alive(x, y),
            _ => false,
        }
    }

    /// Whether the cell at `(x, y)` is live. Out-of-bounds cells are dead.
    pub fn is_alive(&self, x: usize, y: usize) -> bool {
        self.index(x, y)
            .and_then(|i| self.cells.get(i))
            .copied()
            .unwrap_or(false)
    }

    /// Count the live neighbours of `(x, y)` without wrapping at the edges.
    pub fn live_neighbors(&self, x: usize, y: usize) -> usize {
        NEIGHBOR_OFFSETS
            .iter()
            .filter(|&&(dx, dy)| {
                match (x.checked_add_signed(dx), y.checked_add_signed(dy)) {
                    (Some(nx), Some(ny)) => self.is_alive(nx, ny),
                    _ => false,
                }
            })
            .count()
    }

    /// Total number of live cells.
    pub fn live_count(&self) -> usize {
        self.cells.iter().filter(|&&alive| alive).count()
    }

    /// Iterate over the `(x, y)` coordinates of every live cell, row by row.
    pub fn live_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &alive)| alive)
            .filter_map(move |(i, _)| Some((i.checked_rem(width)?, i.checked_div(width)?)))
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        y.checked_mul(self.width)?.checked_add(x)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                let c = if self.is_alive(x, y) { LIVE_CHAR } else { DEAD_CHAR };
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Whether a cell is live in the next generation.
pub const fn next_state(alive: bool, live_neighbors: usize) -> bool {
    matches!((alive, live_neighbors), (true, 2) | (_, 3))
}

/// Compute the successor generation of `grid`.
///
/// Pure: the input is untouched and the result has the same dimensions.
pub fn evolve(grid: &Grid) -> Grid {
    let mut cells = Vec::with_capacity(grid.cells.len());
    for y in 0..grid.height {
        for x in 0..grid.width {
            cells.push(next_state(grid.is_alive(x, y), grid.live_neighbors(x, y)));
        }
    }
    Grid {
        width: grid.width,
        height: grid.height,
        cells,
    }
}

fn cell_count(width: usize, height: usize) -> Result<usize, WorldError> {
    if width == 0 || height == 0 {
        return Err(WorldError::EmptyDimension { width, height });
    }
    width
        .checked_mul(height)
        .ok_or(WorldError::TooLarge { width, height })
}
