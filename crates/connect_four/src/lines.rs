//! Win-line geometry.
//!
//! Every four-in-a-row line on a board is attached to exactly one of its
//! member cells, its anchor. Lines are walked from the anchor in one of four
//! forward directions:
//!
//! - up, up-left and up-right, anchored at the line's bottom cell
//! - right, anchored at the line's leftmost cell
//!
//! The remaining four directions would only revisit the same lines from the
//! opposite end, so they are never stored.

use crate::types::{Coord, WIN_LENGTH, WinLine};
use strum::{EnumIter, IntoEnumIterator};
use tracing::instrument;

/// Forward direction in which a line is walked from its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, strum::Display)]
pub enum Direction {
    /// Towards row 0 in the same column.
    Up,
    /// Towards row 0 and column 0.
    UpLeft,
    /// Towards row 0 and the last column.
    UpRight,
    /// Towards the last column in the same row.
    Right,
}

impl Direction {
    /// Row and column step for one cell in this direction.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::UpLeft => (-1, -1),
            Direction::UpRight => (-1, 1),
            Direction::Right => (0, 1),
        }
    }
}

/// Walks `WIN_LENGTH` cells from `anchor` in `direction`, or `None` if the
/// run leaves a `width` x `height` board.
pub fn line_from(
    anchor: Coord,
    direction: Direction,
    width: usize,
    height: usize,
) -> Option<WinLine> {
    let (dr, dc) = direction.delta();
    let mut cells = [anchor; WIN_LENGTH];
    for (step, cell) in cells.iter_mut().enumerate() {
        let step = step as isize;
        let row = anchor.row as isize + dr * step;
        let col = anchor.col as isize + dc * step;
        if row < 0 || col < 0 || row >= height as isize || col >= width as isize {
            return None;
        }
        *cell = Coord::new(row as usize, col as usize);
    }
    Some(WinLine::new(cells))
}

/// Returns every line anchored at `anchor`, in [`Direction`] order.
pub fn anchored_lines(anchor: Coord, width: usize, height: usize) -> Vec<WinLine> {
    Direction::iter()
        .filter_map(|direction| line_from(anchor, direction, width, height))
        .collect()
}

/// Per-cell line tables for one board size.
///
/// `anchored` holds the lines attached to each cell; `crossing` holds every
/// line passing through each cell, which is what a move needs to inspect.
/// Both are indexed as `[row][col]`.
#[derive(Debug, Clone)]
pub struct LineTable {
    /// Lines anchored at each cell.
    pub anchored: Vec<Vec<Vec<WinLine>>>,
    /// Lines passing through each cell.
    pub crossing: Vec<Vec<Vec<WinLine>>>,
}

impl LineTable {
    /// Precomputes both tables for a `width` x `height` board.
    #[instrument]
    pub fn build(width: usize, height: usize) -> Self {
        let anchored: Vec<Vec<Vec<WinLine>>> = (0..height)
            .map(|row| {
                (0..width)
                    .map(|col| anchored_lines(Coord::new(row, col), width, height))
                    .collect()
            })
            .collect();

        let mut crossing = vec![vec![Vec::new(); width]; height];
        for line in anchored.iter().flatten().flatten() {
            for cell in line.cells() {
                crossing[cell.row][cell.col].push(*line);
            }
        }

        Self { anchored, crossing }
    }

    /// Total number of distinct lines on the board.
    pub fn line_count(&self) -> usize {
        self.anchored.iter().flatten().map(Vec::len).sum()
    }
}
