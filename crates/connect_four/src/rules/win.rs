//! Win detection over precomputed lines.

use crate::board::Board;
use crate::types::{Coord, WinLine};
use tracing::instrument;

/// Checks whether every cell of `line` holds the same piece.
pub fn is_complete(board: &Board, line: &WinLine) -> bool {
    let mut cells = line.cells().iter().map(|&coord| board.occupant(coord));
    match cells.next().flatten() {
        Some(first) => cells.all(|occupant| occupant == Some(first)),
        None => false,
    }
}

/// Fast path: looks only at lines through the just-moved cell.
///
/// Returns the first completed line owned by the piece at `last_move`.
#[instrument(skip(board))]
pub fn winning_line_through(board: &Board, last_move: Coord) -> Option<WinLine> {
    let cell = board.cell(last_move)?;
    cell.occupant()?;
    cell.crossing_lines()
        .iter()
        .find(|line| is_complete(board, line))
        .copied()
}

/// Full scan: checks the anchored lines of every placed cell.
///
/// Every line is anchored at one of its own members, so a completed line is
/// always found through its anchor once all four pieces are placed.
#[instrument(skip(board, placed), fields(placed = placed.len()))]
pub fn find_winning_line(board: &Board, placed: &[Coord]) -> Option<WinLine> {
    placed
        .iter()
        .filter_map(|&coord| board.cell(coord))
        .filter(|cell| cell.occupant().is_some())
        .flat_map(|cell| cell.win_lines().iter())
        .find(|line| is_complete(board, line))
        .copied()
}
