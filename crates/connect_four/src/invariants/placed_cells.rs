//! Placed cells match the board: every recorded cell is occupied and no
//! occupied cell is missing from the record.

use super::Invariant;
use crate::Game;
use crate::board::Board;
use crate::types::Coord;
use std::collections::HashSet;

/// Invariant: placed cells are exactly the occupied cells, without repeats.
pub struct PlacedCellsMatchBoard;

impl Invariant<Game> for PlacedCellsMatchBoard {
    fn holds(game: &Game) -> bool {
        check(game.board(), game.placed_cells())
    }

    fn description() -> &'static str {
        "Placed cells are exactly the occupied cells of the board"
    }
}

pub(super) fn check(board: &Board, placed: &[Coord]) -> bool {
    let mut seen = HashSet::with_capacity(placed.len());
    let all_occupied = placed
        .iter()
        .all(|coord| seen.insert(*coord) && board.occupant(*coord).is_some());
    all_occupied && placed.len() == board.occupied_count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoardId, PlayerId};

    fn board() -> Board {
        let mut board = Board::new(BoardId::new("b"), 4, 4).expect("board");
        board.place(3, 0, PlayerId::new("a")).expect("place");
        board.place(3, 1, PlayerId::new("b")).expect("place");
        board
    }

    #[test]
    fn test_matching_cells_hold() {
        assert!(check(&board(), &[Coord::new(3, 0), Coord::new(3, 1)]));
    }

    #[test]
    fn test_missing_cell_violates() {
        assert!(!check(&board(), &[Coord::new(3, 0)]));
    }

    #[test]
    fn test_repeated_cell_violates() {
        assert!(!check(&board(), &[Coord::new(3, 0), Coord::new(3, 0)]));
    }

    #[test]
    fn test_empty_cell_violates() {
        assert!(!check(&board(), &[Coord::new(3, 0), Coord::new(2, 0)]));
    }
}
