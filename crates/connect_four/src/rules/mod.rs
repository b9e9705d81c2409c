//! Game-end rules.
//!
//! Pure functions over a board and its placed cells, separated from the
//! game so they can run on reconstructed boards as well as live games.

pub mod tie;
pub mod win;

pub use tie::is_board_full;
pub use win::{find_winning_line, is_complete, winning_line_through};

use crate::board::Board;
use crate::types::{Coord, PlayerId, WinLine};
use tracing::{debug, instrument};

/// Result of evaluating a board for game end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEnd {
    /// No win and at least one open column.
    InProgress,
    /// A line of four is complete.
    Won {
        /// The completed line, anchor first.
        line: WinLine,
        /// Owner of the line.
        winner: PlayerId,
    },
    /// Entry row is full with no completed line.
    Tied,
}

/// Full-scan evaluation over every placed cell.
///
/// Use for boards rebuilt from storage or replayed history, where the last
/// move alone does not tell where a line might be.
#[instrument(skip(board, placed), fields(placed = placed.len()))]
pub fn check_for_game_end(board: &Board, placed: &[Coord]) -> GameEnd {
    let outcome = conclude(board, find_winning_line(board, placed));
    debug!(?outcome, "Full-scan game end check");
    outcome
}

/// Fast-path evaluation after a single move at `last_move`.
///
/// Any line completed by this move passes through its cell, so nothing else
/// needs to be inspected.
#[instrument(skip(board))]
pub fn check_move(board: &Board, last_move: Coord) -> GameEnd {
    conclude(board, winning_line_through(board, last_move))
}

fn conclude(board: &Board, line: Option<WinLine>) -> GameEnd {
    if let Some((line, winner)) = line.and_then(|l| board.occupant(l.anchor()).map(|w| (l, w))) {
        return GameEnd::Won {
            line,
            winner: winner.clone(),
        };
    }
    if is_board_full(board) {
        GameEnd::Tied
    } else {
        GameEnd::InProgress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BoardId;

    #[test]
    fn test_fast_and_full_scan_agree_on_vertical_win() {
        let mut board = Board::new(BoardId::new("b"), 7, 6).expect("board");
        let placed: Vec<Coord> = (2..6).rev().map(|row| Coord::new(row, 0)).collect();
        for coord in &placed {
            board.place(coord.row, coord.col, PlayerId::new("a")).expect("place");
        }

        let fast = check_move(&board, Coord::new(2, 0));
        let full = check_for_game_end(&board, &placed);
        assert_eq!(fast, full);
        assert!(matches!(fast, GameEnd::Won { ref winner, .. } if winner.as_str() == "a"));
    }

    #[test]
    fn test_in_progress_when_columns_open() {
        let mut board = Board::new(BoardId::new("b"), 7, 6).expect("board");
        board.place(5, 3, PlayerId::new("a")).expect("place");
        assert_eq!(check_move(&board, Coord::new(5, 3)), GameEnd::InProgress);
    }
}
