//! Tie detection.

use crate::board::Board;
use tracing::instrument;

/// Checks whether no column can take another piece.
///
/// A full entry row with no completed line means the game is tied.
#[instrument(skip(board), fields(board_id = %board.id()))]
pub fn is_board_full(board: &Board) -> bool {
    board.is_entry_row_full()
}
