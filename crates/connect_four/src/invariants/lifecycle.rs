//! Lifecycle invariant: the state agrees with the board and roster.

use super::Invariant;
use crate::Game;
use crate::board::Board;
use crate::player::GamePlayer;
use crate::rules;
use crate::state::GameState;
use crate::types::{Coord, PlayerId, WinLine};

/// Invariant: the lifecycle state is backed by the data.
///
/// - `New` has no pieces on the board.
/// - `Started` has a contiguous play order, a registered turn holder (once
///   one is assigned) and no completed line.
/// - `Won` has a complete winning line.
/// - `Tied` has a full entry row and no winning line.
pub struct LifecycleConsistent;

impl Invariant<Game> for LifecycleConsistent {
    fn holds(game: &Game) -> bool {
        check(
            game.state(),
            game.board(),
            game.players(),
            game.current_player(),
            game.winning_line(),
            game.placed_cells(),
        )
    }

    fn description() -> &'static str {
        "Lifecycle state is consistent with the board, roster and winning line"
    }
}

pub(super) fn check(
    state: GameState,
    board: &Board,
    players: &[GamePlayer],
    current: Option<&PlayerId>,
    winning_line: Option<&WinLine>,
    placed: &[Coord],
) -> bool {
    match state {
        GameState::New => current.is_none() && placed.is_empty() && winning_line.is_none(),
        GameState::Started => {
            let holder_registered =
                current.is_none_or(|id| players.iter().any(|p| p.id() == id));
            winning_line.is_none()
                && holder_registered
                && contiguous_play_order(players)
                && rules::find_winning_line(board, placed).is_none()
        }
        GameState::Won => winning_line.is_some_and(|line| rules::is_complete(board, line)),
        GameState::Tied => winning_line.is_none() && rules::is_board_full(board),
    }
}

fn contiguous_play_order(players: &[GamePlayer]) -> bool {
    let mut orders: Vec<Option<usize>> = players.iter().map(|p| *p.play_order()).collect();
    orders.sort();
    orders
        .iter()
        .enumerate()
        .all(|(index, order)| *order == Some(index))
}
