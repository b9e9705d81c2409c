//! Invariants of a single accepted move.
//!
//! These look only at what one drop changes: the landing cell, the ledger
//! tail and the state transition. They run after every move in debug builds,
//! so none of them scans the board.

use super::Invariant;
use crate::game::Game;
use crate::rules;
use crate::state::GameState;
use crate::types::{Coord, PlayerId};

/// A game right after a drop, with the counters taken just before it.
#[derive(Debug, Clone, Copy)]
pub struct MoveStep<'a> {
    /// Game after the drop.
    pub game: &'a Game,
    /// Player who dropped.
    pub mover: &'a PlayerId,
    /// Cell the piece landed in.
    pub location: Coord,
    /// Number of placed cells before the drop.
    pub placed_before: usize,
    /// Ledger high-water mark before the drop.
    pub sequence_before: u64,
}

/// The piece sits in its cell and is the newest placed cell.
pub struct MoveLandedOnBoard;

impl Invariant<MoveStep<'_>> for MoveLandedOnBoard {
    fn holds(step: &MoveStep<'_>) -> bool {
        let placed = step.game.placed_cells();
        step.game.board().occupant(step.location) == Some(step.mover)
            && placed.len() == step.placed_before + 1
            && placed.last() == Some(&step.location)
    }

    fn description() -> &'static str {
        "The dropped piece is on the board and is the last placed cell"
    }
}

/// The ledger gained exactly this move with a fresh sequence ID.
pub struct LedgerRecordsMove;

impl Invariant<MoveStep<'_>> for LedgerRecordsMove {
    fn holds(step: &MoveStep<'_>) -> bool {
        let turns = step.game.turns();
        let Some(last) = turns.all().last() else {
            return false;
        };
        turns.len() == step.game.placed_cells().len()
            && *last.sequence_id() > step.sequence_before
            && *last.sequence_id() == turns.last_sequence_id()
            && last.player_id() == step.mover
            && *last.location() == step.location
    }

    fn description() -> &'static str {
        "The ledger's newest record is the move just made"
    }
}

/// The state after the move agrees with the move.
///
/// A win must be a complete line through the landing cell owned by the
/// mover. A tie needs every cell filled, which under gravity is the same
/// as a full entry row. A game still in play has a turn holder.
pub struct TransitionConsistent;

impl Invariant<MoveStep<'_>> for TransitionConsistent {
    fn holds(step: &MoveStep<'_>) -> bool {
        let game = step.game;
        let capacity = game.board().width() * game.board().height();
        let filled = game.placed_cells().len() == capacity;

        match (game.state(), game.winning_line()) {
            (GameState::Won, Some(line)) => {
                line.contains(step.location)
                    && rules::is_complete(game.board(), line)
                    && game.board().occupant(line.anchor()) == Some(step.mover)
            }
            (GameState::Tied, None) => filled,
            (GameState::Started, None) => !filled && game.current_player().is_some(),
            _ => false,
        }
    }

    fn description() -> &'static str {
        "Game state after a move matches the move's outcome"
    }
}

/// Every invariant of one accepted move.
pub type MoveInvariants = (MoveLandedOnBoard, LedgerRecordsMove, TransitionConsistent);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invariants::InvariantSet;
    use crate::{Board, BoardId, GameId, Player};

    fn started_game(width: usize, height: usize) -> Game {
        let board = Board::new(BoardId::new("b"), width, height).expect("board");
        let mut game = Game::new(GameId::new("g"), board).with_seed(5);
        game.add_players([Player::human("a", "Ann"), Player::human("b", "Bo")])
            .expect("players");
        game.start(true).expect("start");
        game
    }

    fn step_after_drop(game: &mut Game, column: usize) -> (PlayerId, Coord, usize, u64) {
        let mover = game.current_player().cloned().expect("turn holder");
        let placed_before = game.placed_cells().len();
        let sequence_before = game.turns().last_sequence_id();
        let location = game.drop_piece(&mover, column).expect("drop");
        (mover, location, placed_before, sequence_before)
    }

    #[test]
    fn test_each_move_satisfies_step_invariants() {
        let mut game = started_game(7, 6);
        for column in [3, 3, 4, 2, 0] {
            let (mover, location, placed_before, sequence_before) =
                step_after_drop(&mut game, column);
            let step = MoveStep {
                game: &game,
                mover: &mover,
                location,
                placed_before,
                sequence_before,
            };
            assert!(MoveInvariants::check_all(&step).is_ok());
        }
    }

    #[test]
    fn test_winning_move_satisfies_step_invariants() {
        let mut game = started_game(7, 6);
        let mut last = None;
        for column in [0, 1, 0, 1, 0, 1, 0] {
            last = Some(step_after_drop(&mut game, column));
        }
        assert_eq!(game.state(), GameState::Won);

        let (mover, location, placed_before, sequence_before) = last.expect("a move");
        let step = MoveStep {
            game: &game,
            mover: &mover,
            location,
            placed_before,
            sequence_before,
        };
        assert!(MoveInvariants::check_all(&step).is_ok());
    }

    #[test]
    fn test_tying_move_satisfies_step_invariants() {
        let mut game = started_game(2, 2);
        let mut last = None;
        for column in [0, 1, 0, 1] {
            last = Some(step_after_drop(&mut game, column));
        }
        assert_eq!(game.state(), GameState::Tied);

        let (mover, location, placed_before, sequence_before) = last.expect("a move");
        let step = MoveStep {
            game: &game,
            mover: &mover,
            location,
            placed_before,
            sequence_before,
        };
        assert!(MoveInvariants::check_all(&step).is_ok());
    }

    #[test]
    fn test_step_with_wrong_mover_is_rejected() {
        let mut game = started_game(7, 6);
        let (mover, location, placed_before, sequence_before) = step_after_drop(&mut game, 3);
        let other = game
            .players()
            .iter()
            .map(|p| p.id().clone())
            .find(|id| *id != mover)
            .expect("second player");

        let step = MoveStep {
            game: &game,
            mover: &other,
            location,
            placed_before,
            sequence_before,
        };
        let Err(violations) = MoveInvariants::check_all(&step) else {
            panic!("wrong mover passed");
        };
        assert_eq!(violations.len(), 2);
        assert!(TransitionConsistent::holds(&step));
    }

    #[test]
    fn test_step_with_stale_counters_is_rejected() {
        let mut game = started_game(7, 6);
        let (mover, location, _, _) = step_after_drop(&mut game, 3);
        step_after_drop(&mut game, 4);

        let step = MoveStep {
            game: &game,
            mover: &mover,
            location,
            placed_before: 0,
            sequence_before: 0,
        };
        assert!(!MoveLandedOnBoard::holds(&step));
        assert!(!LedgerRecordsMove::holds(&step));
    }
}
