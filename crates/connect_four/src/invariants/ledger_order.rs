//! Ledger order invariant: the turn ledger replays the placed cells.

use super::Invariant;
use crate::Game;
use crate::ledger::TurnRecord;
use crate::types::Coord;

/// Invariant: turn locations equal the placed cells in order, and sequence
/// IDs strictly increase.
pub struct LedgerMatchesPlacedCells;

impl Invariant<Game> for LedgerMatchesPlacedCells {
    fn holds(game: &Game) -> bool {
        check(game.turns().all(), game.placed_cells())
    }

    fn description() -> &'static str {
        "Turn ledger lists the placed cells in order with increasing sequence IDs"
    }
}

pub(super) fn check(turns: &[TurnRecord], placed: &[Coord]) -> bool {
    let increasing = turns
        .windows(2)
        .all(|pair| pair[0].sequence_id() < pair[1].sequence_id());
    increasing
        && turns.len() == placed.len()
        && turns
            .iter()
            .zip(placed)
            .all(|(turn, coord)| turn.location() == coord)
}
