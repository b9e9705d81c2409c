//! Serializable game state.

use crate::board::Board;
use crate::ledger::TurnRecord;
use crate::player::GamePlayer;
use crate::state::GameState;
use crate::types::{Coord, GameId, PlayerId, WinLine};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};

/// Everything needed to rebuild a [`Game`](crate::Game), plus its turns.
///
/// The board serializes occupants only; win lines are recomputed from the
/// dimensions on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct GameSnapshot {
    pub(crate) id: GameId,
    pub(crate) board: Board,
    pub(crate) state: GameState,
    pub(crate) players: Vec<GamePlayer>,
    pub(crate) current_player: Option<PlayerId>,
    pub(crate) placed_cells: Vec<Coord>,
    pub(crate) winning_line: Option<WinLine>,
    pub(crate) turns: Vec<TurnRecord>,
    pub(crate) last_sequence_id: u64,
    pub(crate) created_at: DateTime<Utc>,
}

impl GameSnapshot {
    /// Turns with a sequence ID greater than `sequence_id`.
    pub fn turns_since(&self, sequence_id: u64) -> &[TurnRecord] {
        let start = self
            .turns
            .partition_point(|turn| *turn.sequence_id() <= sequence_id);
        &self.turns[start..]
    }

    /// Owner of the winning line, if the game is won.
    pub fn winner(&self) -> Option<&PlayerId> {
        self.winning_line
            .and_then(|line| self.board.occupant(line.anchor()))
    }
}
