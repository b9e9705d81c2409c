//! Stored records and update types.

use super::Occupants;
use chrono::{DateTime, Utc};
use connect_four::{
    Board, BoardId, GameId, GamePlayer, GameSnapshot, GameState, PlayerId, TurnRecord, WinLine,
};
use derive_getters::Getters;
use derive_new::new;
use derive_setters::Setters;
use serde::{Deserialize, Serialize};

/// Stored row of the games table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct GameRecord {
    id: GameId,
    board_id: BoardId,
    state: GameState,
    current_player: Option<PlayerId>,
    winning_line: Option<WinLine>,
    last_sequence_id: u64,
    created_at: DateTime<Utc>,
}

impl GameRecord {
    /// Captures the stored fields of a snapshot.
    pub fn from_snapshot(snapshot: &GameSnapshot) -> Self {
        Self::new(
            snapshot.id().clone(),
            snapshot.board().id().clone(),
            *snapshot.state(),
            snapshot.current_player().clone(),
            *snapshot.winning_line(),
            *snapshot.last_sequence_id(),
            *snapshot.created_at(),
        )
    }

    /// Applies the fields set in `update`.
    pub fn apply(&mut self, update: GameFieldsUpdate) {
        let GameFieldsUpdate {
            state,
            current_player,
            winning_line,
            last_sequence_id,
        } = update;
        if let Some(state) = state {
            self.state = state;
        }
        if let Some(current_player) = current_player {
            self.current_player = current_player;
        }
        if let Some(winning_line) = winning_line {
            self.winning_line = winning_line;
        }
        if let Some(last_sequence_id) = last_sequence_id {
            self.last_sequence_id = last_sequence_id;
        }
    }
}

/// Partial update of a stored game. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Setters)]
#[setters(strip_option)]
pub struct GameFieldsUpdate {
    /// New lifecycle state.
    pub state: Option<GameState>,
    /// New turn holder; `Some(None)` clears it.
    pub current_player: Option<Option<PlayerId>>,
    /// New winning line; `Some(None)` clears it.
    pub winning_line: Option<Option<WinLine>>,
    /// New ledger high-water mark.
    pub last_sequence_id: Option<u64>,
}

impl GameFieldsUpdate {
    /// Every mutable field, taken from a snapshot.
    pub fn from_snapshot(snapshot: &GameSnapshot) -> Self {
        Self::default()
            .state(*snapshot.state())
            .current_player(snapshot.current_player().clone())
            .winning_line(*snapshot.winning_line())
            .last_sequence_id(*snapshot.last_sequence_id())
    }

    /// Checks whether the update sets nothing.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Every write of one game operation, applied by the store as a unit.
///
/// Readers see the game either before or after the whole update.
#[derive(Debug, Clone, PartialEq, Eq, Setters)]
pub struct GameProgress {
    /// Board whose occupants are replaced.
    #[setters(skip)]
    pub board_id: BoardId,
    /// New occupants, rows top to bottom.
    #[setters(skip)]
    pub occupants: Occupants,
    /// Game fields to update.
    #[setters(skip)]
    pub fields: GameFieldsUpdate,
    /// Turns to append, in sequence order.
    #[setters(skip)]
    pub turns: Vec<TurnRecord>,
    /// Drop the stored turns before appending.
    #[setters(bool)]
    pub restart: bool,
    /// Play order for every roster entry.
    #[setters(strip_option)]
    pub play_order: Option<Vec<(PlayerId, Option<usize>)>>,
}

impl GameProgress {
    /// Board, game fields and the turns after `after_sequence`, taken from a
    /// snapshot.
    pub fn from_snapshot(snapshot: &GameSnapshot, after_sequence: u64) -> Self {
        Self {
            board_id: snapshot.board().id().clone(),
            occupants: snapshot.board().occupants(),
            fields: GameFieldsUpdate::from_snapshot(snapshot),
            turns: snapshot.turns_since(after_sequence).to_vec(),
            restart: false,
            play_order: None,
        }
    }
}

/// A game as loaded from the store, joined with its board, roster and turns.
#[derive(Debug, Clone, Getters, new)]
pub struct LoadedGame {
    record: GameRecord,
    board: Board,
    players: Vec<GamePlayer>,
    turns: Vec<TurnRecord>,
}

impl LoadedGame {
    /// Assembles the engine snapshot. Placed cells are the turn locations,
    /// since the ledger is cleared on every start.
    pub fn into_snapshot(self) -> GameSnapshot {
        let placed_cells = self.turns.iter().map(|turn| *turn.location()).collect();
        let record = self.record;
        GameSnapshot::new(
            record.id,
            self.board,
            record.state,
            self.players,
            record.current_player,
            placed_cells,
            record.winning_line,
            self.turns,
            record.last_sequence_id,
            record.created_at,
        )
    }
}

/// Listing entry for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct GameSummary {
    id: GameId,
    state: GameState,
    created_at: DateTime<Utc>,
    total_players: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record() -> GameRecord {
        GameRecord::new(
            GameId::new("g"),
            BoardId::new("b"),
            GameState::Started,
            Some(PlayerId::new("a")),
            None,
            4,
            Utc::now(),
        )
    }

    #[test]
    fn test_empty_update_changes_nothing() {
        let mut stored = record();
        let before = stored.clone();
        let update = GameFieldsUpdate::default();
        assert!(update.is_empty());
        stored.apply(update);
        assert_eq!(stored, before);
    }

    #[test]
    fn test_update_can_clear_current_player() {
        let mut stored = record();
        stored.apply(
            GameFieldsUpdate::default()
                .state(GameState::Tied)
                .current_player(None),
        );
        assert_eq!(*stored.state(), GameState::Tied);
        assert_eq!(*stored.current_player(), None);
        assert_eq!(*stored.last_sequence_id(), 4);
    }
}
