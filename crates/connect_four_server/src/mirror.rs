//! Client-side board mirror.
//!
//! A passive observer keeps a plain occupant grid in step with a game by
//! fetching only the turns it has not applied yet. It never evaluates win
//! lines; the winning line comes from the service.

use crate::error::ServiceError;
use crate::service::GameService;
use crate::store::GameStore;
use connect_four::{Coord, GameError, GameId, GameState, PlayerId, TurnRecord, WinLine};
use tracing::{debug, info, instrument, warn};

/// Local copy of a game's board, rebuilt from turn records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardMirror {
    game_id: GameId,
    grid: Vec<Vec<Option<PlayerId>>>,
    last_sequence_id: u64,
    applied: usize,
    state: GameState,
    winning_line: Option<WinLine>,
}

impl BoardMirror {
    /// Creates an empty mirror for a `width` x `height` board.
    pub fn new(game_id: GameId, width: usize, height: usize) -> Self {
        Self {
            game_id,
            grid: vec![vec![None; width]; height],
            last_sequence_id: 0,
            applied: 0,
            state: GameState::New,
            winning_line: None,
        }
    }

    /// Game being mirrored.
    pub fn game_id(&self) -> &GameId {
        &self.game_id
    }

    /// Highest sequence ID applied so far.
    pub fn last_sequence_id(&self) -> u64 {
        self.last_sequence_id
    }

    /// Lifecycle state seen at the last sync.
    pub fn state(&self) -> GameState {
        self.state
    }

    /// Winning line seen at the last sync.
    pub fn winning_line(&self) -> Option<&WinLine> {
        self.winning_line.as_ref()
    }

    /// Occupant of a cell.
    pub fn occupant(&self, coord: Coord) -> Option<&PlayerId> {
        self.grid
            .get(coord.row)
            .and_then(|row| row.get(coord.col))
            .and_then(Option::as_ref)
    }

    /// Checks whether a cell belongs to the winning line.
    pub fn is_highlighted(&self, coord: Coord) -> bool {
        self.winning_line.is_some_and(|line| line.contains(coord))
    }

    /// The occupant grid, rows top to bottom.
    pub fn grid(&self) -> &[Vec<Option<PlayerId>>] {
        &self.grid
    }

    /// Applies turns newer than the last applied one, by gravity.
    ///
    /// Older or repeated turns are skipped. Returns how many were applied.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvariantViolation`] if a turn does not land
    /// where it was recorded, which means the mirror has drifted.
    #[instrument(skip(self, turns), fields(game_id = %self.game_id, count = turns.len()))]
    pub fn apply(&mut self, turns: &[TurnRecord]) -> Result<usize, GameError> {
        let mut applied = 0;
        for turn in turns {
            if *turn.sequence_id() <= self.last_sequence_id {
                continue;
            }
            let location = *turn.location();
            let row = self.landing_row(location.col).ok_or_else(|| {
                GameError::invariant(format!("mirror column {} is full", location.col))
            })?;
            if row != location.row {
                warn!(%location, row, "Mirror drifted from recorded turn");
                return Err(GameError::invariant(format!(
                    "turn {} recorded at {location} but mirror lands on row {row}",
                    turn.sequence_id()
                )));
            }

            self.grid[row][location.col] = Some(turn.player_id().clone());
            self.last_sequence_id = *turn.sequence_id();
            self.applied += 1;
            applied += 1;
        }
        debug!(applied, last_sequence_id = self.last_sequence_id, "Turns applied");
        Ok(applied)
    }

    /// Brings the mirror up to date with the service.
    ///
    /// One read fetches the status together with the turns after the last
    /// applied one. If the game was restarted in the meantime those turns
    /// are the whole new game, so the grid is emptied and rebuilt from them.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the service fails or the mirror cannot
    /// follow the recorded turns.
    #[instrument(skip(self, service), fields(game_id = %self.game_id))]
    pub async fn sync<S: GameStore>(&mut self, service: &GameService<S>) -> Result<usize, ServiceError> {
        let poll = service.poll(&self.game_id, self.last_sequence_id).await?;
        let status = poll.status();

        let applied = if *status.turn_count() == self.applied + poll.turns().len() {
            self.apply(poll.turns())?
        } else {
            info!(
                mirrored = self.applied,
                recorded = status.turn_count(),
                "Game restarted, rebuilding mirror"
            );
            self.clear();
            let applied = self.apply(poll.turns())?;
            if self.applied != *status.turn_count() {
                return Err(GameError::invariant(format!(
                    "mirror holds {} turns but the game recorded {}",
                    self.applied,
                    status.turn_count()
                ))
                .into());
            }
            applied
        };

        self.state = *status.state();
        self.winning_line = *status.winning_line();
        Ok(applied)
    }

    fn landing_row(&self, column: usize) -> Option<usize> {
        (0..self.grid.len())
            .rev()
            .find(|&row| self.grid[row].get(column).is_some_and(Option::is_none))
    }

    fn clear(&mut self) {
        for cell in self.grid.iter_mut().flatten() {
            *cell = None;
        }
        self.applied = 0;
        self.winning_line = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn turn(sequence_id: u64, player: &str, row: usize, col: usize) -> TurnRecord {
        TurnRecord::new(
            sequence_id,
            GameId::new("g"),
            PlayerId::new(player),
            Coord::new(row, col),
            Utc::now(),
        )
    }

    #[test]
    fn test_applies_by_gravity() {
        let mut mirror = BoardMirror::new(GameId::new("g"), 4, 4);
        let applied = mirror
            .apply(&[turn(1, "a", 3, 2), turn(2, "b", 2, 2)])
            .expect("apply");
        assert_eq!(applied, 2);
        assert_eq!(mirror.occupant(Coord::new(3, 2)).map(PlayerId::as_str), Some("a"));
        assert_eq!(mirror.occupant(Coord::new(2, 2)).map(PlayerId::as_str), Some("b"));
        assert_eq!(mirror.last_sequence_id(), 2);
    }

    #[test]
    fn test_skips_already_applied_turns() {
        let mut mirror = BoardMirror::new(GameId::new("g"), 4, 4);
        mirror.apply(&[turn(1, "a", 3, 0)]).expect("apply");
        let applied = mirror
            .apply(&[turn(1, "a", 3, 0), turn(2, "b", 3, 1)])
            .expect("apply");
        assert_eq!(applied, 1);
    }

    #[test]
    fn test_drift_is_reported() {
        let mut mirror = BoardMirror::new(GameId::new("g"), 4, 4);
        let err = mirror.apply(&[turn(1, "a", 1, 0)]).expect_err("floating piece");
        assert!(matches!(err, GameError::InvariantViolation { .. }));
        assert_eq!(mirror.last_sequence_id(), 0);
    }
}
