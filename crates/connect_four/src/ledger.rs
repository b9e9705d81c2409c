//! Append-only turn ledger.
//!
//! Records are immutable once appended and carry a per-game sequence ID
//! that only ever grows. Observers remember the last ID they applied and
//! ask for everything after it.

use crate::error::GameError;
use crate::types::{Coord, GameId, PlayerId};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// One applied move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct TurnRecord {
    /// Position in the game's ledger, starting at 1.
    sequence_id: u64,
    /// Game the move belongs to.
    game_id: GameId,
    /// Player who moved.
    player_id: PlayerId,
    /// Cell the piece landed in.
    location: Coord,
    /// When the move was applied.
    created_at: DateTime<Utc>,
}

/// Ordered log of one game's turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnLedger {
    game_id: GameId,
    records: Vec<TurnRecord>,
    last_sequence_id: u64,
}

impl TurnLedger {
    /// Creates an empty ledger for a game.
    pub fn new(game_id: GameId) -> Self {
        Self {
            game_id,
            records: Vec::new(),
            last_sequence_id: 0,
        }
    }

    /// Rebuilds a ledger from stored records.
    ///
    /// `last_sequence_id` keeps IDs from before a restart reserved even when
    /// the records themselves were cleared.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvariantViolation`] if records belong to another
    /// game, are out of order, or exceed `last_sequence_id`.
    pub fn restore(
        game_id: GameId,
        records: Vec<TurnRecord>,
        last_sequence_id: u64,
    ) -> Result<Self, GameError> {
        let mut previous = 0;
        for record in &records {
            if record.game_id != game_id {
                return Err(GameError::invariant(format!(
                    "turn {} belongs to game {}, not {}",
                    record.sequence_id, record.game_id, game_id
                )));
            }
            if record.sequence_id <= previous {
                return Err(GameError::invariant(format!(
                    "turn sequence {} does not follow {}",
                    record.sequence_id, previous
                )));
            }
            previous = record.sequence_id;
        }
        if previous > last_sequence_id {
            return Err(GameError::invariant(format!(
                "turn sequence {previous} exceeds ledger high-water mark {last_sequence_id}"
            )));
        }

        Ok(Self {
            game_id,
            records,
            last_sequence_id,
        })
    }

    /// Appends a move with the next sequence ID and returns the new record.
    #[instrument(skip(self), fields(game_id = %self.game_id))]
    pub fn append(&mut self, player_id: PlayerId, location: Coord) -> &TurnRecord {
        self.last_sequence_id += 1;
        let record = TurnRecord::new(
            self.last_sequence_id,
            self.game_id.clone(),
            player_id,
            location,
            Utc::now(),
        );
        debug!(sequence_id = record.sequence_id, "Turn recorded");
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    /// All records in ascending sequence order.
    pub fn all(&self) -> &[TurnRecord] {
        &self.records
    }

    /// Records with a sequence ID strictly greater than `sequence_id`.
    pub fn since(&self, sequence_id: u64) -> &[TurnRecord] {
        let start = self
            .records
            .partition_point(|record| record.sequence_id <= sequence_id);
        &self.records[start..]
    }

    /// Drops every record. Sequence IDs are not reused afterwards.
    #[instrument(skip(self), fields(game_id = %self.game_id))]
    pub fn clear(&mut self) {
        debug!(cleared = self.records.len(), "Turn ledger cleared");
        self.records.clear();
    }

    /// Highest sequence ID ever handed out, or 0 for a fresh ledger.
    pub fn last_sequence_id(&self) -> u64 {
        self.last_sequence_id
    }

    /// Game this ledger belongs to.
    pub fn game_id(&self) -> &GameId {
        &self.game_id
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Checks whether the ledger holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with(n: usize) -> TurnLedger {
        let mut ledger = TurnLedger::new(GameId::new("g"));
        for i in 0..n {
            ledger.append(PlayerId::new("p"), Coord::new(5, i));
        }
        ledger
    }

    #[test]
    fn test_sequence_ids_start_at_one() {
        let ledger = ledger_with(3);
        let ids: Vec<u64> = ledger.all().iter().map(|r| *r.sequence_id()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_since_returns_strictly_newer() {
        let ledger = ledger_with(5);
        let ids: Vec<u64> = ledger.since(2).iter().map(|r| *r.sequence_id()).collect();
        assert_eq!(ids, vec![3, 4, 5]);
        assert!(ledger.since(5).is_empty());
        assert_eq!(ledger.since(0).len(), 5);
    }

    #[test]
    fn test_clear_does_not_reuse_ids() {
        let mut ledger = ledger_with(2);
        ledger.clear();
        assert!(ledger.is_empty());
        let record = ledger.append(PlayerId::new("p"), Coord::new(5, 0));
        assert_eq!(*record.sequence_id(), 3);
    }

    #[test]
    fn test_restore_rejects_out_of_order() {
        let ledger = ledger_with(2);
        let mut records = ledger.all().to_vec();
        records.reverse();
        assert!(TurnLedger::restore(GameId::new("g"), records, 2).is_err());
    }

    #[test]
    fn test_restore_rejects_foreign_game() {
        let ledger = ledger_with(1);
        let records = ledger.all().to_vec();
        assert!(TurnLedger::restore(GameId::new("other"), records, 1).is_err());
    }
}
