//! In-process store.

use super::{
    GameFieldsUpdate, GameProgress, GameRecord, GameStore, GameSummary, LoadedGame, Occupants,
    StoreError,
};
use async_trait::async_trait;
use connect_four::{Board, BoardId, GameId, GamePlayer, Player, PlayerId, TurnRecord};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// Roster entry: player and play order.
type RosterEntry = (PlayerId, Option<usize>);

#[derive(Debug, Default)]
struct Tables {
    games: HashMap<GameId, GameRecord>,
    boards: HashMap<BoardId, Occupants>,
    rosters: HashMap<GameId, Vec<RosterEntry>>,
    turns: HashMap<GameId, Vec<TurnRecord>>,
    players: BTreeMap<PlayerId, Player>,
}

impl Tables {
    fn game_mut(&mut self, game_id: &GameId) -> Result<&mut GameRecord, StoreError> {
        self.games
            .get_mut(game_id)
            .ok_or_else(|| StoreError::new(format!("Game '{}' is not stored", game_id)))
    }

    fn roster_mut(&mut self, game_id: &GameId) -> Result<&mut Vec<RosterEntry>, StoreError> {
        self.rosters
            .get_mut(game_id)
            .ok_or_else(|| StoreError::new(format!("Game '{}' has no roster", game_id)))
    }
}

fn same_shape(stored: &Occupants, occupants: &Occupants) -> bool {
    stored.len() == occupants.len() && stored.iter().zip(occupants).all(|(a, b)| a.len() == b.len())
}

/// Checks that `turns` belong to `game_id` and continue after `last`.
fn check_turns(game_id: &GameId, last: Option<u64>, turns: &[TurnRecord]) -> Result<(), StoreError> {
    let mut previous = last;
    for turn in turns {
        if turn.game_id() != game_id {
            return Err(StoreError::new(format!(
                "Turn {} belongs to game '{}', not '{}'",
                turn.sequence_id(),
                turn.game_id(),
                game_id
            )));
        }
        if let Some(previous) = previous.filter(|previous| previous >= turn.sequence_id()) {
            return Err(StoreError::new(format!(
                "Turn {} does not follow turn {}",
                turn.sequence_id(),
                previous
            )));
        }
        previous = Some(*turn.sequence_id());
    }
    Ok(())
}

/// Store keeping every table in memory behind one lock.
///
/// Cloning yields another handle to the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating in-memory store");
        Self::default()
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    #[instrument(skip(self, record, board), fields(game_id = %record.id()))]
    async fn insert_game(&self, record: GameRecord, board: &Board) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.games.contains_key(record.id()) {
            warn!("Game already stored");
            return Err(StoreError::new(format!(
                "Game '{}' already exists",
                record.id()
            )));
        }
        if tables.boards.contains_key(board.id()) {
            warn!(board_id = %board.id(), "Board already stored");
            return Err(StoreError::new(format!(
                "Board '{}' already exists",
                board.id()
            )));
        }

        tables.boards.insert(board.id().clone(), board.occupants());
        tables.rosters.insert(record.id().clone(), Vec::new());
        tables.turns.insert(record.id().clone(), Vec::new());
        tables.games.insert(record.id().clone(), record);
        debug!("Game stored");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn load_game(&self, game_id: &GameId) -> Result<Option<LoadedGame>, StoreError> {
        let tables = self.tables.read().await;
        let Some(record) = tables.games.get(game_id) else {
            debug!("Game not found");
            return Ok(None);
        };

        let occupants = tables.boards.get(record.board_id()).cloned().ok_or_else(|| {
            StoreError::new(format!(
                "Board '{}' of game '{}' is missing",
                record.board_id(),
                game_id
            ))
        })?;
        let board = Board::from_occupants(record.board_id().clone(), occupants)?;

        let players = tables
            .rosters
            .get(game_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|(player_id, order)| {
                tables
                    .players
                    .get(player_id)
                    .cloned()
                    .map(|player| GamePlayer::new(player, *order))
                    .ok_or_else(|| {
                        StoreError::new(format!(
                            "Roster of game '{}' references missing player '{}'",
                            game_id, player_id
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let turns = tables.turns.get(game_id).cloned().unwrap_or_default();

        debug!(players = players.len(), turns = turns.len(), "Game loaded");
        Ok(Some(LoadedGame::new(record.clone(), board, players, turns)))
    }

    #[instrument(skip(self))]
    async fn delete_game(&self, game_id: &GameId) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(record) = tables.games.remove(game_id) else {
            return Ok(false);
        };
        tables.boards.remove(record.board_id());
        tables.rosters.remove(game_id);
        tables.turns.remove(game_id);
        info!("Game deleted");
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn list_games(&self) -> Result<Vec<GameSummary>, StoreError> {
        let tables = self.tables.read().await;
        let mut summaries: Vec<GameSummary> = tables
            .games
            .values()
            .map(|record| {
                let total_players = tables.rosters.get(record.id()).map_or(0, Vec::len);
                GameSummary::new(
                    record.id().clone(),
                    *record.state(),
                    *record.created_at(),
                    total_players,
                )
            })
            .collect();
        summaries.sort_by(|a, b| (a.created_at(), a.id()).cmp(&(b.created_at(), b.id())));
        debug!(count = summaries.len(), "Games listed");
        Ok(summaries)
    }

    #[instrument(skip(self, update))]
    async fn save_game_fields(
        &self,
        game_id: &GameId,
        update: GameFieldsUpdate,
    ) -> Result<(), StoreError> {
        if update.is_empty() {
            return Ok(());
        }
        let mut tables = self.tables.write().await;
        tables.game_mut(game_id)?.apply(update);
        Ok(())
    }

    #[instrument(
        skip(self, progress),
        fields(turns = progress.turns.len(), restart = progress.restart)
    )]
    async fn save_progress(&self, game_id: &GameId, progress: GameProgress) -> Result<(), StoreError> {
        let GameProgress {
            board_id,
            occupants,
            fields,
            turns,
            restart,
            play_order,
        } = progress;
        let mut tables = self.tables.write().await;

        let record = tables
            .games
            .get(game_id)
            .ok_or_else(|| StoreError::new(format!("Game '{}' is not stored", game_id)))?;
        if record.board_id() != &board_id {
            return Err(StoreError::new(format!(
                "Board '{}' does not belong to game '{}'",
                board_id, game_id
            )));
        }
        let stored = tables
            .boards
            .get(&board_id)
            .ok_or_else(|| StoreError::new(format!("Board '{}' is not stored", board_id)))?;
        if !same_shape(stored, &occupants) {
            return Err(StoreError::new(format!(
                "Board '{}' cannot change dimensions",
                board_id
            )));
        }
        let last = match (restart, tables.turns.get(game_id)) {
            (_, None) => {
                return Err(StoreError::new(format!("Game '{}' has no turns table", game_id)));
            }
            (true, Some(_)) => None,
            (false, Some(stored)) => stored.last().map(|turn| *turn.sequence_id()),
        };
        check_turns(game_id, last, &turns)?;
        if let Some(orders) = &play_order {
            let roster = tables
                .rosters
                .get(game_id)
                .ok_or_else(|| StoreError::new(format!("Game '{}' has no roster", game_id)))?;
            if let Some((missing, _)) = orders
                .iter()
                .find(|(player_id, _)| !roster.iter().any(|(id, _)| id == player_id))
            {
                return Err(StoreError::new(format!(
                    "Player '{}' is not on the roster of game '{}'",
                    missing, game_id
                )));
            }
        }

        tables.boards.insert(board_id, occupants);
        if let Some(stored) = tables.turns.get_mut(game_id) {
            if restart {
                stored.clear();
            }
            stored.extend(turns);
        }
        if let Some(orders) = play_order {
            let roster = tables.roster_mut(game_id)?;
            for (player_id, order) in orders {
                if let Some(entry) = roster.iter_mut().find(|(id, _)| *id == player_id) {
                    entry.1 = order;
                }
            }
        }
        tables.game_mut(game_id)?.apply(fields);
        debug!("Progress saved");
        Ok(())
    }

    #[instrument(skip(self, occupants))]
    async fn save_board(&self, board_id: &BoardId, occupants: Occupants) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .boards
            .get_mut(board_id)
            .ok_or_else(|| StoreError::new(format!("Board '{}' is not stored", board_id)))?;

        if !same_shape(stored, &occupants) {
            return Err(StoreError::new(format!(
                "Board '{}' cannot change dimensions",
                board_id
            )));
        }
        *stored = occupants;
        Ok(())
    }

    #[instrument(skip(self, record), fields(game_id = %record.game_id(), sequence_id = record.sequence_id()))]
    async fn append_turn(&self, record: TurnRecord) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let turns = tables
            .turns
            .get_mut(record.game_id())
            .ok_or_else(|| StoreError::new(format!("Game '{}' is not stored", record.game_id())))?;

        check_turns(
            record.game_id(),
            turns.last().map(|turn| *turn.sequence_id()),
            std::slice::from_ref(&record),
        )?;
        turns.push(record);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn load_turns_since(
        &self,
        game_id: &GameId,
        sequence_id: u64,
    ) -> Result<Vec<TurnRecord>, StoreError> {
        let tables = self.tables.read().await;
        let turns = tables
            .turns
            .get(game_id)
            .ok_or_else(|| StoreError::new(format!("Game '{}' is not stored", game_id)))?;
        let start = turns.partition_point(|turn| *turn.sequence_id() <= sequence_id);
        Ok(turns[start..].to_vec())
    }

    #[instrument(skip(self))]
    async fn clear_turns(&self, game_id: &GameId) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let turns = tables
            .turns
            .get_mut(game_id)
            .ok_or_else(|| StoreError::new(format!("Game '{}' is not stored", game_id)))?;
        debug!(cleared = turns.len(), "Turns cleared");
        turns.clear();
        Ok(())
    }

    #[instrument(skip(self, player_ids), fields(count = player_ids.len()))]
    async fn add_game_players(
        &self,
        game_id: &GameId,
        player_ids: &[PlayerId],
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(missing) = player_ids.iter().find(|id| !tables.players.contains_key(*id)) {
            return Err(StoreError::new(format!("Player '{}' is not stored", missing)));
        }
        let roster = tables.roster_mut(game_id)?;
        if let Some(duplicate) = player_ids
            .iter()
            .find(|id| roster.iter().any(|(existing, _)| existing == *id))
        {
            return Err(StoreError::new(format!(
                "Player '{}' is already on the roster of game '{}'",
                duplicate, game_id
            )));
        }
        roster.extend(player_ids.iter().map(|id| (id.clone(), None)));
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_game_player(
        &self,
        game_id: &GameId,
        player_id: &PlayerId,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let roster = tables.roster_mut(game_id)?;
        let before = roster.len();
        roster.retain(|(id, _)| id != player_id);
        Ok(roster.len() < before)
    }

    #[instrument(skip(self, orders), fields(count = orders.len()))]
    async fn save_play_order(
        &self,
        game_id: &GameId,
        orders: &[(PlayerId, Option<usize>)],
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let roster = tables.roster_mut(game_id)?;
        for (player_id, order) in orders {
            let entry = roster
                .iter_mut()
                .find(|(id, _)| id == player_id)
                .ok_or_else(|| {
                    StoreError::new(format!(
                        "Player '{}' is not on the roster of game '{}'",
                        player_id, game_id
                    ))
                })?;
            entry.1 = *order;
        }
        Ok(())
    }

    #[instrument(skip(self, player), fields(player_id = %player.id()))]
    async fn insert_player(&self, player: Player) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.players.contains_key(player.id()) {
            warn!("Player already stored");
            return Err(StoreError::new(format!(
                "Player '{}' already exists",
                player.id()
            )));
        }
        tables.players.insert(player.id().clone(), player);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn load_player(&self, player_id: &PlayerId) -> Result<Option<Player>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.players.get(player_id).cloned())
    }

    #[instrument(skip(self))]
    async fn list_players(&self) -> Result<Vec<Player>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.players.values().cloned().collect())
    }

    #[instrument(skip(self))]
    async fn delete_player(&self, player_id: &PlayerId) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let on_roster = tables
            .rosters
            .iter()
            .find(|(_, roster)| roster.iter().any(|(id, _)| id == player_id));
        if let Some((game_id, _)) = on_roster {
            return Err(StoreError::new(format!(
                "Player '{}' is on the roster of game '{}'",
                player_id, game_id
            )));
        }
        Ok(tables.players.remove(player_id).is_some())
    }
}
