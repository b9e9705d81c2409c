//! Storage contract for games, boards, rosters, turns and players.
//!
//! The service only talks to storage through [`GameStore`]. [`MemoryStore`]
//! keeps everything in process; a durable backend implements the same trait.

mod error;
mod memory;
mod models;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use models::{GameFieldsUpdate, GameProgress, GameRecord, GameSummary, LoadedGame};

use async_trait::async_trait;
use connect_four::{Board, BoardId, GameId, Player, PlayerId, TurnRecord};

/// Occupant grid of a board, rows top to bottom.
pub type Occupants = Vec<Vec<Option<PlayerId>>>;

/// Async storage backend.
///
/// Every method is a single storage operation. A game operation that writes
/// several tables goes through [`GameStore::save_progress`], so a concurrent
/// [`GameStore::load_game`] never sees half of it.
#[async_trait]
pub trait GameStore: Send + Sync {
    // ── Games ────────────────────────────────────────────────

    /// Stores a new game and its board.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the game ID is already taken.
    async fn insert_game(&self, record: GameRecord, board: &Board) -> Result<(), StoreError>;

    /// Loads a game joined with its board, roster and turns.
    async fn load_game(&self, game_id: &GameId) -> Result<Option<LoadedGame>, StoreError>;

    /// Deletes a game with its board, roster and turns. Returns whether it
    /// existed.
    async fn delete_game(&self, game_id: &GameId) -> Result<bool, StoreError>;

    /// Lists every game, oldest first.
    async fn list_games(&self) -> Result<Vec<GameSummary>, StoreError>;

    /// Applies a partial update to a stored game.
    async fn save_game_fields(
        &self,
        game_id: &GameId,
        update: GameFieldsUpdate,
    ) -> Result<(), StoreError>;

    /// Applies board, turns, play order and game fields together.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if any part is rejected, in which case nothing
    /// is written.
    async fn save_progress(&self, game_id: &GameId, progress: GameProgress) -> Result<(), StoreError>;

    // ── Boards ───────────────────────────────────────────────

    /// Replaces a board's occupants.
    async fn save_board(&self, board_id: &BoardId, occupants: Occupants) -> Result<(), StoreError>;

    // ── Turns ────────────────────────────────────────────────

    /// Appends one turn to its game's ledger.
    async fn append_turn(&self, record: TurnRecord) -> Result<(), StoreError>;

    /// Turns of a game with a sequence ID greater than `sequence_id`.
    async fn load_turns_since(
        &self,
        game_id: &GameId,
        sequence_id: u64,
    ) -> Result<Vec<TurnRecord>, StoreError>;

    /// Drops every turn of a game.
    async fn clear_turns(&self, game_id: &GameId) -> Result<(), StoreError>;

    // ── Rosters ──────────────────────────────────────────────

    /// Adds players to a game's roster with no play order.
    async fn add_game_players(
        &self,
        game_id: &GameId,
        player_ids: &[PlayerId],
    ) -> Result<(), StoreError>;

    /// Removes a player from a game's roster. Returns whether it was there.
    async fn remove_game_player(
        &self,
        game_id: &GameId,
        player_id: &PlayerId,
    ) -> Result<bool, StoreError>;

    /// Stores the play order of every player in a game's roster.
    async fn save_play_order(
        &self,
        game_id: &GameId,
        orders: &[(PlayerId, Option<usize>)],
    ) -> Result<(), StoreError>;

    // ── Players ──────────────────────────────────────────────

    /// Stores a new player.
    async fn insert_player(&self, player: Player) -> Result<(), StoreError>;

    /// Loads a player.
    async fn load_player(&self, player_id: &PlayerId) -> Result<Option<Player>, StoreError>;

    /// Lists every player, by ID.
    async fn list_players(&self) -> Result<Vec<Player>, StoreError>;

    /// Deletes a player. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] while the player is on any game's roster.
    async fn delete_player(&self, player_id: &PlayerId) -> Result<bool, StoreError>;
}
