//! Game service: the serialization boundary between callers and storage.
//!
//! Every mutating call on a game holds that game's lock from load to the
//! last write, including any AI turns the call triggers, and hands all of its
//! writes to the store in one [`GameStore::save_progress`] call. Reads take no
//! game lock: each one is a single [`GameStore::load_game`], so it sees a game
//! either before or after a whole operation. Calls on different games proceed
//! in parallel.

use crate::error::ServiceError;
use crate::store::{GameProgress, GameRecord, GameStore, GameSummary};
use connect_four::{
    Board, BoardId, Coord, EntityKind, Game, GameError, GameId, GameSnapshot, GameState,
    MoveSelector, Player, PlayerId, PlayerKind, RandomSelector, TurnRecord, WinLine,
};
use derive_getters::Getters;
use derive_new::new;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, instrument, warn};

/// Result of an accepted drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct MoveOutcome {
    /// Where the requested piece landed.
    location: Coord,
    /// State after the drop and any AI replies.
    state: GameState,
    /// Turns recorded by the call, the requested drop first.
    turns: Vec<TurnRecord>,
}

/// Lightweight view of a game's progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct GameStatus {
    /// Lifecycle state.
    state: GameState,
    /// Player holding the turn.
    current_player: Option<PlayerId>,
    /// Completed line of a won game.
    winning_line: Option<WinLine>,
    /// Turns recorded since the last start.
    turn_count: usize,
    /// Highest sequence ID handed out.
    last_sequence_id: u64,
}

impl GameStatus {
    fn of(game: &Game) -> Self {
        Self::new(
            game.state(),
            game.current_player().cloned(),
            game.winning_line().copied(),
            game.turns().len(),
            game.turns().last_sequence_id(),
        )
    }
}

/// Status and new turns of a game, read together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct GamePoll {
    /// Progress at the time of the read.
    status: GameStatus,
    /// Turns recorded after the requested sequence ID.
    turns: Vec<TurnRecord>,
}

/// Game service over a [`GameStore`].
pub struct GameService<S> {
    store: Arc<S>,
    locks: Arc<Mutex<HashMap<GameId, Arc<Mutex<()>>>>>,
    selector: Arc<dyn MoveSelector>,
    rng: Arc<Mutex<StdRng>>,
    next_id: Arc<AtomicU64>,
}

impl<S> Clone for GameService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            locks: Arc::clone(&self.locks),
            selector: Arc::clone(&self.selector),
            rng: Arc::clone(&self.rng),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

impl<S> std::fmt::Debug for GameService<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameService")
            .field("selector", &self.selector)
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl<S: GameStore> GameService<S> {
    /// Creates a service with entropy-seeded randomness and random AI play.
    #[instrument(skip(store))]
    pub fn new(store: S) -> Self {
        info!("Creating game service");
        Self {
            store: Arc::new(store),
            locks: Arc::new(Mutex::new(HashMap::new())),
            selector: Arc::new(RandomSelector),
            rng: Arc::new(Mutex::new(StdRng::from_entropy())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Seeds the service's random source for reproducible games.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Arc::new(Mutex::new(StdRng::seed_from_u64(seed)));
        self
    }

    /// Uses `selector` for AI turns.
    pub fn with_selector(mut self, selector: Arc<dyn MoveSelector>) -> Self {
        self.selector = selector;
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ─────────────────────────────────────────────────────────────
    //  Players
    // ─────────────────────────────────────────────────────────────

    /// Creates and stores a player.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] if the store rejects the player.
    #[instrument(skip(self, name, color), fields(name = %name.as_ref()))]
    pub async fn create_player(
        &self,
        name: impl AsRef<str>,
        color: Option<String>,
        kind: PlayerKind,
    ) -> Result<Player, ServiceError> {
        let id = PlayerId::new(format!("player-{}", self.next_id()));
        let mut player = match kind {
            PlayerKind::Human => Player::human(id, name.as_ref()),
            PlayerKind::Ai => Player::ai(id, name.as_ref()),
        };
        if let Some(color) = color {
            player = player.with_color(color);
        }
        self.store.insert_player(player.clone()).await?;
        info!(player_id = %player.id(), %kind, "Player created");
        Ok(player)
    }

    /// Loads a player.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NotFound`] for an unknown player.
    #[instrument(skip(self))]
    pub async fn get_player(&self, player_id: &PlayerId) -> Result<Player, ServiceError> {
        self.store
            .load_player(player_id)
            .await?
            .ok_or_else(|| GameError::not_found(EntityKind::Player, player_id).into())
    }

    /// Lists every stored player.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] if the store fails.
    #[instrument(skip(self))]
    pub async fn list_players(&self) -> Result<Vec<Player>, ServiceError> {
        Ok(self.store.list_players().await?)
    }

    /// Deletes a player that is on no roster.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NotFound`] for an unknown player and
    /// [`ServiceError::Store`] while the player is on a roster.
    #[instrument(skip(self))]
    pub async fn delete_player(&self, player_id: &PlayerId) -> Result<(), ServiceError> {
        if self.store.delete_player(player_id).await? {
            info!("Player deleted");
            Ok(())
        } else {
            Err(GameError::not_found(EntityKind::Player, player_id).into())
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  Games
    // ─────────────────────────────────────────────────────────────

    /// Creates a game in the `New` state on an empty board.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Board`] for zero dimensions.
    #[instrument(skip(self))]
    pub async fn create_game(&self, width: usize, height: usize) -> Result<GameSnapshot, ServiceError> {
        let n = self.next_id();
        let board = Board::new(BoardId::new(format!("board-{n}")), width, height)?;
        let game = Game::new(GameId::new(format!("game-{n}")), board);
        let snapshot = game.snapshot();

        self.store
            .insert_game(GameRecord::from_snapshot(&snapshot), game.board())
            .await?;
        info!(game_id = %game.id(), "Game created");
        Ok(snapshot)
    }

    /// Registers stored players in a game. Returns the new roster size.
    ///
    /// # Errors
    ///
    /// - [`GameError::NotFound`] for an unknown game or player.
    /// - [`GameError::PlayerAlreadyInGame`] for a duplicate.
    /// - [`GameError::InvalidGameState`] while the game is being played.
    #[instrument(skip(self, player_ids), fields(count = player_ids.len()))]
    pub async fn add_players(
        &self,
        game_id: &GameId,
        player_ids: &[PlayerId],
    ) -> Result<usize, ServiceError> {
        let _guard = self.lock_game(game_id).await;
        let mut game = self.load(game_id).await?;

        let mut players = Vec::with_capacity(player_ids.len());
        for player_id in player_ids {
            players.push(self.get_player(player_id).await?);
        }

        let total = game.add_players(players)?;
        self.store.add_game_players(game_id, player_ids).await?;
        Ok(total)
    }

    /// Removes a player from a game's roster. Returns the new roster size.
    ///
    /// # Errors
    ///
    /// - [`GameError::NotFound`] for an unknown game or a player not on the
    ///   roster.
    /// - [`GameError::InvalidGameState`] while the game is being played.
    #[instrument(skip(self))]
    pub async fn remove_player(
        &self,
        game_id: &GameId,
        player_id: &PlayerId,
    ) -> Result<usize, ServiceError> {
        let _guard = self.lock_game(game_id).await;
        let mut game = self.load(game_id).await?;

        let total = game.remove_player(player_id)?;
        self.store.remove_game_player(game_id, player_id).await?;
        Ok(total)
    }

    /// Starts or restarts a game, playing any opening AI turns.
    ///
    /// # Errors
    ///
    /// - [`GameError::NotFound`] for an unknown game.
    /// - [`GameError::TooFewPlayers`] with fewer than two players.
    #[instrument(skip(self))]
    pub async fn start(&self, game_id: &GameId) -> Result<GameSnapshot, ServiceError> {
        let _guard = self.lock_game(game_id).await;
        let mut game = self.load(game_id).await?;

        game.start(true)?;

        let orders: Vec<(PlayerId, Option<usize>)> = game
            .players()
            .iter()
            .map(|p| (p.id().clone(), *p.play_order()))
            .collect();
        let progress = GameProgress::from_snapshot(&game.snapshot(), 0)
            .restart()
            .play_order(orders);
        self.store.save_progress(game_id, progress).await?;

        info!(state = %game.state(), turns = game.turns().len(), "Game started");
        Ok(game.snapshot())
    }

    /// Drops a piece for `player_id`, then plays any AI turns that follow.
    ///
    /// # Errors
    ///
    /// - [`GameError::NotFound`] for an unknown game.
    /// - [`GameError::InvalidGameState`], [`GameError::NotCurrentPlayer`] or
    ///   [`GameError::InvalidPiecePlacement`] for a rejected drop, in which
    ///   case nothing is written.
    #[instrument(skip(self))]
    pub async fn drop_piece(
        &self,
        game_id: &GameId,
        player_id: &PlayerId,
        column: usize,
    ) -> Result<MoveOutcome, ServiceError> {
        let _guard = self.lock_game(game_id).await;
        let mut game = self.load(game_id).await?;
        let before = game.turns().last_sequence_id();

        let location = game.drop_piece(player_id, column).inspect_err(|err| {
            debug!(error = %err, "Drop rejected");
        })?;
        let progress = GameProgress::from_snapshot(&game.snapshot(), before);
        let turns = progress.turns.clone();
        self.store.save_progress(game_id, progress).await?;

        debug!(%location, state = %game.state(), recorded = turns.len(), "Drop applied");
        Ok(MoveOutcome::new(location, game.state(), turns))
    }

    /// Loads the full state of a game, turns included.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NotFound`] for an unknown game.
    #[instrument(skip(self))]
    pub async fn get_with_turns(&self, game_id: &GameId) -> Result<GameSnapshot, ServiceError> {
        Ok(self.read(game_id).await?.snapshot())
    }

    /// Progress of a game without its board or turns.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NotFound`] for an unknown game.
    #[instrument(skip(self))]
    pub async fn status(&self, game_id: &GameId) -> Result<GameStatus, ServiceError> {
        Ok(GameStatus::of(&self.read(game_id).await?))
    }

    /// Status and the turns after `sequence_id`, from one read.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NotFound`] for an unknown game.
    #[instrument(skip(self))]
    pub async fn poll(&self, game_id: &GameId, sequence_id: u64) -> Result<GamePoll, ServiceError> {
        let game = self.read(game_id).await?;
        let turns = game.turns().since(sequence_id).to_vec();
        Ok(GamePoll::new(GameStatus::of(&game), turns))
    }

    /// Turns of a game recorded after `sequence_id`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NotFound`] for an unknown game.
    #[instrument(skip(self))]
    pub async fn turns_since(
        &self,
        game_id: &GameId,
        sequence_id: u64,
    ) -> Result<Vec<TurnRecord>, ServiceError> {
        let game = self.read(game_id).await?;
        Ok(game.turns().since(sequence_id).to_vec())
    }

    /// Lists every game.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] if the store fails.
    #[instrument(skip(self))]
    pub async fn list_games(&self) -> Result<Vec<GameSummary>, ServiceError> {
        Ok(self.store.list_games().await?)
    }

    /// Deletes a game with its board, roster and turns.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NotFound`] for an unknown game.
    #[instrument(skip(self))]
    pub async fn delete_game(&self, game_id: &GameId) -> Result<(), ServiceError> {
        let _guard = self.lock_game(game_id).await;
        if self.store.delete_game(game_id).await? {
            info!("Game deleted");
            Ok(())
        } else {
            warn!("Delete of unknown game");
            Err(GameError::not_found(EntityKind::Game, game_id).into())
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  Internals
    // ─────────────────────────────────────────────────────────────

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Locks a game. Registry entries nobody holds or waits on are dropped
    /// on the way, so the registry only tracks games in use.
    async fn lock_game(&self, game_id: &GameId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(game_id.clone()).or_default())
        };
        lock.lock_owned().await
    }

    async fn read(&self, game_id: &GameId) -> Result<Game, ServiceError> {
        let loaded = self
            .store
            .load_game(game_id)
            .await?
            .ok_or_else(|| GameError::not_found(EntityKind::Game, game_id))?;
        Ok(Game::from_snapshot(loaded.into_snapshot())?)
    }

    async fn load(&self, game_id: &GameId) -> Result<Game, ServiceError> {
        let seed: u64 = self.rng.lock().await.r#gen();
        Ok(self
            .read(game_id)
            .await?
            .with_seed(seed)
            .with_selector(Arc::clone(&self.selector)))
    }
}
