//! Game state machine.
//!
//! A [`Game`] owns its board, roster, turn ledger and lifecycle state.
//! [`Game::drop_piece`] is the single mutating entry point for a started
//! game: it validates the request, applies the move, records it, checks for
//! a win or tie and hands the turn on. AI players are played inline until a
//! human holds the turn or the game ends.

use crate::board::Board;
use crate::error::{EntityKind, GameError};
use crate::invariants::{GameInvariants, InvariantSet};
#[cfg(debug_assertions)]
use crate::invariants::{MoveInvariants, MoveStep};
use crate::ledger::{TurnLedger, TurnRecord};
use crate::player::{GamePlayer, Player};
use crate::rules::{self, GameEnd};
use crate::selector::{MoveSelector, RandomSelector};
use crate::snapshot::GameSnapshot;
use crate::state::GameState;
use crate::types::{Coord, GameId, PlayerId, WinLine};
use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Minimum roster size for starting a game.
pub const MIN_PLAYERS: usize = 2;

/// Piece symbols used by [`Game::render`], by roster position.
const PIECE_SYMBOLS: [char; 8] = ['X', 'O', '#', '@', '%', '&', '+', '*'];

/// A connect-four game.
#[derive(Debug, Clone)]
pub struct Game {
    id: GameId,
    board: Board,
    state: GameState,
    players: Vec<GamePlayer>,
    current_player: Option<PlayerId>,
    placed_cells: Vec<Coord>,
    winning_line: Option<WinLine>,
    turns: TurnLedger,
    created_at: DateTime<Utc>,
    rng: StdRng,
    selector: Arc<dyn MoveSelector>,
}

// ─────────────────────────────────────────────────────────────
//  Construction
// ─────────────────────────────────────────────────────────────

impl Game {
    /// Creates a game in the `New` state on an emptied `board`.
    ///
    /// Randomness comes from OS entropy and AI players pick columns with
    /// [`RandomSelector`]; see [`Game::with_seed`] and
    /// [`Game::with_selector`] to change either.
    #[instrument(skip(board), fields(board_id = %board.id()))]
    pub fn new(id: GameId, mut board: Board) -> Self {
        board.reset();
        info!(
            game_id = %id,
            width = board.width(),
            height = board.height(),
            "Creating new game"
        );
        Self {
            turns: TurnLedger::new(id.clone()),
            id,
            board,
            state: GameState::New,
            players: Vec::new(),
            current_player: None,
            placed_cells: Vec::new(),
            winning_line: None,
            created_at: Utc::now(),
            rng: StdRng::from_entropy(),
            selector: Arc::new(RandomSelector),
        }
    }

    /// Uses a deterministic random source seeded with `seed`.
    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(StdRng::seed_from_u64(seed))
    }

    /// Uses the given random source for play order and AI moves.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Uses `selector` to pick AI columns.
    pub fn with_selector(mut self, selector: Arc<dyn MoveSelector>) -> Self {
        self.selector = selector;
        self
    }

    /// Rebuilds a game from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvariantViolation`] if the snapshot is not a
    /// state the engine could have produced.
    #[instrument(skip(snapshot), fields(game_id = %snapshot.id))]
    pub fn from_snapshot(snapshot: GameSnapshot) -> Result<Self, GameError> {
        let GameSnapshot {
            id,
            board,
            state,
            players,
            current_player,
            placed_cells,
            winning_line,
            turns,
            last_sequence_id,
            created_at,
        } = snapshot;

        let turns = TurnLedger::restore(id.clone(), turns, last_sequence_id)?;
        let game = Self {
            id,
            board,
            state,
            players,
            current_player,
            placed_cells,
            winning_line,
            turns,
            created_at,
            rng: StdRng::from_entropy(),
            selector: Arc::new(RandomSelector),
        };
        game.verify_invariants()?;
        debug!(state = %game.state, turns = game.turns.len(), "Game restored");
        Ok(game)
    }

    /// Reconstructs a game from its roster and turn history.
    ///
    /// Each turn is re-dropped by gravity on an emptied `board`, then the
    /// outcome is derived with a full scan. AI players are not triggered; the
    /// turn is handed to whoever follows the last mover.
    ///
    /// A roster with no play order and no turns yields a `New` game.
    ///
    /// # Errors
    ///
    /// Returns [`GameError`] if the roster or history is inconsistent: turns
    /// by unknown players, pieces that would not land where recorded, moves
    /// after the game ended, or a broken play order.
    #[instrument(skip(board, players, turns), fields(game_id = %id, turns = turns.len()))]
    pub fn replay(
        id: GameId,
        board: Board,
        players: Vec<GamePlayer>,
        turns: Vec<TurnRecord>,
    ) -> Result<Self, GameError> {
        let mut game = Self::new(id, board);
        game.players = players;

        if turns.is_empty() && game.players.iter().all(|p| p.play_order().is_none()) {
            return Ok(game);
        }
        game.check_play_order()?;
        game.state = GameState::Started;

        for record in &turns {
            if game.state != GameState::Started {
                return Err(GameError::invariant(format!(
                    "turn {} recorded after the game ended",
                    record.sequence_id()
                )));
            }
            if !game.has_player(record.player_id()) {
                return Err(GameError::not_found(EntityKind::Player, record.player_id()));
            }
            let location = *record.location();
            let row = game
                .board
                .resolve_drop_row(location.col)
                .map_err(|source| GameError::InvalidPiecePlacement { source })?;
            if row != location.row {
                return Err(GameError::invariant(format!(
                    "turn {} recorded at {location} but lands on row {row}",
                    record.sequence_id()
                )));
            }
            game.board
                .place(row, location.col, record.player_id().clone())
                .map_err(|source| GameError::InvalidPiecePlacement { source })?;
            game.placed_cells.push(location);
            game.current_player = Some(record.player_id().clone());

            if let GameEnd::Won { winner, .. } = game.check_for_game_end() {
                if &winner != record.player_id() {
                    return Err(GameError::invariant(format!(
                        "turn {} completed a line for {winner}",
                        record.sequence_id()
                    )));
                }
            }
        }

        let last_sequence_id = turns.last().map(|t| *t.sequence_id()).unwrap_or(0);
        game.turns = TurnLedger::restore(game.id.clone(), turns, last_sequence_id)?;

        if game.state == GameState::Started {
            let next = game.next_player()?.id().clone();
            game.current_player = Some(next);
        }

        game.verify_invariants()?;
        info!(state = %game.state, "Game replayed");
        Ok(game)
    }
}

// ─────────────────────────────────────────────────────────────
//  Accessors
// ─────────────────────────────────────────────────────────────

impl Game {
    /// Returns the game ID.
    pub fn id(&self) -> &GameId {
        &self.id
    }

    /// Returns the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> GameState {
        self.state
    }

    /// Returns the roster in registration order.
    pub fn players(&self) -> &[GamePlayer] {
        &self.players
    }

    /// Looks up a registered player.
    pub fn player(&self, id: &PlayerId) -> Option<&GamePlayer> {
        self.players.iter().find(|p| p.id() == id)
    }

    /// Player holding the turn, if any.
    pub fn current_player(&self) -> Option<&PlayerId> {
        self.current_player.as_ref()
    }

    /// Cells filled since the last start, in move order.
    pub fn placed_cells(&self) -> &[Coord] {
        &self.placed_cells
    }

    /// The completed line of a won game.
    pub fn winning_line(&self) -> Option<&WinLine> {
        self.winning_line.as_ref()
    }

    /// Owner of the winning line.
    pub fn winner(&self) -> Option<&PlayerId> {
        self.winning_line
            .and_then(|line| self.board.occupant(line.anchor()))
    }

    /// The turn ledger.
    pub fn turns(&self) -> &TurnLedger {
        &self.turns
    }

    /// When the game was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Captures the full state for storage or transport.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot::new(
            self.id.clone(),
            self.board.clone(),
            self.state,
            self.players.clone(),
            self.current_player.clone(),
            self.placed_cells.clone(),
            self.winning_line,
            self.turns.all().to_vec(),
            self.turns.last_sequence_id(),
            self.created_at,
        )
    }

    /// Piece symbol for a player, by roster position.
    pub fn symbol_for(&self, id: &PlayerId) -> char {
        self.players
            .iter()
            .position(|p| p.id() == id)
            .and_then(|index| PIECE_SYMBOLS.get(index))
            .copied()
            .unwrap_or('?')
    }

    /// Formats the board as text with one symbol per player.
    pub fn render(&self) -> String {
        self.board.render(|id| self.symbol_for(id))
    }
}

// ─────────────────────────────────────────────────────────────
//  Roster
// ─────────────────────────────────────────────────────────────

impl Game {
    /// Registers players. Either all of them are added or none are.
    ///
    /// Returns the new roster size.
    ///
    /// # Errors
    ///
    /// - [`GameError::InvalidGameState`] while the game is being played.
    /// - [`GameError::PlayerAlreadyInGame`] if any player is already on the
    ///   roster or listed twice.
    #[instrument(skip(self, players), fields(game_id = %self.id))]
    pub fn add_players(
        &mut self,
        players: impl IntoIterator<Item = Player>,
    ) -> Result<usize, GameError> {
        self.require_not_started("add players")?;

        let players: Vec<Player> = players.into_iter().collect();
        for (index, player) in players.iter().enumerate() {
            let repeated = players[..index].iter().any(|p| p.id() == player.id());
            if repeated || self.has_player(player.id()) {
                warn!(player_id = %player.id(), "Player already in game");
                return Err(GameError::PlayerAlreadyInGame {
                    game_id: self.id.clone(),
                    player_id: player.id().clone(),
                });
            }
        }

        for player in players {
            debug!(player_id = %player.id(), ai = player.is_ai(), "Registering player");
            self.players.push(GamePlayer::unordered(player));
        }

        info!(total = self.players.len(), "Players added");
        Ok(self.players.len())
    }

    /// Removes a player from the roster and returns the new roster size.
    ///
    /// # Errors
    ///
    /// - [`GameError::InvalidGameState`] while the game is being played.
    /// - [`GameError::NotFound`] if the player is not registered.
    #[instrument(skip(self), fields(game_id = %self.id))]
    pub fn remove_player(&mut self, player_id: &PlayerId) -> Result<usize, GameError> {
        self.require_not_started("remove players")?;

        let index = self
            .players
            .iter()
            .position(|p| p.id() == player_id)
            .ok_or_else(|| GameError::not_found(EntityKind::Player, player_id))?;
        self.players.remove(index);

        info!(total = self.players.len(), "Player removed");
        Ok(self.players.len())
    }

    fn has_player(&self, id: &PlayerId) -> bool {
        self.player(id).is_some()
    }
}

// ─────────────────────────────────────────────────────────────
//  Lifecycle
// ─────────────────────────────────────────────────────────────

impl Game {
    /// Starts or restarts the game.
    ///
    /// Empties the board and turn ledger, deals a fresh random play order and
    /// enters `Started`. With `assign_next_turn`, the player with play order 0
    /// gets the turn immediately (and moves at once if it is an AI).
    ///
    /// # Errors
    ///
    /// Returns [`GameError::TooFewPlayers`] with fewer than two players.
    #[instrument(skip(self), fields(game_id = %self.id))]
    pub fn start(&mut self, assign_next_turn: bool) -> Result<(), GameError> {
        if self.players.len() < MIN_PLAYERS {
            warn!(count = self.players.len(), "Too few players to start");
            return Err(GameError::TooFewPlayers {
                game_id: self.id.clone(),
                count: self.players.len(),
                required: MIN_PLAYERS,
            });
        }

        self.board.reset();
        self.turns.clear();
        self.placed_cells.clear();
        self.winning_line = None;
        self.current_player = None;
        self.assign_play_order();
        self.state = GameState::Started;
        info!(players = self.players.len(), "Game started");

        if assign_next_turn {
            self.advance_turn()?;
        }
        Ok(())
    }

    /// Hands the turn to the next player in play order.
    ///
    /// With no current player the turn goes to play order 0; after the last
    /// play order it wraps to 0. An AI player receiving the turn moves
    /// straight away, and so on until a human holds the turn or the game ends.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidGameState`] unless the game is started.
    #[instrument(skip(self), fields(game_id = %self.id))]
    pub fn advance_turn(&mut self) -> Result<(), GameError> {
        self.require_state(GameState::Started, "advance the turn")?;

        loop {
            let (next_id, next_is_ai) = {
                let next = self.next_player()?;
                (next.id().clone(), next.is_ai())
            };
            debug!(player_id = %next_id, ai = next_is_ai, "Turn assigned");
            self.current_player = Some(next_id.clone());

            if !next_is_ai {
                return Ok(());
            }

            let available = self.board.available_columns();
            let column = self
                .selector
                .choose_column(&available, &mut self.rng)
                .ok_or_else(|| GameError::invariant("AI player holds the turn on a full board"))?;
            debug!(player_id = %next_id, column, "AI column chosen");
            self.apply_drop(&next_id, column)?;

            if self.state != GameState::Started {
                return Ok(());
            }
        }
    }

    /// Drops `player_id`'s piece into `column` and returns where it landed.
    ///
    /// Validation order: the game is started, `player_id` holds the turn,
    /// the column exists, the column has room. A rejected drop changes
    /// nothing. After an accepted drop the game is either won, tied, or the
    /// turn has moved on (through any AI players).
    ///
    /// # Errors
    ///
    /// - [`GameError::InvalidGameState`] unless the game is started.
    /// - [`GameError::NotCurrentPlayer`] if someone else holds the turn.
    /// - [`GameError::InvalidPiecePlacement`] for a column that is out of
    ///   bounds or full.
    /// - [`GameError::InvariantViolation`] if the engine detects its own
    ///   inconsistency.
    #[instrument(skip(self, player_id), fields(game_id = %self.id, player_id = %player_id))]
    pub fn drop_piece(&mut self, player_id: &PlayerId, column: usize) -> Result<Coord, GameError> {
        let location = self.apply_drop(player_id, column)?;
        if self.state == GameState::Started {
            self.advance_turn()?;
        }
        Ok(location)
    }

    /// Re-evaluates the whole board and applies a win or tie to the state.
    ///
    /// Runs the full scan over every placed cell, so it is correct for boards
    /// that were not built move by move.
    #[instrument(skip(self), fields(game_id = %self.id))]
    pub fn check_for_game_end(&mut self) -> GameEnd {
        let outcome = rules::check_for_game_end(&self.board, &self.placed_cells);
        self.apply_outcome(&outcome);
        outcome
    }

    fn apply_drop(&mut self, player_id: &PlayerId, column: usize) -> Result<Coord, GameError> {
        self.require_state(GameState::Started, "drop a piece")?;
        #[cfg(debug_assertions)]
        let (placed_before, sequence_before) =
            (self.placed_cells.len(), self.turns.last_sequence_id());

        if self.current_player.as_ref() != Some(player_id) {
            warn!(
                player_id = %player_id,
                current = ?self.current_player,
                "Player tried to move out of turn"
            );
            return Err(GameError::NotCurrentPlayer {
                player_id: player_id.clone(),
                current: self.current_player.clone(),
            });
        }

        let row = self.board.resolve_drop_row(column).map_err(|source| {
            warn!(column, error = %source, "Rejected piece placement");
            GameError::InvalidPiecePlacement { source }
        })?;
        self.board
            .place(row, column, player_id.clone())
            .map_err(|source| GameError::InvalidPiecePlacement { source })?;

        let location = Coord::new(row, column);
        self.placed_cells.push(location);
        self.turns.append(player_id.clone(), location);
        debug!(%location, "Piece placed");

        let outcome = rules::check_move(&self.board, location);
        if let GameEnd::Won { winner, .. } = &outcome {
            if winner != player_id {
                error!(winner = %winner, mover = %player_id, "Game won by a player who did not move");
                return Err(GameError::invariant(format!(
                    "game won by {winner} on a move by {player_id}"
                )));
            }
        }
        self.apply_outcome(&outcome);

        #[cfg(debug_assertions)]
        self.verify_move(&MoveStep {
            game: self,
            mover: player_id,
            location,
            placed_before,
            sequence_before,
        })?;

        Ok(location)
    }

    fn apply_outcome(&mut self, outcome: &GameEnd) {
        match outcome {
            GameEnd::Won { line, winner } => {
                self.state = GameState::Won;
                self.winning_line = Some(*line);
                info!(winner = %winner, line = %line, "Game won");
            }
            GameEnd::Tied => {
                self.state = GameState::Tied;
                info!("Game tied");
            }
            GameEnd::InProgress => {}
        }
    }

    fn assign_play_order(&mut self) {
        let mut order: Vec<usize> = (0..self.players.len()).collect();
        order.shuffle(&mut self.rng);
        for (player, position) in self.players.iter_mut().zip(order) {
            player.set_play_order(Some(position));
        }
        debug!(
            order = ?self.players.iter().map(|p| (p.id().as_str(), *p.play_order())).collect::<Vec<_>>(),
            "Play order assigned"
        );
    }

    fn next_player(&self) -> Result<&GamePlayer, GameError> {
        let next_order = match self.current_player.as_ref().and_then(|id| self.player(id)) {
            None => 0,
            Some(current) => {
                let order = current.play_order().ok_or_else(|| {
                    GameError::invariant(format!("player {} has no play order", current.id()))
                })?;
                if order + 1 >= self.players.len() { 0 } else { order + 1 }
            }
        };

        self.players
            .iter()
            .find(|p| *p.play_order() == Some(next_order))
            .ok_or_else(|| GameError::invariant(format!("no player holds play order {next_order}")))
    }

    fn check_play_order(&self) -> Result<(), GameError> {
        let mut orders: Vec<Option<usize>> = self.players.iter().map(|p| *p.play_order()).collect();
        orders.sort();
        let contiguous = orders
            .iter()
            .enumerate()
            .all(|(index, order)| *order == Some(index));
        if contiguous && self.players.len() >= MIN_PLAYERS {
            Ok(())
        } else {
            Err(GameError::invariant(format!("play order {orders:?} is not 0..{}", self.players.len())))
        }
    }

    fn require_state(&self, expected: GameState, action: &'static str) -> Result<(), GameError> {
        if self.state == expected {
            Ok(())
        } else {
            warn!(state = %self.state, action, "Operation rejected in current state");
            Err(GameError::InvalidGameState {
                game_id: self.id.clone(),
                state: self.state,
                action,
            })
        }
    }

    fn require_not_started(&self, action: &'static str) -> Result<(), GameError> {
        if self.state == GameState::Started {
            warn!(action, "Operation rejected while game is in play");
            Err(GameError::InvalidGameState {
                game_id: self.id.clone(),
                state: self.state,
                action,
            })
        } else {
            Ok(())
        }
    }

    #[cfg(debug_assertions)]
    fn verify_move(&self, step: &MoveStep<'_>) -> Result<(), GameError> {
        MoveInvariants::check_all(step).map_err(|violations| {
            let descriptions = violations
                .iter()
                .map(|v| v.description.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            error!(location = %step.location, violations = %descriptions, "Move invariants violated");
            GameError::invariant(descriptions)
        })
    }

    fn verify_invariants(&self) -> Result<(), GameError> {
        GameInvariants::check_all(self).map_err(|violations| {
            let descriptions = violations
                .iter()
                .map(|v| v.description.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            error!(violations = %descriptions, "Game invariants violated");
            GameError::invariant(descriptions)
        })
    }
}
