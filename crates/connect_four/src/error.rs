//! Engine error types.

use crate::types::{Coord, GameId, PlayerId};
use crate::GameState;
use derive_more::{Display, Error};

/// Grid-level failure: bad coordinates, full columns, or malformed grids.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum BoardError {
    /// Column index is outside `[0, width)`.
    #[display("column {column} is out of bounds (width {width})")]
    OutOfBounds {
        /// Requested column.
        column: usize,
        /// Board width.
        width: usize,
    },

    /// The entry row of the column is already occupied.
    #[display("column {column} is full")]
    ColumnFull {
        /// Requested column.
        column: usize,
    },

    /// A cell coordinate is outside the board.
    #[display("cell {coord} is outside the {width}x{height} board")]
    CellOutOfBounds {
        /// Requested cell.
        coord: Coord,
        /// Board width.
        width: usize,
        /// Board height.
        height: usize,
    },

    /// Width or height is zero.
    #[display("board dimensions must be non-zero (got {width}x{height})")]
    InvalidDimensions {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
    },

    /// A serialized grid row does not match the board width.
    #[display("grid row {row} has {len} cells, expected {width}")]
    MalformedGrid {
        /// Offending row.
        row: usize,
        /// Cells found in that row.
        len: usize,
        /// Expected width.
        width: usize,
    },
}

/// Kind of entity a lookup refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum EntityKind {
    /// A game.
    Game,
    /// A player.
    Player,
    /// A board.
    Board,
}

/// Transport-independent classification of a [`GameError`].
///
/// The request layer maps these onto its own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum ErrorKind {
    /// Start attempted with fewer than two players.
    TooFewPlayers,
    /// Player is already on the roster.
    PlayerAlreadyInGame,
    /// Operation not allowed in the current lifecycle state.
    InvalidGameState,
    /// Drop attempted out of turn.
    NotCurrentPlayer,
    /// Column out of bounds or full.
    InvalidPiecePlacement,
    /// Referenced entity does not exist.
    NotFound,
    /// Engine invariant broken; a defect, not a client error.
    InvariantViolation,
}

/// Error returned by game operations.
///
/// Every variant is a synchronous rejection of one request; the engine never
/// retries on its own.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum GameError {
    /// `start()` requires at least two players.
    #[display("game {game_id} has too few players to start ({count} registered, {required} required)")]
    TooFewPlayers {
        /// Game being started.
        game_id: GameId,
        /// Players currently registered.
        count: usize,
        /// Minimum roster size.
        required: usize,
    },

    /// Player is already registered in the game.
    #[display("player {player_id} is already in game {game_id}")]
    PlayerAlreadyInGame {
        /// Game being joined.
        game_id: GameId,
        /// Duplicate player.
        player_id: PlayerId,
    },

    /// Operation not permitted in the game's current state.
    #[display("game {game_id} is {state}; cannot {action}")]
    InvalidGameState {
        /// Game being mutated.
        game_id: GameId,
        /// State the game was in.
        state: GameState,
        /// Attempted operation.
        action: &'static str,
    },

    /// Someone other than the current player tried to move.
    #[display("{player_id} is not the current player")]
    NotCurrentPlayer {
        /// Player who attempted the drop.
        player_id: PlayerId,
        /// Player holding the turn, if any.
        current: Option<PlayerId>,
    },

    /// Column out of bounds or full.
    #[display("invalid piece placement: {source}")]
    InvalidPiecePlacement {
        /// Underlying grid failure.
        source: BoardError,
    },

    /// Referenced entity does not exist.
    #[display("no {entity} with id: {id}")]
    NotFound {
        /// Kind of entity looked up.
        entity: EntityKind,
        /// Identifier that failed to resolve.
        id: String,
    },

    /// Engine invariant violated. Indicates a bug, never a bad request.
    #[display("invariant violation: {message}")]
    InvariantViolation {
        /// Description of what broke.
        message: String,
    },
}

impl GameError {
    /// Builds a [`GameError::NotFound`].
    pub fn not_found(entity: EntityKind, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Builds a [`GameError::InvariantViolation`].
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    /// Returns the transport-independent classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TooFewPlayers { .. } => ErrorKind::TooFewPlayers,
            Self::PlayerAlreadyInGame { .. } => ErrorKind::PlayerAlreadyInGame,
            Self::InvalidGameState { .. } => ErrorKind::InvalidGameState,
            Self::NotCurrentPlayer { .. } => ErrorKind::NotCurrentPlayer,
            Self::InvalidPiecePlacement { .. } => ErrorKind::InvalidPiecePlacement,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvariantViolation { .. } => ErrorKind::InvariantViolation,
        }
    }
}
