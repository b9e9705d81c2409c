//! Service error types.

use crate::store::StoreError;
use connect_four::{BoardError, ErrorKind, GameError};
use derive_more::{Display, Error, From};

/// Error returned by [`GameService`](crate::GameService) operations.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum ServiceError {
    /// The engine rejected the request.
    #[display("{_0}")]
    Game(GameError),

    /// A board could not be created.
    #[display("{_0}")]
    Board(BoardError),

    /// The store failed.
    #[display("{_0}")]
    Store(StoreError),
}

impl ServiceError {
    /// Engine error kind, or `None` for failures outside the engine.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Game(err) => Some(err.kind()),
            Self::Board(_) | Self::Store(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connect_four::EntityKind;

    #[test]
    fn test_game_errors_keep_their_kind() {
        let err: ServiceError = GameError::not_found(EntityKind::Game, "g9").into();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
        assert_eq!(err.to_string(), "no game with id: g9");
    }

    #[test]
    fn test_store_errors_have_no_kind() {
        let err: ServiceError = StoreError::new("disk on fire").into();
        assert_eq!(err.kind(), None);
    }
}
