//! Connect four service
//!
//! Async game service over the pure `connect_four` engine.
//!
//! # Architecture
//!
//! - **Service**: per-game locking around load, move and persist
//! - **Store**: async storage contract with an in-memory implementation
//! - **Mirror**: client-side board kept current from turn records
//! - **Config**: TOML file, `.env` and environment overrides
//!
//! # Example
//!
//! ```
//! use connect_four::PlayerKind;
//! use connect_four_server::{GameService, MemoryStore};
//!
//! # async fn example() -> Result<(), connect_four_server::ServiceError> {
//! let service = GameService::new(MemoryStore::new()).with_seed(1);
//! let game = service.create_game(7, 6).await?;
//! let ann = service.create_player("Ann", None, PlayerKind::Human).await?;
//! let bot = service.create_player("Robo", None, PlayerKind::Ai).await?;
//! service.add_players(game.id(), &[ann.id().clone(), bot.id().clone()]).await?;
//!
//! let started = service.start(game.id()).await?;
//! assert_eq!(started.current_player().as_ref(), Some(ann.id()));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod mirror;
mod service;
mod store;

pub use config::{ConfigError, ENV_HEIGHT, ENV_LOG, ENV_SEED, ENV_WIDTH, ServerConfig};
pub use error::ServiceError;
pub use mirror::BoardMirror;
pub use service::{GamePoll, GameService, GameStatus, MoveOutcome};
pub use store::{
    GameFieldsUpdate, GameProgress, GameRecord, GameStore, GameSummary, LoadedGame, MemoryStore,
    Occupants, StoreError,
};
