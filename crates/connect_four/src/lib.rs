//! Connect four - a pure game engine
//!
//! Boards of any size, two or more players, gravity drops, wins on any line
//! of four cells (vertical, horizontal or diagonal) and ties on a full board.
//!
//! # Architecture
//!
//! - **Board**: grid of cells, each carrying the win lines it anchors and
//!   the win lines crossing it, computed once at construction
//! - **Game**: lifecycle state machine, roster, play order and AI turns
//! - **Ledger**: append-only turn log with monotonic sequence IDs
//! - **Rules**: pure win and tie evaluation
//! - **Invariants**: properties every game state satisfies
//!
//! # Example
//!
//! ```
//! use connect_four::{Board, BoardId, Game, GameId, GameState, Player};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let board = Board::new(BoardId::new("b1"), 7, 6)?;
//! let mut game = Game::new(GameId::new("g1"), board).with_seed(7);
//! game.add_players([Player::human("ann", "Ann"), Player::human("bo", "Bo")])?;
//! game.start(true)?;
//!
//! let mover = game.current_player().cloned().ok_or("no turn holder")?;
//! let landed = game.drop_piece(&mover, 3)?;
//! assert_eq!((landed.row, landed.col), (5, 3));
//! assert_eq!(game.state(), GameState::Started);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod board;
mod error;
mod game;
mod ledger;
mod player;
mod selector;
mod snapshot;
mod state;
mod types;

pub mod invariants;
pub mod lines;
pub mod rules;

pub use board::{Board, Cell, DEFAULT_HEIGHT, DEFAULT_WIDTH};
pub use error::{BoardError, EntityKind, ErrorKind, GameError};
pub use game::{Game, MIN_PLAYERS};
pub use ledger::{TurnLedger, TurnRecord};
pub use player::{DEFAULT_COLOR, GamePlayer, Player, PlayerKind};
pub use rules::GameEnd;
pub use selector::{MoveSelector, RandomSelector};
pub use snapshot::GameSnapshot;
pub use state::GameState;
pub use types::{BoardId, Coord, GameId, PlayerId, WIN_LENGTH, WinLine};
