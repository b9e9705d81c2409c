//! Game lifecycle state.

use serde::{Deserialize, Serialize};

/// Lifecycle of a game.
///
/// `New → Started → Won | Tied`; a restart moves any state back to `Started`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameState {
    /// Created, roster open, no turns yet.
    #[default]
    New,
    /// Accepting moves.
    Started,
    /// A player completed a line of four.
    Won,
    /// Board filled with no winner.
    Tied,
}

impl GameState {
    /// Checks whether the game has ended.
    pub fn is_finished(self) -> bool {
        matches!(self, GameState::Won | GameState::Tied)
    }
}
