//! Players and their per-game roster entries.

use crate::types::PlayerId;
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};

/// Color given to players created without one.
pub const DEFAULT_COLOR: &str = "#808080";

/// Who drives a player's moves.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlayerKind {
    /// Moves arrive from outside through `drop_piece`.
    Human,
    /// Moves are chosen by the engine's move selector.
    Ai,
}

/// A player that can join games.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters, new)]
pub struct Player {
    /// Player's unique ID.
    id: PlayerId,
    /// Display name.
    name: String,
    /// Piece color, e.g. `#ff0000`.
    color: String,
    /// Human or AI.
    kind: PlayerKind,
}

impl Player {
    /// Creates a human player with the default color.
    pub fn human(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self::new(id.into(), name.into(), DEFAULT_COLOR.to_string(), PlayerKind::Human)
    }

    /// Creates an AI player with the default color.
    pub fn ai(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self::new(id.into(), name.into(), DEFAULT_COLOR.to_string(), PlayerKind::Ai)
    }

    /// Returns a copy with a different piece color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Whether the engine plays this player's turns.
    pub fn is_ai(&self) -> bool {
        self.kind == PlayerKind::Ai
    }
}

/// A player registered in one game.
///
/// `play_order` is unset until the game is started, then unique and
/// contiguous from zero within the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct GamePlayer {
    /// The registered player.
    player: Player,
    /// Position in the turn rotation.
    play_order: Option<usize>,
}

impl GamePlayer {
    /// Registers a player with no play order yet.
    pub fn unordered(player: Player) -> Self {
        Self::new(player, None)
    }

    /// Shorthand for the player's ID.
    pub fn id(&self) -> &PlayerId {
        self.player.id()
    }

    /// Shorthand for [`Player::is_ai`].
    pub fn is_ai(&self) -> bool {
        self.player.is_ai()
    }

    pub(crate) fn set_play_order(&mut self, order: Option<usize>) {
        self.play_order = order;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_kind_round_trips_through_string() {
        assert_eq!(PlayerKind::Ai.to_string(), "ai");
        assert_eq!(PlayerKind::from_str("human").expect("parse"), PlayerKind::Human);
    }

    #[test]
    fn test_ai_constructor_sets_kind() {
        let bot = Player::ai("bot", "Robo");
        assert!(bot.is_ai());
        assert_eq!(bot.color(), DEFAULT_COLOR);
        assert!(!Player::human("h", "Hana").is_ai());
    }
}
