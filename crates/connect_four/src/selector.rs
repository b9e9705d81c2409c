//! Column choice for AI-controlled players.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Picks a column for an AI player.
///
/// Called by the game with the currently available columns and the game's
/// random source.
pub trait MoveSelector: std::fmt::Debug + Send + Sync {
    /// Chooses one of `available`, or `None` if it is empty.
    fn choose_column(&self, available: &[usize], rng: &mut StdRng) -> Option<usize>;
}

/// Uniform random choice among available columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSelector;

impl MoveSelector for RandomSelector {
    fn choose_column(&self, available: &[usize], rng: &mut StdRng) -> Option<usize> {
        available.choose(rng).copied()
    }
}
