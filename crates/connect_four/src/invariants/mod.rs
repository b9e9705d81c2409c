//! Invariants of a connect-four game.
//!
//! Each invariant is a property every reachable [`Game`](crate::Game) state
//! satisfies. [`GameInvariants`] covers the whole game and is checked
//! whenever a game is rebuilt from stored data. [`MoveInvariants`] covers
//! only what one drop changes and is checked after every move in debug
//! builds.

mod ledger_order;
mod lifecycle;
mod move_step;
mod placed_cells;

pub use ledger_order::LedgerMatchesPlacedCells;
pub use lifecycle::LifecycleConsistent;
pub use move_step::{
    LedgerRecordsMove, MoveInvariants, MoveLandedOnBoard, MoveStep, TransitionConsistent,
};
pub use placed_cells::PlacedCellsMatchBoard;

/// A property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// Invariants checked together, implemented for tuples.
pub trait InvariantSet<S> {
    /// Checks every invariant in the set.
    ///
    /// # Errors
    ///
    /// Returns every violated invariant, not just the first.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

impl<S, I1, I2> InvariantSet<S> for (I1, I2)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let violations: Vec<_> = [
            (I1::holds(state), I1::description()),
            (I2::holds(state), I2::description()),
        ]
        .into_iter()
        .filter(|(holds, _)| !holds)
        .map(|(_, description)| InvariantViolation::new(description))
        .collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }
}

impl<S, I1, I2, I3> InvariantSet<S> for (I1, I2, I3)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
    I3: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = match <(I1, I2)>::check_all(state) {
            Ok(()) => Vec::new(),
            Err(violations) => violations,
        };
        if !I3::holds(state) {
            violations.push(InvariantViolation::new(I3::description()));
        }

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }
}

/// Every invariant of a game.
pub type GameInvariants = (
    PlacedCellsMatchBoard,
    LedgerMatchesPlacedCells,
    LifecycleConsistent,
);
