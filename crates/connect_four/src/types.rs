//! Identifiers and grid coordinates shared across the engine.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// Number of same-player pieces in a line required to win.
pub const WIN_LENGTH: usize = 4;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from any string-like value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

string_id!(
    /// Unique identifier for a game.
    GameId
);

string_id!(
    /// Unique identifier for a player.
    PlayerId
);

string_id!(
    /// Unique identifier for a board.
    BoardId
);

/// A cell position on the board. Row 0 is the top (entry) row.
///
/// Serialized as a `[row, col]` pair.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize,
)]
#[display("({row}, {col})")]
#[serde(from = "[usize; 2]", into = "[usize; 2]")]
pub struct Coord {
    /// Row index, counted from the top.
    pub row: usize,
    /// Column index, counted from the left.
    pub col: usize,
}

impl Coord {
    /// Creates a coordinate.
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl From<[usize; 2]> for Coord {
    fn from([row, col]: [usize; 2]) -> Self {
        Self { row, col }
    }
}

impl From<Coord> for [usize; 2] {
    fn from(coord: Coord) -> Self {
        [coord.row, coord.col]
    }
}

/// Four collinear, in-bounds cells, listed from the line's anchor outward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WinLine([Coord; WIN_LENGTH]);

impl WinLine {
    /// Wraps four coordinates. The first one is the anchor.
    pub const fn new(cells: [Coord; WIN_LENGTH]) -> Self {
        Self(cells)
    }

    /// Returns the member cells, anchor first.
    pub fn cells(&self) -> &[Coord; WIN_LENGTH] {
        &self.0
    }

    /// Returns the cell this line is attached to.
    pub fn anchor(&self) -> Coord {
        self.0[0]
    }

    /// Checks whether `coord` is one of the four members.
    pub fn contains(&self, coord: Coord) -> bool {
        self.0.contains(&coord)
    }

    /// Returns the members in a canonical order, for set-like comparison.
    pub fn sorted(&self) -> [Coord; WIN_LENGTH] {
        let mut cells = self.0;
        cells.sort();
        cells
    }
}

impl std::fmt::Display for WinLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "[{a}, {b}, {c}, {d}]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coord_serializes_as_pair() {
        let json = serde_json::to_string(&Coord::new(5, 0)).expect("serialize");
        assert_eq!(json, "[5,0]");
        let back: Coord = serde_json::from_str("[2,3]").expect("deserialize");
        assert_eq!(back, Coord::new(2, 3));
    }

    #[test]
    fn test_win_line_serializes_as_nested_pairs() {
        let line = WinLine::new([
            Coord::new(5, 0),
            Coord::new(4, 0),
            Coord::new(3, 0),
            Coord::new(2, 0),
        ]);
        let json = serde_json::to_string(&line).expect("serialize");
        assert_eq!(json, "[[5,0],[4,0],[3,0],[2,0]]");
    }

    #[test]
    fn test_ids_display_inner_string() {
        let id = PlayerId::new("p-1");
        assert_eq!(id.to_string(), "p-1");
        assert_eq!(GameId::from("g-7").as_str(), "g-7");
    }
}
