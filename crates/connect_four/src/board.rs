//! Board engine: grid storage, gravity drops and precomputed win lines.

use crate::error::BoardError;
use crate::lines::LineTable;
use crate::types::{BoardId, Coord, PlayerId, WinLine};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Default board width.
pub const DEFAULT_WIDTH: usize = 7;

/// Default board height.
pub const DEFAULT_HEIGHT: usize = 6;

/// One grid cell.
///
/// Win lines are fixed when the board is created; only the occupant changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    occupant: Option<PlayerId>,
    win_lines: Vec<WinLine>,
    crossing_lines: Vec<WinLine>,
}

impl Cell {
    /// Player whose piece fills this cell, if any.
    pub fn occupant(&self) -> Option<&PlayerId> {
        self.occupant.as_ref()
    }

    /// Checks if the cell is empty.
    pub fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }

    /// Lines anchored at this cell.
    pub fn win_lines(&self) -> &[WinLine] {
        &self.win_lines
    }

    /// Every line passing through this cell, anchored here or elsewhere.
    pub fn crossing_lines(&self) -> &[WinLine] {
        &self.crossing_lines
    }
}

/// Rectangular game board. Row 0 is the top; pieces fall towards the last row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BoardRecord", into = "BoardRecord")]
pub struct Board {
    id: BoardId,
    width: usize,
    height: usize,
    grid: Vec<Vec<Cell>>,
}

impl Board {
    /// Creates an empty board and precomputes every cell's win lines.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::InvalidDimensions`] if either dimension is zero.
    #[instrument(skip(id), fields(board_id = %id))]
    pub fn new(id: BoardId, width: usize, height: usize) -> Result<Self, BoardError> {
        if width == 0 || height == 0 {
            return Err(BoardError::InvalidDimensions { width, height });
        }

        let table = LineTable::build(width, height);
        let grid = table
            .anchored
            .into_iter()
            .zip(table.crossing)
            .map(|(anchored_row, crossing_row)| {
                anchored_row
                    .into_iter()
                    .zip(crossing_row)
                    .map(|(win_lines, crossing_lines)| Cell {
                        occupant: None,
                        win_lines,
                        crossing_lines,
                    })
                    .collect()
            })
            .collect();

        debug!(width, height, "Board created");
        Ok(Self {
            id,
            width,
            height,
            grid,
        })
    }

    /// Rebuilds a board from stored occupants, recomputing win lines.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError`] if the grid is empty or ragged.
    #[instrument(skip(id, occupants), fields(board_id = %id))]
    pub fn from_occupants(
        id: BoardId,
        occupants: Vec<Vec<Option<PlayerId>>>,
    ) -> Result<Self, BoardError> {
        let height = occupants.len();
        let width = occupants.first().map(Vec::len).unwrap_or(0);
        let mut board = Self::new(id, width, height)?;

        for (row, cells) in occupants.into_iter().enumerate() {
            if cells.len() != width {
                return Err(BoardError::MalformedGrid {
                    row,
                    len: cells.len(),
                    width,
                });
            }
            for (col, occupant) in cells.into_iter().enumerate() {
                board.grid[row][col].occupant = occupant;
            }
        }

        Ok(board)
    }

    /// Returns the board ID.
    pub fn id(&self) -> &BoardId {
        &self.id
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the cell at `coord`, or `None` if it is off the board.
    pub fn cell(&self, coord: Coord) -> Option<&Cell> {
        self.grid.get(coord.row).and_then(|row| row.get(coord.col))
    }

    /// Returns the occupant at `coord`; `None` for empty or off-board cells.
    pub fn occupant(&self, coord: Coord) -> Option<&PlayerId> {
        self.cell(coord).and_then(Cell::occupant)
    }

    /// Iterates rows from top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.grid.iter().map(Vec::as_slice)
    }

    /// Finds the row a piece dropped into `column` lands on.
    ///
    /// Scans top-to-bottom for the first occupied cell and returns the row
    /// above it, or the bottom row if the column is empty.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::OutOfBounds`] for a column outside the board and
    /// [`BoardError::ColumnFull`] if the entry row is occupied.
    pub fn resolve_drop_row(&self, column: usize) -> Result<usize, BoardError> {
        if column >= self.width {
            return Err(BoardError::OutOfBounds {
                column,
                width: self.width,
            });
        }
        if !self.grid[0][column].is_empty() {
            return Err(BoardError::ColumnFull { column });
        }

        let first_occupied = (0..self.height).find(|&row| !self.grid[row][column].is_empty());
        Ok(match first_occupied {
            Some(row) => row - 1,
            None => self.height - 1,
        })
    }

    /// Puts `player`'s piece at `(row, column)`.
    ///
    /// Only bounds are checked; turn and gravity rules belong to the game.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::CellOutOfBounds`] if the cell is off the board.
    pub fn place(&mut self, row: usize, column: usize, player: PlayerId) -> Result<(), BoardError> {
        let (width, height) = (self.width, self.height);
        let cell = self
            .grid
            .get_mut(row)
            .and_then(|cells| cells.get_mut(column))
            .ok_or(BoardError::CellOutOfBounds {
                coord: Coord::new(row, column),
                width,
                height,
            })?;
        cell.occupant = Some(player);
        Ok(())
    }

    /// Columns whose entry row is still empty, ascending.
    pub fn available_columns(&self) -> Vec<usize> {
        self.grid[0]
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_empty())
            .map(|(col, _)| col)
            .collect()
    }

    /// Checks whether the entry row is fully occupied.
    pub fn is_entry_row_full(&self) -> bool {
        self.grid[0].iter().all(|cell| !cell.is_empty())
    }

    /// Number of occupied cells.
    pub fn occupied_count(&self) -> usize {
        self.grid.iter().flatten().filter(|cell| !cell.is_empty()).count()
    }

    /// Empties every cell. Dimensions and win lines are kept.
    #[instrument(skip(self), fields(board_id = %self.id))]
    pub fn reset(&mut self) {
        for cell in self.grid.iter_mut().flatten() {
            cell.occupant = None;
        }
        debug!("Board reset");
    }

    /// Copies the occupant grid, the part of a board that needs storing.
    pub fn occupants(&self) -> Vec<Vec<Option<PlayerId>>> {
        self.grid
            .iter()
            .map(|row| row.iter().map(|cell| cell.occupant.clone()).collect())
            .collect()
    }

    /// Formats the board as text, one line per row plus a column header.
    ///
    /// `symbol` picks the character for each occupant.
    pub fn render(&self, symbol: impl Fn(&PlayerId) -> char) -> String {
        let mut result: String = (0..self.width)
            .map(|col| char::from_digit((col % 10) as u32, 10).unwrap_or('?'))
            .collect();
        result.push('\n');
        for row in &self.grid {
            for cell in row {
                result.push(cell.occupant().map(&symbol).unwrap_or('.'));
            }
            result.push('\n');
        }
        result
    }
}

/// Stored shape of a board. Win lines are derived data and left out.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BoardRecord {
    id: BoardId,
    width: usize,
    height: usize,
    occupants: Vec<Vec<Option<PlayerId>>>,
}

impl From<Board> for BoardRecord {
    fn from(board: Board) -> Self {
        Self {
            occupants: board.occupants(),
            id: board.id,
            width: board.width,
            height: board.height,
        }
    }
}

impl TryFrom<BoardRecord> for Board {
    type Error = BoardError;

    fn try_from(record: BoardRecord) -> Result<Self, Self::Error> {
        if record.occupants.len() != record.height {
            return Err(BoardError::InvalidDimensions {
                width: record.width,
                height: record.occupants.len(),
            });
        }
        let board = Board::from_occupants(record.id, record.occupants)?;
        if board.width != record.width {
            return Err(BoardError::MalformedGrid {
                row: 0,
                len: board.width,
                width: record.width,
            });
        }
        Ok(board)
    }
}
