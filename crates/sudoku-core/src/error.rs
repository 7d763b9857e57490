use crate::Position;
use thiserror::Error;

/// A 3x3 region, row or column where a duplicate was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Row(usize),
    Column(usize),
    Box(usize),
}

/// Errors from building or parsing board values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("expected 81 cells, got {0}")]
    Length(usize),

    #[error("unexpected character {found:?} at cell {index}")]
    Character { index: usize, found: char },

    #[error("value {value} at {pos} is outside 1..=9")]
    OutOfRange { pos: Position, value: u8 },

    #[error("value {value} appears more than once in {unit:?}")]
    Duplicate { unit: Unit, value: u8 },
}

/// Errors from a grid generator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("generated grid is not a valid solution: {0}")]
    InvalidGrid(#[from] GridError),

    #[error("search gave up without completing the grid")]
    Exhausted,
}
