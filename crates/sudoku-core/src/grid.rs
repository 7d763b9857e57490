//! Board values: the solved grid, the visibility mask, and the player's grid.
//!
//! All three have an 81-character compact string form used for persistence.
//! Parsing is strict so a stored board either round-trips exactly or fails.

use crate::error::{GridError, Unit};
use crate::Position;
use std::fmt;

/// A digit in `1..=9`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digit(u8);

impl Digit {
    pub fn new(value: u8) -> Option<Self> {
        (1..=9).contains(&value).then_some(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    fn to_char(self) -> char {
        char::from(b'0' + self.0)
    }
}

/// A fully populated grid that satisfies row, column and box uniqueness.
///
/// The only way to obtain one is through validation, so holders can rely on
/// it being a correct solution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SolutionGrid {
    cells: [[u8; 9]; 9],
}

impl SolutionGrid {
    /// Validate raw rows into a solution grid
    pub fn from_rows(cells: [[u8; 9]; 9]) -> Result<Self, GridError> {
        for pos in Position::all_9x9() {
            let value = cells[pos.row][pos.col];
            if !(1..=9).contains(&value) {
                return Err(GridError::OutOfRange { pos, value });
            }
        }
        check_units(&cells)?;
        Ok(Self { cells })
    }

    /// Parse an 81-digit string
    pub fn from_string(s: &str) -> Result<Self, GridError> {
        let chars = exact_chars(s)?;
        let mut cells = [[0u8; 9]; 9];
        for (index, c) in chars.into_iter().enumerate() {
            let value = c
                .to_digit(10)
                .filter(|d| *d != 0)
                .ok_or(GridError::Character { index, found: c })?;
            cells[index / 9][index % 9] = value as u8;
        }
        Self::from_rows(cells)
    }

    pub fn get(&self, pos: Position) -> u8 {
        self.cells[pos.row][pos.col]
    }

    pub fn digit(&self, pos: Position) -> Digit {
        Digit(self.get(pos))
    }

    pub fn rows(&self) -> &[[u8; 9]; 9] {
        &self.cells
    }

    pub fn to_string_compact(&self) -> String {
        self.cells
            .iter()
            .flatten()
            .map(|v| char::from(b'0' + v))
            .collect()
    }
}

impl fmt::Display for SolutionGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_board(f, |pos| Some(self.get(pos)))
    }
}

/// Which cells start revealed. `true` cells are part of the puzzle and can
/// never be edited by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisibilityMask {
    revealed: [[bool; 9]; 9],
}

impl VisibilityMask {
    pub fn from_rows(revealed: [[bool; 9]; 9]) -> Self {
        Self { revealed }
    }

    /// A mask with every cell hidden
    pub fn all_hidden() -> Self {
        Self::from_rows([[false; 9]; 9])
    }

    /// Parse 81 characters of `1` (revealed) or `0` (hidden)
    pub fn from_string(s: &str) -> Result<Self, GridError> {
        let chars = exact_chars(s)?;
        let mut revealed = [[false; 9]; 9];
        for (index, c) in chars.into_iter().enumerate() {
            revealed[index / 9][index % 9] = match c {
                '1' => true,
                '0' => false,
                found => return Err(GridError::Character { index, found }),
            };
        }
        Ok(Self { revealed })
    }

    pub fn is_revealed(&self, pos: Position) -> bool {
        self.revealed[pos.row][pos.col]
    }

    pub fn is_writable(&self, pos: Position) -> bool {
        !self.is_revealed(pos)
    }

    pub(crate) fn set(&mut self, pos: Position, revealed: bool) {
        self.revealed[pos.row][pos.col] = revealed;
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed.iter().flatten().filter(|r| **r).count()
    }

    pub fn rows(&self) -> &[[bool; 9]; 9] {
        &self.revealed
    }

    pub fn to_string_compact(&self) -> String {
        self.revealed
            .iter()
            .flatten()
            .map(|r| if *r { '1' } else { '0' })
            .collect()
    }
}

/// One cell of the player's grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Cell {
    #[default]
    Blank,
    Filled(Digit),
}

impl Cell {
    /// A filled cell, or `None` if `value` is not in `1..=9`
    pub fn filled(value: u8) -> Option<Self> {
        Digit::new(value).map(Cell::Filled)
    }

    pub fn value(&self) -> Option<u8> {
        match self {
            Cell::Blank => None,
            Cell::Filled(digit) => Some(digit.get()),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Cell::Blank)
    }
}

/// The player's working grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PlayerGrid {
    cells: [[Cell; 9]; 9],
}

impl PlayerGrid {
    /// Copy the revealed cells of `solution` and leave the rest blank
    pub fn from_solution(solution: &SolutionGrid, mask: &VisibilityMask) -> Self {
        let mut grid = Self::default();
        for pos in Position::all_9x9() {
            if mask.is_revealed(pos) {
                grid.set(pos, Cell::Filled(solution.digit(pos)));
            }
        }
        grid
    }

    /// Parse 81 characters: a digit, or `.`/`0` for blank
    pub fn from_string(s: &str) -> Result<Self, GridError> {
        let chars = exact_chars(s)?;
        let mut grid = Self::default();
        for (index, c) in chars.into_iter().enumerate() {
            let cell = match c {
                '.' | '0' => Cell::Blank,
                '1'..='9' => Cell::Filled(Digit(c as u8 - b'0')),
                found => return Err(GridError::Character { index, found }),
            };
            grid.cells[index / 9][index % 9] = cell;
        }
        Ok(grid)
    }

    pub fn get(&self, pos: Position) -> Cell {
        self.cells[pos.row][pos.col]
    }

    pub fn set(&mut self, pos: Position, cell: Cell) {
        self.cells[pos.row][pos.col] = cell;
    }

    /// Values as plain options (None = blank)
    pub fn values(&self) -> [[Option<u8>; 9]; 9] {
        std::array::from_fn(|row| std::array::from_fn(|col| self.cells[row][col].value()))
    }

    pub fn filled_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| !c.is_blank()).count()
    }

    /// True when every cell is filled with the solution's value
    pub fn matches_solution(&self, solution: &SolutionGrid) -> bool {
        Position::all_9x9().all(|pos| self.get(pos).value() == Some(solution.get(pos)))
    }

    /// First revealed cell whose value differs from the solution, if any
    pub fn first_revealed_mismatch(
        &self,
        solution: &SolutionGrid,
        mask: &VisibilityMask,
    ) -> Option<Position> {
        Position::all_9x9().find(|pos| {
            mask.is_revealed(*pos) && self.get(*pos).value() != Some(solution.get(*pos))
        })
    }

    pub fn to_string_compact(&self) -> String {
        self.cells
            .iter()
            .flatten()
            .map(|cell| match cell {
                Cell::Blank => '.',
                Cell::Filled(digit) => digit.to_char(),
            })
            .collect()
    }
}

impl fmt::Display for PlayerGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_board(f, |pos| self.get(pos).value())
    }
}

fn exact_chars(s: &str) -> Result<Vec<char>, GridError> {
    let chars: Vec<char> = s.trim().chars().collect();
    if chars.len() != 81 {
        return Err(GridError::Length(chars.len()));
    }
    Ok(chars)
}

#[allow(clippy::needless_range_loop)]
fn check_units(cells: &[[u8; 9]; 9]) -> Result<(), GridError> {
    for i in 0..9 {
        let mut row_seen = 0u16;
        let mut col_seen = 0u16;
        let mut box_seen = 0u16;
        let box_row = (i / 3) * 3;
        let box_col = (i % 3) * 3;
        for j in 0..9 {
            let row_value = cells[i][j];
            if !mark(&mut row_seen, row_value) {
                return Err(GridError::Duplicate { unit: Unit::Row(i), value: row_value });
            }
            let col_value = cells[j][i];
            if !mark(&mut col_seen, col_value) {
                return Err(GridError::Duplicate { unit: Unit::Column(i), value: col_value });
            }
            let box_value = cells[box_row + j / 3][box_col + j % 3];
            if !mark(&mut box_seen, box_value) {
                return Err(GridError::Duplicate { unit: Unit::Box(i), value: box_value });
            }
        }
    }
    Ok(())
}

/// Record `value` in `seen`, returning false if it was already there
fn mark(seen: &mut u16, value: u8) -> bool {
    let bit = 1u16 << value;
    let fresh = *seen & bit == 0;
    *seen |= bit;
    fresh
}

fn write_board(
    f: &mut fmt::Formatter<'_>,
    value_at: impl Fn(Position) -> Option<u8>,
) -> fmt::Result {
    for row in 0..9 {
        if row > 0 && row % 3 == 0 {
            writeln!(f, "------+-------+------")?;
        }
        for col in 0..9 {
            if col > 0 && col % 3 == 0 {
                write!(f, "| ")?;
            }
            match value_at(Position::new(row, col)) {
                Some(v) => write!(f, "{}", v)?,
                None => write!(f, ".")?,
            }
            if col < 8 {
                write!(f, " ")?;
            }
        }
        writeln!(f)?;
    }
    Ok(())
}
