use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Difficulty level of a puzzle
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// All difficulties, easiest first
    pub fn all_levels() -> &'static [Difficulty] {
        &[Difficulty::Easy, Difficulty::Medium, Difficulty::Hard]
    }

    /// How many of the 81 cells start revealed at this difficulty.
    ///
    /// The ranges are disjoint, so a harder level always reveals strictly
    /// fewer cells than an easier one.
    pub fn revealed_range(&self) -> RangeInclusive<usize> {
        match self {
            Difficulty::Easy => 38..=44,
            Difficulty::Medium => 30..=36,
            Difficulty::Hard => 24..=29,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        };
        write!(f, "{}", name)
    }
}

/// Error returned when a difficulty name is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown difficulty: {0}")]
pub struct ParseDifficultyError(pub String);

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ParseDifficultyError(s.to_string())),
        }
    }
}

/// A cell coordinate on the 9x9 board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    /// Create a position. Callers must keep both coordinates in `0..9`.
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Create a position from untrusted coordinates
    pub fn try_new(row: usize, col: usize) -> Option<Self> {
        (row < 9 && col < 9).then_some(Self { row, col })
    }

    /// Index of the 3x3 box containing this position (0..9, row-major)
    pub fn box_index(&self) -> usize {
        (self.row / 3) * 3 + self.col / 3
    }

    /// The position mirrored through the centre of the board
    pub fn rotated_180(&self) -> Self {
        Self::new(8 - self.row, 8 - self.col)
    }

    /// Iterate over all 81 positions in row-major order
    pub fn all_9x9() -> impl Iterator<Item = Position> {
        (0..9).flat_map(|row| (0..9).map(move |col| Position::new(row, col)))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revealed_ranges_strictly_decrease() {
        let levels = Difficulty::all_levels();
        for pair in levels.windows(2) {
            let easier = pair[0].revealed_range();
            let harder = pair[1].revealed_range();
            assert!(harder.end() < easier.start(), "{} vs {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_difficulty_parse() {
        assert_eq!("EASY".parse::<Difficulty>(), Ok(Difficulty::Easy));
        assert_eq!("hard".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert!("extreme".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::default(), Difficulty::Medium);
    }

    #[test]
    fn test_position_bounds() {
        assert_eq!(Position::try_new(8, 8), Some(Position::new(8, 8)));
        assert_eq!(Position::try_new(9, 0), None);
        assert_eq!(Position::try_new(0, 9), None);
        assert_eq!(Position::new(4, 7).box_index(), 5);
        assert_eq!(Position::new(0, 2).rotated_180(), Position::new(8, 6));
        assert_eq!(Position::all_9x9().count(), 81);
    }
}
