//! Board types and generators for the puzzle session engine.
//!
//! - [`SolutionGrid`], [`VisibilityMask`], [`PlayerGrid`]: the three boards a
//!   session is made of
//! - [`GridGenerator`] / [`MaskGenerator`]: contracts the engine generates
//!   through, with random default implementations
//! - [`Solver`]: backtracking search used by the generators

mod error;
mod generator;
mod grid;
mod solver;
mod types;

pub use error::{GenerateError, GridError, Unit};
pub use generator::{GridGenerator, MaskGenerator, RandomGridGenerator, SymmetricMaskGenerator};
pub use grid::{Cell, Digit, PlayerGrid, SolutionGrid, VisibilityMask};
pub use solver::Solver;
pub use types::{Difficulty, ParseDifficultyError, Position};
