use crate::error::GenerateError;
use crate::solver::{fill_random, Solver};
use crate::{Difficulty, Position, SolutionGrid, VisibilityMask};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Produces fully solved grids
pub trait GridGenerator: Send {
    fn generate(&mut self) -> Result<SolutionGrid, GenerateError>;
}

/// Decides which cells of a solution start revealed
pub trait MaskGenerator: Send {
    fn generate_mask(&mut self, solution: &SolutionGrid, difficulty: Difficulty) -> VisibilityMask;
}

/// Random solved grids: the three diagonal boxes are shuffled independently
/// (they don't constrain each other) and the rest is filled by a backtracking
/// search that tries digits in random order.
pub struct RandomGridGenerator {
    rng: StdRng,
}

impl Default for RandomGridGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomGridGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a generator with a specific seed for reproducibility
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn fill_box(&mut self, cells: &mut [[u8; 9]; 9], start: usize) {
        let mut values: Vec<u8> = (1..=9).collect();
        values.shuffle(&mut self.rng);

        for (idx, value) in values.into_iter().enumerate() {
            cells[start + idx / 3][start + idx % 3] = value;
        }
    }
}

impl GridGenerator for RandomGridGenerator {
    fn generate(&mut self) -> Result<SolutionGrid, GenerateError> {
        let mut cells = [[0u8; 9]; 9];
        for start in [0, 3, 6] {
            self.fill_box(&mut cells, start);
        }

        if !fill_random(&mut cells, &mut self.rng) {
            return Err(GenerateError::Exhausted);
        }
        Ok(SolutionGrid::from_rows(cells)?)
    }
}

/// Passes with a fresh shuffle before unique mode gives up on uniqueness
const UNIQUE_PASSES: usize = 16;

const CENTRE: Position = Position::new(4, 4);

/// Masks with 180-degree rotational symmetry.
///
/// The revealed count is drawn from [`Difficulty::revealed_range`] and always
/// ends up inside it. In unique mode a symmetric pair is only hidden when the
/// puzzle keeps exactly one solution; a pass that gets stuck above the range
/// is retried with a new shuffle, and if every pass gets stuck the closest
/// mask is finished without the uniqueness check.
pub struct SymmetricMaskGenerator {
    rng: StdRng,
    unique: bool,
}

impl Default for SymmetricMaskGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SymmetricMaskGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            unique: false,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            unique: false,
        }
    }

    /// Only hide cells while the puzzle keeps a unique solution
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    fn puzzle_of(solution: &SolutionGrid, mask: &VisibilityMask) -> [[u8; 9]; 9] {
        let mut cells = *solution.rows();
        for pos in Position::all_9x9() {
            if !mask.is_revealed(pos) {
                cells[pos.row][pos.col] = 0;
            }
        }
        cells
    }

    /// A fully revealed mask, with the centre hidden when `target` is even.
    /// The centre is its own mirror, so hiding it is how the parity of the
    /// count is matched to the target.
    fn initial_mask(target: usize) -> VisibilityMask {
        let mut mask = VisibilityMask::from_rows([[true; 9]; 9]);
        if target % 2 == 0 {
            mask.set(CENTRE, false);
        }
        mask
    }

    /// Hide symmetric pairs in random order until at most `target` cells are
    /// revealed or no pair is left to try
    fn hide_pairs(
        &mut self,
        solution: &SolutionGrid,
        mask: &mut VisibilityMask,
        target: usize,
        unique: bool,
    ) {
        let solver = Solver::new();
        let mut positions: Vec<Position> = Position::all_9x9()
            .filter(|pos| (pos.row, pos.col) < (8 - pos.row, 8 - pos.col))
            .collect();
        positions.shuffle(&mut self.rng);

        for pos in positions {
            if mask.revealed_count() <= target {
                break;
            }
            if !mask.is_revealed(pos) {
                continue;
            }

            let sym = pos.rotated_180();
            mask.set(pos, false);
            mask.set(sym, false);

            if unique && !solver.has_unique_solution(&Self::puzzle_of(solution, mask)) {
                mask.set(pos, true);
                mask.set(sym, true);
            }
        }
    }
}

impl MaskGenerator for SymmetricMaskGenerator {
    fn generate_mask(&mut self, solution: &SolutionGrid, difficulty: Difficulty) -> VisibilityMask {
        let range = difficulty.revealed_range();

        if !self.unique {
            let target = self.rng.gen_range(range);
            let mut mask = Self::initial_mask(target);
            self.hide_pairs(solution, &mut mask, target, false);
            return mask;
        }

        let mut closest: Option<VisibilityMask> = None;
        for _ in 0..UNIQUE_PASSES {
            let target = self.rng.gen_range(range.clone());
            let mut mask = Self::initial_mask(target);
            self.hide_pairs(solution, &mut mask, target, true);

            if range.contains(&mask.revealed_count()) {
                return mask;
            }
            if closest.map_or(true, |c| mask.revealed_count() < c.revealed_count()) {
                closest = Some(mask);
            }
        }

        let target = *range.end();
        let mut mask = closest.unwrap_or_else(|| Self::initial_mask(target));
        self.hide_pairs(solution, &mut mask, target, false);
        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_valid(grid: &SolutionGrid) {
        // from_rows re-validates every unit
        assert!(SolutionGrid::from_rows(*grid.rows()).is_ok());
    }

    #[test]
    fn test_generate_valid_grids() {
        for seed in 0..20 {
            let mut generator = RandomGridGenerator::with_seed(seed);
            let grid = generator.generate().unwrap();
            assert_valid(&grid);
        }
    }

    #[test]
    fn test_seed_is_reproducible() {
        let a = RandomGridGenerator::with_seed(42).generate().unwrap();
        let b = RandomGridGenerator::with_seed(42).generate().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_mask_counts_follow_difficulty() {
        let solution = RandomGridGenerator::with_seed(3).generate().unwrap();
        let mut masks = SymmetricMaskGenerator::with_seed(9);

        for _ in 0..10 {
            let counts: Vec<usize> = Difficulty::all_levels()
                .iter()
                .map(|d| {
                    let count = masks.generate_mask(&solution, *d).revealed_count();
                    assert!(d.revealed_range().contains(&count), "{} revealed {}", d, count);
                    count
                })
                .collect();
            assert!(counts[0] > counts[1] && counts[1] > counts[2], "{:?}", counts);
        }
    }

    #[test]
    fn test_mask_symmetry() {
        let solution = RandomGridGenerator::with_seed(11).generate().unwrap();
        let mask = SymmetricMaskGenerator::with_seed(5).generate_mask(&solution, Difficulty::Medium);

        for pos in Position::all_9x9() {
            assert_eq!(
                mask.is_revealed(pos),
                mask.is_revealed(pos.rotated_180()),
                "Symmetry broken at {:?}",
                pos
            );
        }
    }

    #[test]
    fn test_unique_mode_keeps_single_solution() {
        let solution = RandomGridGenerator::with_seed(21).generate().unwrap();
        let mut masks = SymmetricMaskGenerator::with_seed(21).unique(true);
        let solver = Solver::new();

        for difficulty in [Difficulty::Easy, Difficulty::Medium] {
            let mask = masks.generate_mask(&solution, difficulty);
            let puzzle = SymmetricMaskGenerator::puzzle_of(&solution, &mask);
            assert!(solver.has_unique_solution(&puzzle), "{}", difficulty);
        }
    }

    #[test]
    fn test_unique_mode_counts_follow_difficulty() {
        for seed in 15..25 {
            let solution = RandomGridGenerator::with_seed(seed).generate().unwrap();
            let mut masks = SymmetricMaskGenerator::with_seed(seed).unique(true);

            let counts: Vec<usize> = Difficulty::all_levels()
                .iter()
                .map(|d| {
                    let mask = masks.generate_mask(&solution, *d);
                    let count = mask.revealed_count();
                    assert!(
                        d.revealed_range().contains(&count),
                        "seed {}: {} revealed {}",
                        seed,
                        d,
                        count
                    );
                    count
                })
                .collect();
            assert!(
                counts[0] > counts[1] && counts[1] > counts[2],
                "seed {}: {:?}",
                seed,
                counts
            );
        }
    }

    #[test]
    fn test_stuck_mask_is_finished_into_range() {
        let solution = RandomGridGenerator::with_seed(4).generate().unwrap();
        let mut masks = SymmetricMaskGenerator::with_seed(4);

        // A mask still above the hard range, as a stuck unique pass leaves it
        let mut mask = SymmetricMaskGenerator::initial_mask(41);
        masks.hide_pairs(&solution, &mut mask, 41, false);
        assert_eq!(mask.revealed_count(), 41);

        masks.hide_pairs(&solution, &mut mask, 29, false);
        assert!(Difficulty::Hard.revealed_range().contains(&mask.revealed_count()));
        for pos in Position::all_9x9() {
            assert_eq!(mask.is_revealed(pos), mask.is_revealed(pos.rotated_180()));
        }
    }
}
