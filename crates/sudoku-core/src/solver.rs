//! Backtracking solver over plain `[[u8; 9]; 9]` boards (0 = empty).
//!
//! Used by the generators: to complete a randomly seeded grid, and to check
//! that a masked puzzle still has exactly one solution.

use rand::seq::SliceRandom;
use rand::Rng;

const ALL_DIGITS: u16 = 0b11_1111_1110;

/// Unit struct solver, stateless; all state is per-call.
pub struct Solver;

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver {
    pub fn new() -> Self {
        Self
    }

    /// Solve the puzzle, returning the first solution found
    pub fn solve(&self, puzzle: &[[u8; 9]; 9]) -> Option<[[u8; 9]; 9]> {
        let mut search = Search::new(puzzle)?;
        search.fill_with(&mut |_| {}).then_some(search.cells)
    }

    /// Count solutions up to a limit
    pub fn count_solutions(&self, puzzle: &[[u8; 9]; 9], limit: usize) -> usize {
        let Some(mut search) = Search::new(puzzle) else {
            return 0;
        };
        let mut count = 0;
        search.count(&mut count, limit);
        count
    }

    /// Check if the puzzle has exactly one solution
    pub fn has_unique_solution(&self, puzzle: &[[u8; 9]; 9]) -> bool {
        self.count_solutions(puzzle, 2) == 1
    }
}

/// Complete `cells` in place, trying candidates in random order.
/// Returns false if the givens admit no completion.
pub(crate) fn fill_random<R: Rng + ?Sized>(cells: &mut [[u8; 9]; 9], rng: &mut R) -> bool {
    let Some(mut search) = Search::new(cells) else {
        return false;
    };
    if search.fill_with(&mut |digits| digits.shuffle(rng)) {
        *cells = search.cells;
        true
    } else {
        false
    }
}

struct Search {
    cells: [[u8; 9]; 9],
    rows: [u16; 9],
    cols: [u16; 9],
    boxes: [u16; 9],
}

impl Search {
    /// Set up the search; `None` when the givens already conflict
    fn new(puzzle: &[[u8; 9]; 9]) -> Option<Self> {
        let mut search = Self {
            cells: [[0; 9]; 9],
            rows: [0; 9],
            cols: [0; 9],
            boxes: [0; 9],
        };
        for row in 0..9 {
            for col in 0..9 {
                let value = puzzle[row][col];
                if value == 0 {
                    continue;
                }
                if value > 9 || search.candidates(row, col) & (1 << value) == 0 {
                    return None;
                }
                search.place(row, col, value);
            }
        }
        Some(search)
    }

    fn candidates(&self, row: usize, col: usize) -> u16 {
        !(self.rows[row] | self.cols[col] | self.boxes[box_of(row, col)]) & ALL_DIGITS
    }

    fn place(&mut self, row: usize, col: usize, value: u8) {
        let bit = 1 << value;
        self.cells[row][col] = value;
        self.rows[row] |= bit;
        self.cols[col] |= bit;
        self.boxes[box_of(row, col)] |= bit;
    }

    fn unplace(&mut self, row: usize, col: usize, value: u8) {
        let bit = !(1 << value);
        self.cells[row][col] = 0;
        self.rows[row] &= bit;
        self.cols[col] &= bit;
        self.boxes[box_of(row, col)] &= bit;
    }

    /// Empty cell with the fewest candidates, or `None` when the board is full
    fn most_constrained(&self) -> Option<(usize, usize, u16)> {
        let mut best: Option<(usize, usize, u16)> = None;
        for row in 0..9 {
            for col in 0..9 {
                if self.cells[row][col] != 0 {
                    continue;
                }
                let candidates = self.candidates(row, col);
                let better = best.map_or(true, |(_, _, b)| candidates.count_ones() < b.count_ones());
                if better {
                    if candidates == 0 {
                        return Some((row, col, 0));
                    }
                    best = Some((row, col, candidates));
                }
            }
        }
        best
    }

    fn fill_with(&mut self, order: &mut dyn FnMut(&mut Vec<u8>)) -> bool {
        let Some((row, col, candidates)) = self.most_constrained() else {
            return true;
        };
        let mut digits = digits_of(candidates);
        order(&mut digits);
        for value in digits {
            self.place(row, col, value);
            if self.fill_with(order) {
                return true;
            }
            self.unplace(row, col, value);
        }
        false
    }

    fn count(&mut self, count: &mut usize, limit: usize) {
        if *count >= limit {
            return;
        }
        let Some((row, col, candidates)) = self.most_constrained() else {
            *count += 1;
            return;
        };
        for value in digits_of(candidates) {
            self.place(row, col, value);
            self.count(count, limit);
            self.unplace(row, col, value);
            if *count >= limit {
                return;
            }
        }
    }
}

fn box_of(row: usize, col: usize) -> usize {
    (row / 3) * 3 + col / 3
}

fn digits_of(mask: u16) -> Vec<u8> {
    (1..=9u8).filter(|d| mask & (1 << d) != 0).collect()
}
