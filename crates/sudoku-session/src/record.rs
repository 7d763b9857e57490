//! Durable form of a session and the in-memory board it decodes into.

use crate::error::RecordError;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use sudoku_core::{Difficulty, PlayerGrid, SolutionGrid, VisibilityMask};

/// One persisted session. Boards are stored as 81-character compact strings
/// (see [`SolutionGrid::to_string_compact`] and friends).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub solution: String,
    pub mask: String,
    pub player: String,
    pub difficulty: Difficulty,
    pub elapsed_secs: u64,
    pub is_completed: bool,
    /// Unix timestamp in milliseconds
    pub completed_at: Option<u64>,
    /// Unix timestamp in milliseconds, set when the puzzle was generated
    pub created_at: u64,
}

impl SessionRecord {
    /// Rebuild the board, checking every stored grid and the revealed-cell
    /// invariant. The mutability map comes from the mask alone.
    pub(crate) fn decode(&self) -> Result<Board, RecordError> {
        let solution = SolutionGrid::from_string(&self.solution).map_err(RecordError::Solution)?;
        let mask = VisibilityMask::from_string(&self.mask).map_err(RecordError::Mask)?;
        let player = PlayerGrid::from_string(&self.player).map_err(RecordError::Player)?;

        if let Some(pos) = player.first_revealed_mismatch(&solution, &mask) {
            return Err(RecordError::RevealedMismatch(pos));
        }

        Ok(Board {
            solution,
            mask,
            player,
            difficulty: self.difficulty,
            elapsed_secs: self.elapsed_secs,
            created_at: self.created_at,
            completed_at: if self.is_completed {
                Some(self.completed_at.unwrap_or(self.created_at))
            } else {
                None
            },
        })
    }
}

/// The authoritative board of a live session
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Board {
    pub solution: SolutionGrid,
    pub mask: VisibilityMask,
    pub player: PlayerGrid,
    pub difficulty: Difficulty,
    pub elapsed_secs: u64,
    pub created_at: u64,
    pub completed_at: Option<u64>,
}

impl Board {
    /// A fresh board: revealed cells copied from the solution, clock at zero
    pub fn new(solution: SolutionGrid, mask: VisibilityMask, difficulty: Difficulty) -> Self {
        let player = PlayerGrid::from_solution(&solution, &mask);
        Self {
            solution,
            mask,
            player,
            difficulty,
            elapsed_secs: 0,
            created_at: now_millis(),
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            solution: self.solution.to_string_compact(),
            mask: self.mask.to_string_compact(),
            player: self.player.to_string_compact(),
            difficulty: self.difficulty,
            elapsed_secs: self.elapsed_secs,
            is_completed: self.is_completed(),
            completed_at: self.completed_at,
            created_at: self.created_at,
        }
    }
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
