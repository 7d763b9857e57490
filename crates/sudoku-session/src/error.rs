//! Error types for the session engine and its collaborators.

use sudoku_core::{GenerateError, GridError, Position};
use thiserror::Error;

/// Errors returned by [`PuzzleSession`](crate::PuzzleSession) operations.
///
/// Editing a revealed cell is not an error; it is reported through
/// [`MoveResult::RevealedCell`](crate::MoveResult::RevealedCell).
#[derive(Debug, Error)]
pub enum SessionError {
    /// Row or column outside `0..=8`.
    #[error("position ({row}, {col}) is outside the 9x9 board")]
    InvalidPosition { row: usize, col: usize },

    /// Value outside `1..=9`.
    #[error("value {0} is not a digit in 1..=9")]
    InvalidValue(u8),

    /// No puzzle has been started or resumed yet.
    #[error("no puzzle is loaded")]
    NotStarted,

    /// The session was disposed.
    #[error("session has been disposed")]
    Disposed,

    /// The grid generator kept failing.
    #[error("grid generation failed after {attempts} attempts")]
    Generation {
        attempts: u32,
        #[source]
        source: GenerateError,
    },
}

/// A stored record that cannot be turned back into a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("stored solution is invalid: {0}")]
    Solution(#[source] GridError),

    #[error("stored mask is invalid: {0}")]
    Mask(#[source] GridError),

    #[error("stored player grid is invalid: {0}")]
    Player(#[source] GridError),

    #[error("revealed cell {0} does not match the solution")]
    RevealedMismatch(Position),
}

/// Errors from a [`SessionStore`](crate::SessionStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("session store JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Errors from loading a [`SessionConfig`](crate::SessionConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = SessionError::InvalidPosition { row: 9, col: 2 };
        assert_eq!(err.to_string(), "position (9, 2) is outside the 9x9 board");

        let err = RecordError::RevealedMismatch(Position::new(1, 2));
        assert_eq!(err.to_string(), "revealed cell (1, 2) does not match the solution");
    }

    #[test]
    fn test_generation_keeps_source() {
        use std::error::Error as _;

        let err = SessionError::Generation {
            attempts: 3,
            source: GenerateError::Exhausted,
        };
        assert!(err.source().is_some());
    }

    #[test]
    fn test_json_error_from_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: StoreError = json_err.into();
        assert!(matches!(err, StoreError::Json(_)));
    }
}
