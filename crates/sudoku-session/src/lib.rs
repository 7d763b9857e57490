//! Sudoku puzzle session engine.
//!
//! A [`PuzzleSession`] owns one in-progress game: it generates puzzles,
//! applies player edits, runs the elapsed-time clock, publishes every change
//! through [`SessionWatch`] and writes each change through to a
//! [`SessionStore`], so a later [`PuzzleSession::activate`] resumes where the
//! player left off.
//!
//! ```no_run
//! use std::sync::Arc;
//! use sudoku_session::{JsonFileStore, PuzzleSession, SessionConfig};
//!
//! # async fn run() -> Result<(), sudoku_session::SessionError> {
//! let config = SessionConfig::default();
//! let store = Arc::new(JsonFileStore::new(config.store_path()));
//! let session = PuzzleSession::with_default_generators(config, store);
//!
//! session.activate().await?;
//! session.set_value(0, 2, 4)?;
//! session.dispose().await;
//! # Ok(())
//! # }
//! ```

mod config;
mod engine;
mod error;
mod observe;
mod record;
mod store;
mod timer;
mod writer;

pub use config::SessionConfig;
pub use engine::{Lifecycle, MoveResult, PuzzleSession, SessionSnapshot};
pub use error::{ConfigError, RecordError, SessionError, StoreError};
pub use observe::SessionWatch;
pub use record::SessionRecord;
pub use store::{JsonFileStore, MemoryStore, SessionStore, SESSION_SLOT};
