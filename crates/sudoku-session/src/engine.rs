//! The puzzle session engine.
//!
//! [`PuzzleSession`] is the single owner of session state. Every operation,
//! and every timer tick, runs its read-modify-publish-enqueue step under one
//! mutex, so player moves and ticks never interleave and the persistence
//! queue sees records in the order the state changed.

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::observe::{Channels, SessionWatch};
use crate::record::{now_millis, Board};
use crate::store::SessionStore;
use crate::timer::SessionTimer;
use crate::writer::PersistWriter;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use sudoku_core::{
    Cell, Difficulty, GenerateError, GridGenerator, MaskGenerator, PlayerGrid, Position,
    RandomGridGenerator, SolutionGrid, SymmetricMaskGenerator, VisibilityMask,
};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Nothing started or resumed yet
    Uninitialized,
    /// A board is loaded and the clock is ticking
    Running,
    /// A board is loaded, the clock is stopped
    Stopped,
    /// Torn down; no further changes or writes
    Disposed,
}

/// Outcome of a cell edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveResult {
    /// The cell was updated
    Applied,
    /// The cell was updated and the board now matches the solution
    Completed,
    /// The cell is part of the puzzle; nothing changed
    RevealedCell,
    /// The puzzle is already solved; nothing changed
    AlreadyCompleted,
}

/// A point-in-time copy of the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub solution: SolutionGrid,
    pub mask: VisibilityMask,
    pub player: PlayerGrid,
    pub difficulty: Difficulty,
    pub elapsed_secs: u64,
    pub selected: Option<Position>,
    pub completed: bool,
}

struct Generators {
    grid: Box<dyn GridGenerator>,
    mask: Box<dyn MaskGenerator>,
}

impl Generators {
    fn generate(
        &mut self,
        difficulty: Difficulty,
        attempts: u32,
    ) -> Result<(SolutionGrid, VisibilityMask), SessionError> {
        let mut last_error = GenerateError::Exhausted;

        for attempt in 1..=attempts {
            match self.grid.generate() {
                Ok(solution) => {
                    let mask = self.mask.generate_mask(&solution, difficulty);
                    return Ok((solution, mask));
                }
                Err(err) => {
                    warn!(attempt, error = %err, "grid generation failed");
                    last_error = err;
                }
            }
        }
        Err(SessionError::Generation {
            attempts,
            source: last_error,
        })
    }
}

struct SessionState {
    board: Option<Board>,
    selected: Option<Position>,
    lifecycle: Lifecycle,
    timer: Option<SessionTimer>,
    channels: Option<Channels>,
    writer: Option<PersistWriter>,
}

impl SessionState {
    fn ensure_live(&self) -> Result<(), SessionError> {
        match self.lifecycle {
            Lifecycle::Disposed => Err(SessionError::Disposed),
            _ => Ok(()),
        }
    }

    fn board_mut(&mut self) -> Result<&mut Board, SessionError> {
        self.ensure_live()?;
        self.board.as_mut().ok_or(SessionError::NotStarted)
    }

    fn persist(&self) {
        if let (Some(board), Some(writer)) = (&self.board, &self.writer) {
            writer.save(board.to_record());
        }
    }

    fn publish_board(&self) {
        if let (Some(board), Some(channels)) = (&self.board, &self.channels) {
            channels.publish_board(board);
        }
    }

    fn publish_progress(&self) {
        if let (Some(board), Some(channels)) = (&self.board, &self.channels) {
            channels.publish_progress(board);
        }
    }

    fn select(&mut self, selected: Option<Position>) {
        self.selected = selected;
        if let Some(channels) = &self.channels {
            channels.publish_selected(selected);
        }
    }

    /// Replace the board and clear the selection
    fn install(&mut self, board: Board) {
        self.board = Some(board);
        self.select(None);
        self.publish_board();
    }

    fn stop_timer(&mut self) -> Option<JoinHandle<()>> {
        if self.lifecycle == Lifecycle::Running {
            self.lifecycle = Lifecycle::Stopped;
        }
        self.timer.take().map(SessionTimer::stop)
    }

    /// One timer tick. Returns false when the ticker should end.
    fn tick(&mut self, token: &CancellationToken) -> bool {
        // Re-checked under the lock: a stop that won the race wins outright
        if token.is_cancelled() || self.lifecycle != Lifecycle::Running {
            return false;
        }
        let Some(board) = self.board.as_mut() else {
            return false;
        };
        board.elapsed_secs += 1;
        let elapsed = board.elapsed_secs;

        self.publish_progress();
        self.persist();
        debug!(elapsed, "tick");
        true
    }
}

/// The puzzle session engine.
///
/// Construct it inside a tokio runtime: the persistence writer and the timer
/// run as tasks on the runtime captured by [`PuzzleSession::new`].
pub struct PuzzleSession {
    config: SessionConfig,
    runtime: Handle,
    state: Arc<Mutex<SessionState>>,
    generators: Arc<Mutex<Generators>>,
    store: Arc<dyn SessionStore>,
    writer_task: Mutex<Option<JoinHandle<()>>>,
    failed_writes: Arc<AtomicU64>,
}

impl PuzzleSession {
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new(
        config: SessionConfig,
        grid_generator: impl GridGenerator + 'static,
        mask_generator: impl MaskGenerator + 'static,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let runtime = Handle::current();
        let failed_writes = Arc::new(AtomicU64::new(0));
        let (writer, writer_task) =
            PersistWriter::spawn(&runtime, store.clone(), failed_writes.clone());

        let state = SessionState {
            board: None,
            selected: None,
            lifecycle: Lifecycle::Uninitialized,
            timer: None,
            channels: Some(Channels::new(config.default_difficulty)),
            writer: Some(writer),
        };

        Self {
            config,
            runtime,
            state: Arc::new(Mutex::new(state)),
            generators: Arc::new(Mutex::new(Generators {
                grid: Box::new(grid_generator),
                mask: Box::new(mask_generator),
            })),
            store,
            writer_task: Mutex::new(Some(writer_task)),
            failed_writes,
        }
    }

    /// An engine with the random grid generator and the symmetric mask
    /// generator (unique mode per `config.unique_puzzles`)
    pub fn with_default_generators(config: SessionConfig, store: Arc<dyn SessionStore>) -> Self {
        let masks = SymmetricMaskGenerator::new().unique(config.unique_puzzles);
        Self::new(config, RandomGridGenerator::new(), masks, store)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Resume the stored unfinished session, or start a new one.
    ///
    /// A record that fails to decode is discarded and replaced by a new game
    /// at the record's difficulty; a store that can't be read gives a new
    /// game at the default difficulty.
    pub async fn activate(&self) -> Result<(), SessionError> {
        {
            let mut state = self.state.lock();
            state.ensure_live()?;
            state.stop_timer();
        }
        // Queued writes must land first or the store still holds an older record
        self.flush().await;

        let difficulty = match self.store.load_unfinished().await {
            Ok(Some(record)) => match record.decode() {
                Ok(board) => return self.resume(board),
                Err(err) => {
                    warn!(error = %err, "stored session is corrupt, starting a new game");
                    record.difficulty
                }
            },
            Ok(None) => {
                info!("no unfinished session, starting a new game");
                self.config.default_difficulty
            }
            Err(err) => {
                warn!(error = %err, "failed to read stored session, starting a new game");
                self.config.default_difficulty
            }
        };
        self.start_new_game(difficulty).await
    }

    fn resume(&self, board: Board) -> Result<(), SessionError> {
        let mut state = self.state.lock();
        state.ensure_live()?;

        info!(
            difficulty = %board.difficulty,
            elapsed = board.elapsed_secs,
            "resumed session"
        );
        let completed = board.is_completed();
        state.install(board);
        if completed {
            state.lifecycle = Lifecycle::Stopped;
        } else {
            self.start_timer(&mut state);
        }
        Ok(())
    }

    /// Generate a new puzzle and make it the current session. On error the
    /// previous session is left as it was.
    ///
    /// Generation (including the unique-solution search) runs on the blocking
    /// pool; the session stays usable while it runs.
    pub async fn start_new_game(&self, difficulty: Difficulty) -> Result<(), SessionError> {
        self.state.lock().ensure_live()?;
        let (solution, mask) = self.generate(difficulty).await?;
        let board = Board::new(solution, mask, difficulty);

        let mut state = self.state.lock();
        state.ensure_live()?;
        info!(%difficulty, revealed = board.mask.revealed_count(), "starting new game");
        state.install(board);
        state.persist();
        self.start_timer(&mut state);
        Ok(())
    }

    /// Same as [`start_new_game`](Self::start_new_game): a full regeneration
    pub async fn change_difficulty(&self, difficulty: Difficulty) -> Result<(), SessionError> {
        self.start_new_game(difficulty).await
    }

    async fn generate(
        &self,
        difficulty: Difficulty,
    ) -> Result<(SolutionGrid, VisibilityMask), SessionError> {
        let generators = self.generators.clone();
        let attempts = self.config.generation_attempts.max(1);
        let task = self
            .runtime
            .spawn_blocking(move || {
                let mut generators = generators.lock();
                generators.generate(difficulty, attempts)
            });

        match task.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            // The runtime is shutting down
            Err(_) => Err(SessionError::Disposed),
        }
    }

    /// Toggle the selection: select `(row, col)`, or clear it if it was
    /// already selected. Returns the new selection.
    pub fn select_cell(&self, row: usize, col: usize) -> Result<Option<Position>, SessionError> {
        let pos = position(row, col)?;
        let mut state = self.state.lock();
        state.ensure_live()?;

        let selected = if state.selected == Some(pos) { None } else { Some(pos) };
        state.select(selected);
        Ok(selected)
    }

    /// Write `value` into a writable cell. The value is not checked against
    /// the solution.
    pub fn set_value(&self, row: usize, col: usize, value: u8) -> Result<MoveResult, SessionError> {
        let pos = position(row, col)?;
        let cell = Cell::filled(value).ok_or(SessionError::InvalidValue(value))?;
        self.edit_cell(pos, |_| cell)
    }

    /// Blank a writable cell
    pub fn clear_value(&self, row: usize, col: usize) -> Result<MoveResult, SessionError> {
        let pos = position(row, col)?;
        self.edit_cell(pos, |_| Cell::Blank)
    }

    /// Fill a writable cell with its solution value
    pub fn reveal_hint(&self, row: usize, col: usize) -> Result<MoveResult, SessionError> {
        let pos = position(row, col)?;
        self.edit_cell(pos, |board| Cell::Filled(board.solution.digit(pos)))
    }

    fn edit_cell(
        &self,
        pos: Position,
        new_cell: impl FnOnce(&Board) -> Cell,
    ) -> Result<MoveResult, SessionError> {
        let mut state = self.state.lock();
        let board = state.board_mut()?;

        if board.mask.is_revealed(pos) {
            return Ok(MoveResult::RevealedCell);
        }
        if board.is_completed() {
            return Ok(MoveResult::AlreadyCompleted);
        }

        let cell = new_cell(board);
        board.player.set(pos, cell);
        let completed = board.player.matches_solution(&board.solution);
        if completed {
            board.completed_at = Some(now_millis());
            info!(elapsed = board.elapsed_secs, "puzzle completed");
            // Stopped before the write so the completion record carries the final time
            state.stop_timer();
        }
        state.publish_progress();
        state.persist();

        Ok(if completed {
            MoveResult::Completed
        } else {
            MoveResult::Applied
        })
    }

    /// Put the board back to its starting state. The solution, mask and
    /// elapsed time are kept; the clock resumes from where it was.
    pub fn restart_current_puzzle(&self) -> Result<(), SessionError> {
        let mut state = self.state.lock();
        let board = state.board_mut()?;
        board.player = PlayerGrid::from_solution(&board.solution, &board.mask);
        board.completed_at = None;

        state.select(None);
        state.publish_progress();
        self.start_timer(&mut state);
        state.persist();
        info!("restarted current puzzle");
        Ok(())
    }

    /// Halt the clock and persist the final elapsed time. Idempotent.
    pub fn stop_timer(&self) {
        let mut state = self.state.lock();
        if state.lifecycle == Lifecycle::Disposed {
            return;
        }
        state.stop_timer();
        state.persist();
    }

    /// Stop the clock, persist, and tear down the observers and the write
    /// queue. Returns once every queued write has reached the store; nothing
    /// is written afterwards.
    pub async fn dispose(&self) {
        let (timer, writer) = {
            let mut state = self.state.lock();
            if state.lifecycle == Lifecycle::Disposed {
                return;
            }
            let timer = state.stop_timer();
            state.persist();
            state.lifecycle = Lifecycle::Disposed;
            state.channels = None;
            (timer, state.writer.take())
        };
        drop(writer);

        if let Some(timer) = timer {
            let _ = timer.await;
        }
        let writer_task = self.writer_task.lock().take();
        if let Some(task) = writer_task {
            if let Err(err) = task.await {
                warn!(error = %err, "persistence task ended abnormally");
            }
        }
        info!("session disposed");
    }

    /// Wait until every write queued so far has been attempted
    pub async fn flush(&self) {
        let done = self.state.lock().writer.as_ref().and_then(PersistWriter::flush);
        if let Some(done) = done {
            let _ = done.await;
        }
    }

    /// Subscribe to the observable state
    pub fn observe(&self) -> Result<SessionWatch, SessionError> {
        self.state
            .lock()
            .channels
            .as_ref()
            .map(Channels::subscribe)
            .ok_or(SessionError::Disposed)
    }

    /// Copy of the current session, if a board is loaded
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        let state = self.state.lock();
        state.board.as_ref().map(|board| SessionSnapshot {
            solution: board.solution.clone(),
            mask: board.mask,
            player: board.player,
            difficulty: board.difficulty,
            elapsed_secs: board.elapsed_secs,
            selected: state.selected,
            completed: board.is_completed(),
        })
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.state.lock().lifecycle
    }

    /// Number of writes the store rejected
    pub fn failed_writes(&self) -> u64 {
        self.failed_writes.load(Ordering::Relaxed)
    }

    /// Replace any running ticker with a fresh one
    fn start_timer(&self, state: &mut SessionState) {
        // The old task exits on its own once cancelled
        drop(state.stop_timer());

        let weak: Weak<Mutex<SessionState>> = Arc::downgrade(&self.state);
        let timer = SessionTimer::start(&self.runtime, self.config.tick_interval(), move |token| {
            let Some(state) = weak.upgrade() else {
                return false;
            };
            let keep_going = state.lock().tick(token);
            keep_going
        });
        state.timer = Some(timer);
        state.lifecycle = Lifecycle::Running;
    }
}

impl Drop for PuzzleSession {
    fn drop(&mut self) {
        if let Some(timer) = self.state.lock().timer.take() {
            timer.cancel();
        }
    }
}

fn position(row: usize, col: usize) -> Result<Position, SessionError> {
    Position::try_new(row, col).ok_or(SessionError::InvalidPosition { row, col })
}
