//! Play a persisted Sudoku session from the command line.
//!
//! Every invocation resumes the stored session (or starts one), applies a
//! single action, prints the board and writes the result back before exiting.

mod logging;
mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use sudoku_core::Difficulty;
use sudoku_session::{JsonFileStore, MoveResult, PuzzleSession, SessionConfig};
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "sudoku-session",
    version,
    about = "Resumable Sudoku sessions with a running clock"
)]
struct Cli {
    /// JSON config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Session file; overrides the config's store path.
    #[arg(long, global = true)]
    store: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Discard the current session and generate a new puzzle.
    New {
        /// easy, medium or hard (defaults to the configured difficulty).
        #[arg(short, long)]
        difficulty: Option<Difficulty>,
    },
    /// Print the current board.
    Show,
    /// Write a digit into a cell (rows and columns are 0-8).
    Set { row: usize, col: usize, value: u8 },
    /// Blank a cell.
    Clear { row: usize, col: usize },
    /// Fill a cell with its solution value.
    Hint { row: usize, col: usize },
    /// Toggle the selection on a cell.
    Select { row: usize, col: usize },
    /// Reset the board to its starting state, keeping the clock.
    Restart,
    /// Let the clock run for a while, then stop it.
    Play {
        #[arg(long, default_value_t = 5)]
        seconds: u64,
    },
}

#[tokio::main]
async fn main() {
    logging::init();
    if let Err(err) = run().await {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => SessionConfig::default(),
    };
    if let Some(store) = cli.store {
        config.store_path = Some(store);
    }
    let store_path = config.store_path();
    debug!(path = %store_path.display(), "using session store");

    let session =
        PuzzleSession::with_default_generators(config, Arc::new(JsonFileStore::new(store_path)));
    let outcome = execute(&session, cli.command).await;
    let snapshot = session.snapshot();
    session.dispose().await;

    if let Some(message) = outcome? {
        println!("{message}");
    }
    if let Some(snapshot) = snapshot {
        print!("{}", render::board(&snapshot));
    }
    Ok(())
}

/// Apply one command. Returns a note for the player, if there is one.
async fn execute(session: &PuzzleSession, command: Command) -> Result<Option<String>> {
    if let Command::New { difficulty } = command {
        let difficulty = difficulty.unwrap_or(session.config().default_difficulty);
        session
            .start_new_game(difficulty)
            .await
            .context("start new game")?;
        return Ok(None);
    }

    session.activate().await.context("open session")?;
    let result = match command {
        Command::New { .. } | Command::Show => return Ok(None),
        Command::Set { row, col, value } => session.set_value(row, col, value)?,
        Command::Clear { row, col } => session.clear_value(row, col)?,
        Command::Hint { row, col } => session.reveal_hint(row, col)?,
        Command::Select { row, col } => {
            session.select_cell(row, col)?;
            return Ok(None);
        }
        Command::Restart => {
            session.restart_current_puzzle()?;
            return Ok(None);
        }
        Command::Play { seconds } => {
            tokio::time::sleep(Duration::from_secs(seconds)).await;
            session.stop_timer();
            return Ok(None);
        }
    };
    Ok(describe(result, session))
}

fn describe(result: MoveResult, session: &PuzzleSession) -> Option<String> {
    match result {
        MoveResult::Applied => None,
        MoveResult::RevealedCell => Some("That cell is part of the puzzle.".to_string()),
        MoveResult::AlreadyCompleted => {
            Some("This puzzle is already solved; start a new one.".to_string())
        }
        MoveResult::Completed => {
            let elapsed = session.snapshot().map_or(0, |s| s.elapsed_secs);
            Some(format!("Solved in {}!", render::format_time(elapsed)))
        }
    }
}
