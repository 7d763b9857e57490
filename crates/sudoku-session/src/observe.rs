//! Observable session state.
//!
//! One `watch` channel per field: subscribers always see the latest value and
//! never a backlog. Values are published inside the mutation that produced
//! them; persistence may land later.

use crate::record::Board;
use sudoku_core::{Difficulty, PlayerGrid, Position, SolutionGrid, VisibilityMask};
use tokio::sync::watch;

/// Receivers for every observable field. Each can be awaited independently;
/// all of them close once the session is disposed.
#[derive(Debug, Clone)]
pub struct SessionWatch {
    /// The solution, for checking and hints only. Never show it to the player.
    pub solution: watch::Receiver<Option<SolutionGrid>>,
    pub player: watch::Receiver<Option<PlayerGrid>>,
    /// Originally revealed cells; everything else is writable
    pub revealed: watch::Receiver<Option<VisibilityMask>>,
    pub selected: watch::Receiver<Option<Position>>,
    pub difficulty: watch::Receiver<Difficulty>,
    pub elapsed_secs: watch::Receiver<u64>,
    pub completed: watch::Receiver<bool>,
}

pub(crate) struct Channels {
    solution: watch::Sender<Option<SolutionGrid>>,
    player: watch::Sender<Option<PlayerGrid>>,
    revealed: watch::Sender<Option<VisibilityMask>>,
    selected: watch::Sender<Option<Position>>,
    difficulty: watch::Sender<Difficulty>,
    elapsed_secs: watch::Sender<u64>,
    completed: watch::Sender<bool>,
}

impl Channels {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            solution: watch::Sender::new(None),
            player: watch::Sender::new(None),
            revealed: watch::Sender::new(None),
            selected: watch::Sender::new(None),
            difficulty: watch::Sender::new(difficulty),
            elapsed_secs: watch::Sender::new(0),
            completed: watch::Sender::new(false),
        }
    }

    pub fn subscribe(&self) -> SessionWatch {
        SessionWatch {
            solution: self.solution.subscribe(),
            player: self.player.subscribe(),
            revealed: self.revealed.subscribe(),
            selected: self.selected.subscribe(),
            difficulty: self.difficulty.subscribe(),
            elapsed_secs: self.elapsed_secs.subscribe(),
            completed: self.completed.subscribe(),
        }
    }

    pub fn publish_board(&self, board: &Board) {
        set(&self.solution, Some(board.solution.clone()));
        set(&self.revealed, Some(board.mask));
        set(&self.difficulty, board.difficulty);
        self.publish_progress(board);
    }

    /// Fields a move or a tick can change
    pub fn publish_progress(&self, board: &Board) {
        set(&self.player, Some(board.player));
        set(&self.elapsed_secs, board.elapsed_secs);
        set(&self.completed, board.is_completed());
    }

    pub fn publish_selected(&self, selected: Option<Position>) {
        set(&self.selected, selected);
    }
}

/// Store `value`, waking receivers only when it actually changed
fn set<T: PartialEq>(tx: &watch::Sender<T>, value: T) {
    tx.send_if_modified(|current| {
        if *current == value {
            false
        } else {
            *current = value;
            true
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_subscriber_sees_latest_value() {
        let channels = Channels::new(Difficulty::Easy);
        channels.publish_selected(Some(Position::new(1, 1)));
        channels.publish_selected(Some(Position::new(2, 2)));

        let watch = channels.subscribe();
        assert_eq!(*watch.selected.borrow(), Some(Position::new(2, 2)));
        assert_eq!(*watch.difficulty.borrow(), Difficulty::Easy);
    }

    #[tokio::test]
    async fn test_unchanged_value_does_not_notify() {
        let channels = Channels::new(Difficulty::Easy);
        let mut watch = channels.subscribe();
        watch.selected.borrow_and_update();

        channels.publish_selected(None);
        assert!(!watch.selected.has_changed().unwrap());

        channels.publish_selected(Some(Position::new(0, 0)));
        assert!(watch.selected.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_dropping_channels_closes_receivers() {
        let channels = Channels::new(Difficulty::Hard);
        let mut watch = channels.subscribe();
        drop(channels);
        assert!(watch.elapsed_secs.changed().await.is_err());
    }
}
