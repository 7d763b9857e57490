//! Single-writer persistence queue.
//!
//! The engine snapshots a record while holding its state lock and pushes it
//! here, so records reach the store in mutation order and the last write is
//! always the latest state. Failures are logged and counted; they never reach
//! the in-memory session.

use crate::record::SessionRecord;
use crate::store::SessionStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

enum WriteCommand {
    Save(Box<SessionRecord>),
    Flush(oneshot::Sender<()>),
}

/// Sending half of the queue. Dropping it lets the writer task drain and exit.
pub(crate) struct PersistWriter {
    tx: mpsc::UnboundedSender<WriteCommand>,
}

impl PersistWriter {
    pub fn spawn(
        runtime: &Handle,
        store: Arc<dyn SessionStore>,
        failures: Arc<AtomicU64>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = runtime.spawn(run(rx, store, failures));
        (Self { tx }, task)
    }

    pub fn save(&self, record: SessionRecord) {
        if self.tx.send(WriteCommand::Save(Box::new(record))).is_err() {
            warn!("persistence queue closed, dropping session write");
        }
    }

    /// Resolves once every write queued before this call has been attempted
    pub fn flush(&self) -> Option<oneshot::Receiver<()>> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx.send(WriteCommand::Flush(done_tx)).ok()?;
        Some(done_rx)
    }
}

async fn run(
    mut rx: mpsc::UnboundedReceiver<WriteCommand>,
    store: Arc<dyn SessionStore>,
    failures: Arc<AtomicU64>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            WriteCommand::Save(record) => match store.insert_or_replace(&record).await {
                Ok(()) => debug!(elapsed = record.elapsed_secs, "session persisted"),
                Err(err) => {
                    let total = failures.fetch_add(1, Ordering::Relaxed) + 1;
                    warn!(error = %err, failed_writes = total, "failed to persist session");
                }
            },
            WriteCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("persistence queue drained");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use sudoku_core::Difficulty;

    fn record(elapsed_secs: u64) -> SessionRecord {
        SessionRecord {
            solution: String::new(),
            mask: String::new(),
            player: String::new(),
            difficulty: Difficulty::Medium,
            elapsed_secs,
            is_completed: false,
            completed_at: None,
            created_at: 0,
        }
    }

    #[tokio::test]
    async fn test_writes_land_in_order() {
        let store = Arc::new(MemoryStore::new());
        let failures = Arc::new(AtomicU64::new(0));
        let (writer, task) = PersistWriter::spawn(&Handle::current(), store.clone(), failures);

        for elapsed in 1..=5 {
            writer.save(record(elapsed));
        }
        writer.flush().unwrap().await.unwrap();
        assert_eq!(store.write_count(), 5);
        assert_eq!(store.record().map(|r| r.elapsed_secs), Some(5));

        drop(writer);
        task.await.unwrap();
    }
}
