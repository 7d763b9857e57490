//! Session persistence backends.
//!
//! Every store holds a single slot ([`SESSION_SLOT`]): inserting a record
//! replaces whatever was there, so at most one unfinished session exists at
//! any time. Completed records stay in the slot until superseded but are
//! never reported as unfinished.

use crate::error::StoreError;
use crate::record::SessionRecord;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Key of the one slot a store keeps. Both backends file the record under it.
pub const SESSION_SLOT: &str = "session";

/// Durable storage for the current session
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The stored record, if it exists and is not completed
    async fn load_unfinished(&self) -> Result<Option<SessionRecord>, StoreError>;

    /// Replace the slot's content with `record`
    async fn insert_or_replace(&self, record: &SessionRecord) -> Result<(), StoreError>;
}

/// In-process store, for tests and for hosts that persist elsewhere
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, SessionRecord>>,
    writes: Mutex<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose slot already holds `record`
    pub fn with_record(record: SessionRecord) -> Self {
        Self {
            slots: Mutex::new(HashMap::from([(SESSION_SLOT.to_string(), record)])),
            writes: Mutex::new(0),
        }
    }

    /// The slot content, completed or not
    pub fn record(&self) -> Option<SessionRecord> {
        self.slots.lock().get(SESSION_SLOT).cloned()
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> u64 {
        *self.writes.lock()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load_unfinished(&self) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.record().filter(|r| !r.is_completed))
    }

    async fn insert_or_replace(&self, record: &SessionRecord) -> Result<(), StoreError> {
        self.slots
            .lock()
            .insert(SESSION_SLOT.to_string(), record.clone());
        *self.writes.lock() += 1;
        Ok(())
    }
}

/// Keeps the slot as one pretty-printed JSON file, an object with the record
/// under [`SESSION_SLOT`]. Writes go to a sibling
/// temp file first and are renamed into place, so a crash mid-write leaves the
/// previous record intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SessionStore for JsonFileStore {
    async fn load_unfinished(&self) -> Result<Option<SessionRecord>, StoreError> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let mut slots: BTreeMap<String, SessionRecord> = serde_json::from_str(&json)?;
        Ok(slots.remove(SESSION_SLOT).filter(|r| !r.is_completed))
    }

    async fn insert_or_replace(&self, record: &SessionRecord) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let slots = BTreeMap::from([(SESSION_SLOT, record)]);
        let json = serde_json::to_string_pretty(&slots)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, json).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        debug!(path = %self.path.display(), elapsed = record.elapsed_secs, "session saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sudoku_core::Difficulty;

    fn record(elapsed_secs: u64) -> SessionRecord {
        SessionRecord {
            solution: "534678912672195348198342567859761423426853791713924856961537284287419635345286179"
                .to_string(),
            mask: "1".repeat(81),
            player: "534678912672195348198342567859761423426853791713924856961537284287419635345286179"
                .to_string(),
            difficulty: Difficulty::Easy,
            elapsed_secs,
            is_completed: false,
            completed_at: None,
            created_at: 1,
        }
    }

    #[tokio::test]
    async fn test_memory_store_supersedes() {
        let store = MemoryStore::new();
        assert_eq!(store.load_unfinished().await.unwrap(), None);

        store.insert_or_replace(&record(1)).await.unwrap();
        store.insert_or_replace(&record(2)).await.unwrap();
        assert_eq!(store.load_unfinished().await.unwrap(), Some(record(2)));
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn test_completed_record_is_not_unfinished() {
        let mut done = record(9);
        done.is_completed = true;
        let store = MemoryStore::with_record(done.clone());
        assert_eq!(store.load_unfinished().await.unwrap(), None);
        assert_eq!(store.record(), Some(done));
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("slot.json"));
        assert_eq!(store.load_unfinished().await.unwrap(), None);

        store.insert_or_replace(&record(3)).await.unwrap();
        store.insert_or_replace(&record(4)).await.unwrap();
        assert_eq!(store.load_unfinished().await.unwrap(), Some(record(4)));
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn test_records_are_filed_under_the_slot_key() {
        let memory = MemoryStore::new();
        memory.insert_or_replace(&record(5)).await.unwrap();
        assert_eq!(memory.slots.lock().keys().collect::<Vec<_>>(), vec![SESSION_SLOT]);

        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("slot.json"));
        store.insert_or_replace(&record(5)).await.unwrap();

        let json = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert_eq!(object[SESSION_SLOT]["elapsed_secs"], 5);
    }

    #[tokio::test]
    async fn test_file_store_ignores_other_slots() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slot.json");
        let other = serde_json::json!({ "archived": record(7) });
        std::fs::write(&path, other.to_string()).unwrap();

        let store = JsonFileStore::new(path);
        assert_eq!(store.load_unfinished().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_reports_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slot.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::new(path);
        assert!(matches!(
            store.load_unfinished().await,
            Err(StoreError::Json(_))
        ));
    }
}
