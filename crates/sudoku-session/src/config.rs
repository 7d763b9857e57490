use crate::error::ConfigError;
use crate::store::SESSION_SLOT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use sudoku_core::Difficulty;

/// Engine configuration. Missing fields in a config file fall back to the
/// defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Timer period in milliseconds
    pub tick_interval_ms: u64,
    /// Difficulty used when there is nothing to resume
    pub default_difficulty: Difficulty,
    /// Grid generator attempts before a new game fails
    pub generation_attempts: u32,
    /// Only hide cells while the puzzle keeps a unique solution
    pub unique_puzzles: bool,
    /// Where the file store keeps the session (defaults to the local data dir)
    pub store_path: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            default_difficulty: Difficulty::Medium,
            generation_attempts: 3,
            unique_puzzles: true,
            store_path: None,
        }
    }
}

impl SessionConfig {
    /// Load a config from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    /// The configured store path, or the platform data directory
    pub fn store_path(&self) -> PathBuf {
        self.store_path.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(format!("sudoku_{SESSION_SLOT}.json"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.default_difficulty, Difficulty::Medium);
        assert!(config.store_path().ends_with("sudoku_session.json"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"default_difficulty": "Hard", "tick_interval_ms": 250}"#)
                .unwrap();
        assert_eq!(config.default_difficulty, Difficulty::Hard);
        assert_eq!(config.tick_interval(), Duration::from_millis(250));
        assert_eq!(config.generation_attempts, 3);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"store_path": "/tmp/elsewhere.json"}}"#).unwrap();

        let config = SessionConfig::load(file.path()).unwrap();
        assert_eq!(config.store_path(), PathBuf::from("/tmp/elsewhere.json"));
    }

    #[test]
    fn test_load_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            SessionConfig::load(file.path()),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let config = SessionConfig {
            tick_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.tick_interval(), Duration::from_millis(1));
    }
}
