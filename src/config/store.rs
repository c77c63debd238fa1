//! Registry persistence
//!
//! The registry is always written in full. `JsonFileStore` writes through a
//! temporary file in the target directory and renames it into place, so a
//! reader sees either the old or the new registry and never a partial one.

use crate::config::models::GameEntry;
use crate::error::{GameShelfError, Result};
use serde::{Deserialize, Serialize};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Backing storage for the full entry list
pub trait RegistryStore: Send + Sync {
    /// Read every persisted entry in stored order
    fn load(&self) -> Result<Vec<GameEntry>>;

    /// Replace the persisted state with `entries`
    fn save(&self, entries: &[GameEntry]) -> Result<()>;
}

/// On-disk layout of `games.json`
#[derive(Debug, Serialize)]
struct RegistryDocument<'a> {
    games: &'a [GameEntry],
}

/// Current layout when reading; any other object is rejected
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StoredDocument {
    games: Vec<GameEntry>,
}

/// Accepted layouts when reading
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredRegistry {
    Document(StoredDocument),
    Legacy(Vec<GameEntry>),
}

/// Parse registry JSON in either the current or the legacy bare-array layout
pub fn parse_registry_json(json: &str) -> Result<Vec<GameEntry>> {
    let stored: StoredRegistry = serde_json::from_str(json).map_err(GameShelfError::persistence)?;
    Ok(match stored {
        StoredRegistry::Document(StoredDocument { games }) | StoredRegistry::Legacy(games) => {
            games
        }
    })
}

/// JSON file store with atomic replacement
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store backed by `path` (created on first save)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File this store reads and writes
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> Result<&Path> {
        self.path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .ok_or_else(|| {
                GameShelfError::persistence(format!(
                    "Invalid registry path: {}",
                    self.path.display()
                ))
            })
    }
}

impl RegistryStore for JsonFileStore {
    fn load(&self) -> Result<Vec<GameEntry>> {
        if !self.path.exists() {
            info!("Registry file {} not found, starting empty", self.path.display());
            return Ok(Vec::new());
        }

        let json = std::fs::read_to_string(&self.path).map_err(GameShelfError::persistence)?;
        let entries = parse_registry_json(&json)?;
        info!("Loaded {} game entries from {}", entries.len(), self.path.display());
        Ok(entries)
    }

    fn save(&self, entries: &[GameEntry]) -> Result<()> {
        let dir = self.parent_dir()?;
        std::fs::create_dir_all(dir).map_err(GameShelfError::persistence)?;

        // Temp file lives next to the target so persist() is a same-volume rename
        let temp = tempfile::NamedTempFile::new_in(dir).map_err(GameShelfError::persistence)?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer_pretty(&mut writer, &RegistryDocument { games: entries })
                .map_err(GameShelfError::persistence)?;
            writer.flush().map_err(GameShelfError::persistence)?;
        }
        temp.as_file()
            .sync_all()
            .map_err(GameShelfError::persistence)?;
        temp.persist(&self.path)
            .map_err(|e| GameShelfError::persistence(e.error))?;

        debug!("Saved {} game entries to {}", entries.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_dir;
    use uuid::Uuid;

    fn sample_entries() -> Vec<GameEntry> {
        let mut identified = GameEntry::new("Portal", "/games/portal/portal.exe", "/games/portal")
            .with_custom_icon("/icons/portal.png");
        identified.id = Uuid::new_v4();
        let legacy = GameEntry::new("Legacy", "/games/legacy.exe", "/games");
        vec![identified, legacy]
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = create_test_dir();
        let store = JsonFileStore::new(dir.path().join("games.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load_preserves_every_field() {
        let dir = create_test_dir();
        let store = JsonFileStore::new(dir.path().join("nested").join("games.json"));
        let entries = sample_entries();

        store.save(&entries).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded, entries);
        assert!(loaded[1].id.is_nil(), "nil identifier must survive a round trip");
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let dir = create_test_dir();
        let store = JsonFileStore::new(dir.path().join("games.json"));
        store.save(&sample_entries()).unwrap();
        store.save(&sample_entries()).unwrap();

        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_parse_legacy_bare_array() {
        let json = r#"[
            {"display_name": "Old", "executable_path": "C:\\old.exe", "start_directory": "C:\\"}
        ]"#;
        let entries = parse_registry_json(json).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].id.is_nil());
    }

    #[test]
    fn test_parse_rejects_unexpected_objects() {
        assert!(parse_registry_json(r#"{"games": []}"#).unwrap().is_empty());
        assert!(parse_registry_json(r#"{"game": []}"#).is_err());
        assert!(parse_registry_json("{}").is_err());
        assert!(parse_registry_json(r#"{"games": [], "extra": 1}"#).is_err());
    }

    #[test]
    fn test_misshaped_file_is_not_overwritten() {
        let dir = create_test_dir();
        let path = dir.path().join("games.json");
        let original = r#"{"game": [{"display_name": "Doom", "executable_path": "/games/doom.exe"}]}"#;
        std::fs::write(&path, original).unwrap();

        let result = JsonFileStore::new(&path).load();

        assert!(matches!(result, Err(GameShelfError::PersistenceFailure(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_corrupt_file_is_surfaced() {
        let dir = create_test_dir();
        let path = dir.path().join("games.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = JsonFileStore::new(&path).load();
        assert!(matches!(result, Err(GameShelfError::PersistenceFailure(_))));
    }

    #[test]
    fn test_save_into_file_path_fails() {
        let dir = create_test_dir();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file, not a directory").unwrap();

        let store = JsonFileStore::new(blocker.join("games.json"));
        let result = store.save(&sample_entries());
        assert!(matches!(result, Err(GameShelfError::PersistenceFailure(_))));
    }
}
