#![expect(
    clippy::unwrap_used,
    reason = "Test utilities use .unwrap() for brevity"
)]

//! Shared test utilities for `gameshelf` unit tests.
//!
//! This module provides common test infrastructure used across multiple test modules.
//! It is only compiled during testing (`#[cfg(test)]`).

use crate::config::{GameEntry, RegistryStore};
use crate::error::{GameShelfError, Result, StringError};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Helper function to create a temporary test directory using tempfile.
/// Returns a `TempDir` that automatically cleans up when dropped.
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Entry named `name` pointing at `/games/{name}.exe`, without identifier
pub fn sample_entry(name: &str) -> GameEntry {
    GameEntry::new(name, format!("/games/{name}.exe"), "/games")
}

/// Write a solid-color PNG of the given size and return its path
pub fn write_test_png(dir: &Path, file_name: &str, rgba: [u8; 4], size: u32) -> PathBuf {
    let path = dir.join(file_name);
    let image = image::RgbaImage::from_pixel(size, size, image::Rgba(rgba));
    image.save(&path).unwrap();
    path
}

#[derive(Debug, Default)]
struct MemoryStoreState {
    entries: Vec<GameEntry>,
    saves: usize,
    fail_saves: bool,
}

/// In-memory `RegistryStore` that counts saves and can be told to fail
///
/// Clones share state, so a test can keep a handle after boxing one into a registry.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryStoreState>>,
}

impl MemoryStore {
    /// Store whose `load` returns `entries`
    pub fn with_entries(entries: Vec<GameEntry>) -> Self {
        let store = Self::default();
        store.state.lock().entries = entries;
        store
    }

    /// Make every following `save` fail (or succeed again)
    pub fn fail_saves(&self, fail: bool) {
        self.state.lock().fail_saves = fail;
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.state.lock().saves
    }

    /// Last persisted entries
    pub fn entries(&self) -> Vec<GameEntry> {
        self.state.lock().entries.clone()
    }
}

impl RegistryStore for MemoryStore {
    fn load(&self) -> Result<Vec<GameEntry>> {
        Ok(self.state.lock().entries.clone())
    }

    fn save(&self, entries: &[GameEntry]) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_saves {
            return Err(GameShelfError::PersistenceFailure(StringError::new(
                "simulated write failure",
            )));
        }
        state.entries = entries.to_vec();
        state.saves += 1;
        Ok(())
    }
}
