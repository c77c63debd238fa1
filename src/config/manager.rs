//! Data directory layout and settings persistence
//!
//! Resolves where the registry, settings and logs live, and loads/saves
//! `settings.json` with atomic writes to prevent corruption.

use crate::config::models::Settings;
use crate::error::{GameShelfError, Result, StringError};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable that overrides the data directory
pub const DATA_DIR_ENV: &str = "GAMESHELF_HOME";

/// Locations of every file the application owns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    root: PathBuf,
}

impl AppPaths {
    /// Use `root` as the data directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the data directory from the environment
    ///
    /// Returns: `$GAMESHELF_HOME`, else `%APPDATA%\GameShelf`, else `./GameShelf`
    pub fn from_env() -> Self {
        if let Some(root) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            return Self::new(root);
        }
        let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        Self::new(PathBuf::from(appdata).join("GameShelf"))
    }

    /// Data directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Registry file (`games.json`)
    pub fn registry_file(&self) -> PathBuf {
        self.root.join("games.json")
    }

    /// Settings file (`settings.json`)
    pub fn settings_file(&self) -> PathBuf {
        self.root.join("settings.json")
    }

    /// Directory holding `gameshelf.log` and its rotations
    pub fn log_dir(&self) -> PathBuf {
        self.root.clone()
    }

    /// Create the data directory if it doesn't exist
    pub fn ensure_root(&self) -> Result<&Path> {
        std::fs::create_dir_all(&self.root).map_err(|e| GameShelfError::ConfigError(Box::new(e)))?;
        Ok(&self.root)
    }
}

/// Settings manager
pub struct ConfigManager;

impl ConfigManager {
    /// Load settings from disk
    ///
    /// A missing, unreadable or corrupt file yields default settings.
    pub fn load_settings(paths: &AppPaths) -> Settings {
        let path = paths.settings_file();

        if !path.exists() {
            info!("Settings file not found, using defaults");
            return Settings::default();
        }

        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to read settings, using defaults: {}", e);
                return Settings::default();
            }
        };

        match serde_json::from_str(&json) {
            Ok(settings) => {
                info!("Settings loaded successfully");
                settings
            }
            Err(e) => {
                warn!("Failed to parse settings, using defaults: {}", e);
                Settings::default()
            }
        }
    }

    /// Save settings to disk with atomic write
    ///
    /// Uses a temporary file and rename to ensure atomic write operation.
    pub fn save_settings(paths: &AppPaths, settings: &Settings) -> Result<()> {
        let dir = paths.ensure_root()?;
        let path = paths.settings_file();

        let json = serde_json::to_string_pretty(settings)?;
        let temp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| GameShelfError::ConfigError(Box::new(e)))?;
        std::fs::write(temp.path(), json)
            .map_err(|e| GameShelfError::ConfigError(Box::new(e)))?;
        temp.persist(&path).map_err(|e| {
            GameShelfError::ConfigError(StringError::new(format!(
                "Failed to replace {}: {}",
                path.display(),
                e.error
            )))
        })?;

        info!("Settings saved successfully");
        Ok(())
    }
}
