//! Configuration data models
//!
//! This module defines the persisted game entry record and the user settings.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One registered launchable game configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEntry {
    /// Durable identity; nil only for legacy entries awaiting migration
    #[serde(default)]
    pub id: Uuid,
    /// Label shown in the game list (not unique)
    pub display_name: String,
    /// Launchable binary (not unique, several entries may share it)
    pub executable_path: PathBuf,
    /// Working directory for launch
    #[serde(default)]
    pub start_directory: PathBuf,
    /// Optional icon override; when absent the icon comes from the executable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_icon_path: Option<PathBuf>,
}

/// Identity state of an entry as read from storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryIdentity {
    /// Entry carries a real identifier
    Identified(Uuid),
    /// Legacy entry stored before identifiers existed
    Unidentified,
}

impl GameEntry {
    /// Create an entry without an identifier
    pub fn new(
        display_name: impl Into<String>,
        executable_path: impl Into<PathBuf>,
        start_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: Uuid::nil(),
            display_name: display_name.into(),
            executable_path: executable_path.into(),
            start_directory: start_directory.into(),
            custom_icon_path: None,
        }
    }

    /// Builder-style setter for the icon override
    #[must_use]
    pub fn with_custom_icon(mut self, icon: impl Into<PathBuf>) -> Self {
        self.custom_icon_path = Some(icon.into());
        self
    }

    /// Identity state of this entry
    pub fn identity(&self) -> EntryIdentity {
        if self.id.is_nil() {
            EntryIdentity::Unidentified
        } else {
            EntryIdentity::Identified(self.id)
        }
    }

    /// Icon override, treating an empty path as absent
    pub fn custom_icon(&self) -> Option<&Path> {
        self.custom_icon_path
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }

    /// Whether `other` would render a different icon than `self`
    pub fn icon_differs_from(&self, other: &GameEntry) -> bool {
        self.executable_path != other.executable_path || self.custom_icon() != other.custom_icon()
    }
}

/// Ordering used when projecting the registry for display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Order in which entries were added
    #[default]
    InsertionOrder,
    /// Case-insensitive by display name, insertion order on ties
    Alphabetical,
}

/// Persisted user settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Current list ordering
    #[serde(default)]
    pub sort_mode: SortMode,
    /// Window state for persistence
    #[serde(default)]
    pub window: WindowState,
}

/// Window state for position and size persistence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowState {
    /// X position
    pub x: i32,
    /// Y position
    pub y: i32,
    /// Window width
    pub width: u32,
    /// Window height
    pub height: u32,
    /// Whether the window was maximized when last closed
    #[serde(default)]
    pub maximized: bool,
}

impl Default for WindowState {
    fn default() -> Self {
        Self {
            x: 100,
            y: 100,
            width: 640,
            height: 480,
            maximized: false,
        }
    }
}
