//! Configuration management module
//!
//! Game entry and settings models, the registry store, and the data
//! directory layout. The registry (`games.json`) and settings
//! (`settings.json`) are written atomically.

pub mod manager;
pub mod models;
pub mod store;

pub use manager::{AppPaths, ConfigManager};
pub use models::{EntryIdentity, GameEntry, Settings, SortMode, WindowState};
pub use store::{JsonFileStore, RegistryStore, parse_registry_json};
