//! `gameshelf` - Local game library registry
//!
//! Tracks a collection of launchable game entries keyed by stable UUIDs.
//! `GameRegistry` owns the entries and persists every mutation, `migration`
//! backfills identifiers onto legacy entries, `IconCache` derives icons per
//! identifier, and `ImportJob` adds dropped files on a background worker while
//! `LibraryController` keeps the interactive surface disabled.
//!
//! # Layout
//!
//! - `config`: entry/settings models, JSON persistence, data paths
//! - `registry`: identifier allocation, CRUD, migration, view projection
//! - `import`: bulk import pipeline and its worker thread
//! - `controller`: the context object tying everything together
//! - `utils`: icon cache, icon extraction, logging

// Module declarations
pub mod config;
pub mod controller;
pub mod error;
pub mod import;
pub mod registry;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export commonly used types
pub use config::{EntryIdentity, GameEntry, SortMode};
pub use error::{GameShelfError, Result};
pub use registry::{GameRegistry, IdAllocator};
