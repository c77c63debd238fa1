//! Bulk import pipeline
//!
//! Turns dropped paths into registry entries, one path at a time and in input
//! order. Each path gets a default entry and a fresh identifier, is shown to the
//! `EntryCustomizer`, and is added on confirmation. A cancelled or failed path
//! is recorded and the batch moves on to the next one.
//!
//! A panic while handling one path is caught and recorded as a failure of that
//! path.
//!
//! The registry lock is held only for allocation and for the final add, never
//! while the customizer runs.

use crate::config::GameEntry;
use crate::controller::{Customization, EntryCustomizer};
use crate::error::{GameShelfError, Result, StringError};
use crate::registry::GameRegistry;
use crate::utils::icon_cache::IconCache;
use crate::utils::icon_extractor::display_name_from_path;
use parking_lot::RwLock;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Default entry for an executable path
///
/// Display name is the file name without extension; start directory is the
/// path's parent.
pub fn derive_default_entry(path: &Path, id: Uuid) -> Result<GameEntry> {
    let display_name = display_name_from_path(path)
        .ok_or_else(|| GameShelfError::InvalidImportPath(path.to_path_buf()))?;
    let start_directory = path.parent().map(Path::to_path_buf).unwrap_or_default();

    let mut entry = GameEntry::new(display_name, path, start_directory);
    entry.id = id;
    Ok(entry)
}

/// Default entry for `path` carrying an identifier free in `registry`
pub fn prepare_candidate(path: &Path, registry: &RwLock<GameRegistry>) -> Result<GameEntry> {
    let id = {
        let registry = registry.read();
        registry.allocator().allocate(&registry.ids())?
    };
    derive_default_entry(path, id)
}

/// What happened to one imported path
#[derive(Debug)]
pub enum ImportOutcome {
    /// Stored in the registry
    Added(GameEntry),
    /// The customizer cancelled this path
    Skipped,
    /// The path could not be imported
    Failed(GameShelfError),
}

/// Condensed outcome, cheap to send as progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    /// Stored under this identifier
    Added(Uuid),
    /// Cancelled by the customizer
    Skipped,
    /// Failed with an error
    Failed,
}

impl ImportOutcome {
    /// Condensed form of this outcome
    pub fn status(&self) -> ItemStatus {
        match self {
            Self::Added(entry) => ItemStatus::Added(entry.id),
            Self::Skipped => ItemStatus::Skipped,
            Self::Failed(_) => ItemStatus::Failed,
        }
    }
}

/// Result for one input path
#[derive(Debug)]
pub struct ImportItem {
    /// Path as given to the import
    pub path: PathBuf,
    /// What happened to it
    pub outcome: ImportOutcome,
}

/// Results of a whole batch, in input order
#[derive(Debug, Default)]
pub struct ImportReport {
    /// One item per input path
    pub items: Vec<ImportItem>,
}

impl ImportReport {
    /// Number of paths stored in the registry
    pub fn added(&self) -> usize {
        self.count(|outcome| matches!(outcome, ImportOutcome::Added(_)))
    }

    /// Number of paths cancelled by the customizer
    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, ImportOutcome::Skipped))
    }

    /// Number of paths that failed
    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, ImportOutcome::Failed(_)))
    }

    /// Entries stored by this batch
    pub fn added_entries(&self) -> impl Iterator<Item = &GameEntry> {
        self.items.iter().filter_map(|item| match &item.outcome {
            ImportOutcome::Added(entry) => Some(entry),
            _ => None,
        })
    }

    /// One-line summary such as `"2 added, 1 skipped, 0 failed"`
    pub fn summary(&self) -> String {
        format!(
            "{} added, {} skipped, {} failed",
            self.added(),
            self.skipped(),
            self.failed()
        )
    }

    fn count(&self, pred: impl Fn(&ImportOutcome) -> bool) -> usize {
        self.items.iter().filter(|item| pred(&item.outcome)).count()
    }
}

/// Import a single path
///
/// Never panics on a bad path; every failure becomes `ImportOutcome::Failed`.
/// A stored entry's icon is loaded into `icons` right away.
pub fn import_one(
    path: &Path,
    registry: &RwLock<GameRegistry>,
    icons: &IconCache,
    customizer: &mut dyn EntryCustomizer,
) -> ImportOutcome {
    let candidate = match prepare_candidate(path, registry) {
        Ok(candidate) => candidate,
        Err(e) => {
            warn!("Cannot import {}: {e}", path.display());
            return ImportOutcome::Failed(e);
        }
    };

    let confirmed = match customizer.customize(candidate) {
        Customization::Confirmed(entry) => entry,
        Customization::Cancelled => {
            debug!("Import of {} cancelled", path.display());
            return ImportOutcome::Skipped;
        }
    };

    let stored = registry.write().add(confirmed);
    match stored {
        Ok(entry) => {
            icons.get_or_load(&entry, false);
            ImportOutcome::Added(entry)
        }
        Err(e) => {
            warn!("Failed to add {}: {e}", path.display());
            ImportOutcome::Failed(e)
        }
    }
}

/// Import every path in order, calling `on_item` after each one
pub fn run_import(
    paths: &[PathBuf],
    registry: &RwLock<GameRegistry>,
    icons: &IconCache,
    customizer: &mut dyn EntryCustomizer,
    mut on_item: impl FnMut(usize, &ImportItem),
) -> ImportReport {
    info!("Importing {} paths", paths.len());

    let mut report = ImportReport {
        items: Vec::with_capacity(paths.len()),
    };
    for (index, path) in paths.iter().enumerate() {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            import_one(path, registry, icons, &mut *customizer)
        }))
        .unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            error!("Import of {} panicked: {message}", path.display());
            ImportOutcome::Failed(GameShelfError::ImportWorkerFailed(StringError::new(message)))
        });
        let item = ImportItem {
            path: path.clone(),
            outcome,
        };
        on_item(index, &item);
        report.items.push(item);
    }

    info!("Import finished: {}", report.summary());
    report
}

/// Text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "import worker panicked".to_string())
}
