//! Identifier migration
//!
//! Entries written before identifiers existed load as
//! `EntryIdentity::Unidentified`. `migrate` gives each of them a fresh
//! identifier and persists the whole batch with a single write. On an
//! already-migrated registry it finds nothing to do and does not touch the
//! store.

use crate::config::EntryIdentity;
use crate::error::Result;
use crate::registry::GameRegistry;
use tracing::{debug, info};
use uuid::Uuid;

/// Result of a migration pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Every entry already had an identifier
    AlreadyCurrent,
    /// These identifiers were assigned, in registry order
    Migrated(Vec<Uuid>),
}

impl MigrationOutcome {
    /// Number of entries that received an identifier
    pub fn migrated_count(&self) -> usize {
        match self {
            Self::AlreadyCurrent => 0,
            Self::Migrated(ids) => ids.len(),
        }
    }

    /// Whether the pass changed the registry
    pub fn changed(&self) -> bool {
        self.migrated_count() > 0
    }
}

/// Assign identifiers to every unidentified entry
///
/// Allocation for the whole batch happens before anything is written, so an
/// exhausted allocator fails the pass once and leaves the registry untouched.
pub fn migrate(registry: &mut GameRegistry) -> Result<MigrationOutcome> {
    let pending: Vec<usize> = registry
        .all()
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.identity() == EntryIdentity::Unidentified)
        .map(|(index, _)| index)
        .collect();

    if pending.is_empty() {
        debug!("All {} entries already have identifiers", registry.len());
        return Ok(MigrationOutcome::AlreadyCurrent);
    }

    info!("Migrating {} entries without identifiers", pending.len());

    // Identifiers handed out earlier in this pass count as taken
    let mut taken = registry.ids();
    let mut assignments = Vec::with_capacity(pending.len());
    for index in pending {
        let id = registry.allocator().allocate(&taken)?;
        taken.insert(id);
        assignments.push((index, id));
    }

    registry.backfill_ids(&assignments)?;

    let ids: Vec<Uuid> = assignments.into_iter().map(|(_, id)| id).collect();
    info!("Migration complete: {} entries received identifiers", ids.len());
    Ok(MigrationOutcome::Migrated(ids))
}
