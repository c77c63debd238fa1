//! Game registry
//!
//! Ordered store of `GameEntry` records keyed by identifier. Every mutating
//! call writes the full entry list to the `RegistryStore` before returning.
//! When that write fails the in-memory change is rolled back, so callers never
//! observe a mutation that was not persisted.
//!
//! The registry knows nothing about icons; callers invalidate the icon cache.

use crate::config::{GameEntry, RegistryStore};
use crate::error::{GameShelfError, Result};
use crate::registry::IdAllocator;
use std::collections::HashSet;
use std::fmt;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Authoritative list of game entries
pub struct GameRegistry {
    entries: Vec<GameEntry>,
    store: Box<dyn RegistryStore>,
    allocator: IdAllocator,
}

impl GameRegistry {
    /// Load the registry from `store`
    ///
    /// Entries keep their stored order. If a non-nil identifier appears more
    /// than once, later occurrences are reset to nil so migration reassigns them.
    pub fn load(store: Box<dyn RegistryStore>, allocator: IdAllocator) -> Result<Self> {
        let mut entries = store.load()?;

        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &mut entries {
            if entry.id.is_nil() {
                continue;
            }
            if !seen.insert(entry.id) {
                warn!(
                    "Duplicate identifier {} on '{}', scheduling it for migration",
                    entry.id, entry.display_name
                );
                entry.id = Uuid::nil();
            }
        }

        info!("Game registry loaded with {} entries", entries.len());
        Ok(Self {
            entries,
            store,
            allocator,
        })
    }

    /// Add an entry, assigning an identifier if it has none
    ///
    /// A non-nil identifier that is already taken is replaced as well.
    /// Returns the stored entry.
    pub fn add(&mut self, mut entry: GameEntry) -> Result<GameEntry> {
        let requested = entry.id;
        entry.id = self.allocator.ensure_unique(requested, &self.ids())?;
        if !requested.is_nil() && requested != entry.id {
            warn!(
                "Identifier {} already in use, '{}' was assigned {}",
                requested, entry.display_name, entry.id
            );
        }

        self.entries.push(entry);
        if let Err(e) = self.persist() {
            self.entries.pop();
            return Err(e);
        }

        let stored = self.entries[self.entries.len() - 1].clone();
        info!("Added game '{}' ({})", stored.display_name, stored.id);
        Ok(stored)
    }

    /// Replace every mutable field of entry `id` with `new_values`
    ///
    /// The identifier in `new_values` is ignored; `id` is preserved.
    pub fn edit(&mut self, id: Uuid, new_values: GameEntry) -> Result<GameEntry> {
        let index = self.index_of(id).ok_or(GameShelfError::NotFound(id))?;

        let updated = GameEntry { id, ..new_values };
        let previous = std::mem::replace(&mut self.entries[index], updated);
        if let Err(e) = self.persist() {
            self.entries[index] = previous;
            return Err(e);
        }

        let stored = self.entries[index].clone();
        info!("Updated game '{}' ({})", stored.display_name, id);
        Ok(stored)
    }

    /// Remove entry `id`
    pub fn delete(&mut self, id: Uuid) -> Result<GameEntry> {
        let index = self.index_of(id).ok_or(GameShelfError::NotFound(id))?;

        let removed = self.entries.remove(index);
        if let Err(e) = self.persist() {
            self.entries.insert(index, removed);
            return Err(e);
        }

        info!("Removed game '{}' ({})", removed.display_name, id);
        Ok(removed)
    }

    /// Look up entry `id`
    pub fn find_by_id(&self, id: Uuid) -> Result<&GameEntry> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .ok_or(GameShelfError::NotFound(id))
    }

    /// All entries in insertion order
    pub fn all(&self) -> &[GameEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Set of identifiers currently assigned (nil excluded)
    pub fn ids(&self) -> HashSet<Uuid> {
        self.entries
            .iter()
            .map(|entry| entry.id)
            .filter(|id| !id.is_nil())
            .collect()
    }

    /// Allocator used for new identifiers
    pub fn allocator(&self) -> &IdAllocator {
        &self.allocator
    }

    /// Write identifiers onto the entries at the given positions and persist once
    ///
    /// Positions must refer to currently unidentified entries. On a failed
    /// write every position is reset to nil again.
    pub(crate) fn backfill_ids(&mut self, assignments: &[(usize, Uuid)]) -> Result<()> {
        for &(index, id) in assignments {
            debug_assert!(self.entries[index].id.is_nil(), "backfill over assigned id");
            self.entries[index].id = id;
        }

        if let Err(e) = self.persist() {
            for &(index, _) in assignments {
                self.entries[index].id = Uuid::nil();
            }
            return Err(e);
        }
        Ok(())
    }

    fn index_of(&self, id: Uuid) -> Option<usize> {
        if id.is_nil() {
            return None;
        }
        self.entries.iter().position(|entry| entry.id == id)
    }

    fn persist(&self) -> Result<()> {
        self.store.save(&self.entries).map_err(|e| {
            error!("Failed to persist game registry: {e}");
            match e {
                GameShelfError::PersistenceFailure(_) => e,
                other => GameShelfError::persistence(other),
            }
        })
    }
}

impl fmt::Debug for GameRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameRegistry")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MemoryStore, sample_entry};

    fn empty_registry() -> (GameRegistry, MemoryStore) {
        let store = MemoryStore::default();
        let registry = GameRegistry::load(Box::new(store.clone()), IdAllocator::new()).unwrap();
        (registry, store)
    }

    #[test]
    fn test_add_assigns_identifier_and_persists() {
        let (mut registry, store) = empty_registry();

        let stored = registry.add(sample_entry("Half-Life")).unwrap();

        assert!(!stored.id.is_nil());
        assert_eq!(registry.len(), 1);
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.entries(), vec![stored]);
    }

    #[test]
    fn test_add_keeps_free_identifier() {
        let (mut registry, _store) = empty_registry();
        let mut entry = sample_entry("Doom");
        let id = Uuid::new_v4();
        entry.id = id;

        assert_eq!(registry.add(entry).unwrap().id, id);
    }

    #[test]
    fn test_add_replaces_taken_identifier() {
        let (mut registry, _store) = empty_registry();
        let first = registry.add(sample_entry("Doom")).unwrap();

        let mut clash = sample_entry("Doom II");
        clash.id = first.id;
        let second = registry.add(clash).unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(registry.ids().len(), 2);
    }

    #[test]
    fn test_same_path_entries_coexist() {
        let (mut registry, _store) = empty_registry();
        let a = registry.add(sample_entry("Game (English)")).unwrap();
        let b = registry.add(sample_entry("Game (English)")).unwrap();

        assert_eq!(a.executable_path, b.executable_path);
        assert_ne!(a.id, b.id);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_add_rolls_back_on_persistence_failure() {
        let (mut registry, store) = empty_registry();
        store.fail_saves(true);

        let result = registry.add(sample_entry("Quake"));

        assert!(matches!(result, Err(GameShelfError::PersistenceFailure(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_edit_preserves_identifier() {
        let (mut registry, _store) = empty_registry();
        let stored = registry.add(sample_entry("Quake")).unwrap();

        let mut new_values = sample_entry("Quake III Arena").with_custom_icon("/icons/q3.png");
        new_values.id = Uuid::new_v4();
        let updated = registry.edit(stored.id, new_values).unwrap();

        assert_eq!(updated.id, stored.id);
        let found = registry.find_by_id(stored.id).unwrap();
        assert_eq!(found.display_name, "Quake III Arena");
        assert_eq!(found.custom_icon_path.as_deref(), Some(std::path::Path::new("/icons/q3.png")));
    }

    #[test]
    fn test_edit_unknown_id_is_not_found() {
        let (mut registry, store) = empty_registry();
        let id = Uuid::new_v4();

        let result = registry.edit(id, sample_entry("Ghost"));

        assert!(matches!(result, Err(GameShelfError::NotFound(missing)) if missing == id));
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn test_edit_rolls_back_on_persistence_failure() {
        let (mut registry, store) = empty_registry();
        let stored = registry.add(sample_entry("Quake")).unwrap();
        store.fail_saves(true);

        assert!(registry.edit(stored.id, sample_entry("Renamed")).is_err());
        assert_eq!(registry.find_by_id(stored.id).unwrap(), &stored);
    }

    #[test]
    fn test_delete_then_find_is_not_found() {
        let (mut registry, _store) = empty_registry();
        let stored = registry.add(sample_entry("Quake")).unwrap();

        let removed = registry.delete(stored.id).unwrap();

        assert_eq!(removed, stored);
        assert!(matches!(
            registry.find_by_id(stored.id),
            Err(GameShelfError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_unknown_id_leaves_registry_unchanged() {
        let (mut registry, store) = empty_registry();
        registry.add(sample_entry("Quake")).unwrap();
        let before = registry.all().to_vec();

        let result = registry.delete(Uuid::new_v4());

        assert!(matches!(result, Err(GameShelfError::NotFound(_))));
        assert_eq!(registry.all(), before.as_slice());
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_delete_rolls_back_in_place() {
        let (mut registry, store) = empty_registry();
        registry.add(sample_entry("A")).unwrap();
        let middle = registry.add(sample_entry("B")).unwrap();
        registry.add(sample_entry("C")).unwrap();
        let before = registry.all().to_vec();
        store.fail_saves(true);

        assert!(registry.delete(middle.id).is_err());
        assert_eq!(registry.all(), before.as_slice());
    }

    #[test]
    fn test_nil_id_is_never_found() {
        let legacy = sample_entry("Legacy");
        let store = MemoryStore::with_entries(vec![legacy]);
        let registry = GameRegistry::load(Box::new(store), IdAllocator::new()).unwrap();

        assert!(registry.find_by_id(Uuid::nil()).is_err());
    }

    #[test]
    fn test_load_resets_duplicate_identifiers() {
        let id = Uuid::new_v4();
        let mut first = sample_entry("First");
        first.id = id;
        let mut second = sample_entry("Second");
        second.id = id;
        let store = MemoryStore::with_entries(vec![first, second]);

        let registry = GameRegistry::load(Box::new(store), IdAllocator::new()).unwrap();

        assert_eq!(registry.all()[0].id, id);
        assert!(registry.all()[1].id.is_nil());
    }

    #[test]
    fn test_all_reflects_insertion_order() {
        let (mut registry, _store) = empty_registry();
        for name in ["c", "a", "b"] {
            registry.add(sample_entry(name)).unwrap();
        }
        let names: Vec<_> = registry.all().iter().map(|e| e.display_name.as_str()).collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: no sequence of adds and deletes produces a shared identifier
            #[test]
            fn identifiers_stay_unique(
                ops in prop::collection::vec((any::<bool>(), 0usize..8), 1..40)
            ) {
                let (mut registry, _store) = empty_registry();
                for (is_add, pick) in ops {
                    if is_add || registry.is_empty() {
                        registry.add(sample_entry("Game")).unwrap();
                    } else {
                        let id = registry.all()[pick % registry.len()].id;
                        registry.delete(id).unwrap();
                    }
                    prop_assert_eq!(registry.ids().len(), registry.len());
                }
            }

            /// Property: edit keeps the identifier and applies the new values
            #[test]
            fn edit_preserves_identity(name in "[a-zA-Z0-9 ]{1,24}", exe in "[a-z]{1,12}") {
                let (mut registry, _store) = empty_registry();
                let stored = registry.add(sample_entry("Original")).unwrap();

                let mut values = sample_entry(&name);
                values.executable_path = std::path::PathBuf::from(format!("/games/{exe}.exe"));
                registry.edit(stored.id, values.clone()).unwrap();

                let found = registry.find_by_id(stored.id).unwrap();
                prop_assert_eq!(found.id, stored.id);
                prop_assert_eq!(&found.display_name, &values.display_name);
                prop_assert_eq!(&found.executable_path, &values.executable_path);
            }
        }
    }
}
