//! View projection
//!
//! Pure, read-only ordering of registry entries for display. Callers recompute
//! the projection after every mutation instead of patching a previous one.

use crate::config::{GameEntry, SortMode};

/// Order `entries` for display
///
/// `Alphabetical` compares display names by their Unicode lowercase form.
/// The sort is stable, so names that compare equal keep insertion order:
/// `["b", "A", "a"]` projects to `["A", "a", "b"]`.
pub fn project(entries: &[GameEntry], mode: SortMode) -> Vec<&GameEntry> {
    match mode {
        SortMode::InsertionOrder => entries.iter().collect(),
        SortMode::Alphabetical => {
            let mut keyed: Vec<(String, &GameEntry)> = entries
                .iter()
                .map(|entry| (sort_key(&entry.display_name), entry))
                .collect();
            keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
            keyed.into_iter().map(|(_, entry)| entry).collect()
        }
    }
}

fn sort_key(name: &str) -> String {
    name.trim().to_lowercase()
}
