//! External collaborators of the library controller
//!
//! The core never talks to a user directly. Per-entry customization, delete
//! confirmation and informational notices go through these traits so a GUI,
//! a terminal front end or a test can drive them.

use crate::config::GameEntry;
use tracing::info;

/// Result of presenting a candidate entry for customization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Customization {
    /// Keep the entry, possibly with modified fields
    Confirmed(GameEntry),
    /// Drop this entry
    Cancelled,
}

/// Lets the user confirm or modify a candidate entry before it is stored
///
/// Implementations must not mutate the registry themselves. They run on the
/// import worker thread during a bulk import, hence the `Send` bound.
pub trait EntryCustomizer: Send {
    /// Present `candidate` and return the user's decision
    fn customize(&mut self, candidate: GameEntry) -> Customization;
}

impl<F> EntryCustomizer for F
where
    F: FnMut(GameEntry) -> Customization + Send,
{
    fn customize(&mut self, candidate: GameEntry) -> Customization {
        self(candidate)
    }
}

/// Customizer that confirms every candidate unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptDefaults;

impl EntryCustomizer for AcceptDefaults {
    fn customize(&mut self, candidate: GameEntry) -> Customization {
        Customization::Confirmed(candidate)
    }
}

/// Informational message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Legacy entries received identifiers on startup
    MigrationCompleted {
        /// Number of migrated entries
        count: usize,
    },
    /// A bulk import finished
    ImportFinished {
        /// One-line report summary
        summary: String,
    },
}

/// Confirmation prompts and notices
pub trait UserPrompt {
    /// Ask before deleting `entry`; `false` aborts the deletion
    fn confirm_delete(&mut self, entry: &GameEntry) -> bool;

    /// Show an informational notice
    fn notify(&mut self, notice: &Notice);
}

/// Prompt that confirms everything and only logs notices
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl UserPrompt for AutoConfirm {
    fn confirm_delete(&mut self, _entry: &GameEntry) -> bool {
        true
    }

    fn notify(&mut self, notice: &Notice) {
        info!("Notice: {notice:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_entry;

    #[test]
    fn test_accept_defaults_keeps_candidate() {
        let candidate = sample_entry("Doom");
        assert_eq!(
            AcceptDefaults.customize(candidate.clone()),
            Customization::Confirmed(candidate)
        );
    }

    #[test]
    fn test_closure_customizer() {
        let mut rename = |mut entry: GameEntry| {
            entry.display_name = entry.display_name.to_uppercase();
            Customization::Confirmed(entry)
        };
        match rename.customize(sample_entry("doom")) {
            Customization::Confirmed(entry) => assert_eq!(entry.display_name, "DOOM"),
            Customization::Cancelled => panic!("expected confirmation"),
        }
    }

    #[test]
    fn test_auto_confirm_approves_deletes() {
        assert!(AutoConfirm.confirm_delete(&sample_entry("Doom")));
    }
}
