//! Identifier allocation
//!
//! Identifiers are random v4 UUIDs. Collisions are practically impossible, but
//! `ensure_unique` still checks membership and gives up after
//! `MAX_ALLOCATION_ATTEMPTS` so a broken generator cannot spin forever.

use crate::error::{GameShelfError, Result};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Upper bound on candidates tried by `ensure_unique`
pub const MAX_ALLOCATION_ATTEMPTS: usize = 64;

type Generator = dyn Fn() -> Uuid + Send + Sync;

/// Produces collision-free entry identifiers
#[derive(Clone)]
pub struct IdAllocator {
    generate: Arc<Generator>,
}

impl IdAllocator {
    /// Allocator drawing from `Uuid::new_v4`
    pub fn new() -> Self {
        Self {
            generate: Arc::new(Uuid::new_v4),
        }
    }

    /// Allocator drawing from a custom source
    pub fn with_generator(generate: impl Fn() -> Uuid + Send + Sync + 'static) -> Self {
        Self {
            generate: Arc::new(generate),
        }
    }

    /// Generate a fresh identifier without a membership check
    pub fn new_id(&self) -> Uuid {
        (self.generate)()
    }

    /// Return `candidate` if it is usable, otherwise regenerate until one is
    ///
    /// A candidate is usable when it is not nil and not in `existing`.
    pub fn ensure_unique(&self, candidate: Uuid, existing: &HashSet<Uuid>) -> Result<Uuid> {
        let mut id = candidate;
        for attempt in 0..MAX_ALLOCATION_ATTEMPTS {
            if !id.is_nil() && !existing.contains(&id) {
                return Ok(id);
            }
            if attempt > 0 {
                warn!("Identifier collision on attempt {}, regenerating", attempt);
            }
            id = self.new_id();
        }

        // The last generated candidate has not been checked yet
        if !id.is_nil() && !existing.contains(&id) {
            return Ok(id);
        }
        Err(GameShelfError::AllocationExhausted {
            attempts: MAX_ALLOCATION_ATTEMPTS,
        })
    }

    /// Generate an identifier absent from `existing`
    pub fn allocate(&self, existing: &HashSet<Uuid>) -> Result<Uuid> {
        self.ensure_unique(Uuid::nil(), existing)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for IdAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdAllocator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_new_id_is_not_nil() {
        let allocator = IdAllocator::new();
        assert!(!allocator.new_id().is_nil());
    }

    #[test]
    fn test_unique_candidate_is_kept() {
        let allocator = IdAllocator::new();
        let candidate = Uuid::new_v4();
        let id = allocator.ensure_unique(candidate, &HashSet::new()).unwrap();
        assert_eq!(id, candidate);
    }

    #[test]
    fn test_nil_candidate_is_replaced() {
        let allocator = IdAllocator::new();
        let id = allocator.ensure_unique(Uuid::nil(), &HashSet::new()).unwrap();
        assert!(!id.is_nil());
    }

    #[test]
    fn test_colliding_candidate_is_regenerated() {
        let taken = Uuid::from_u128(1);
        let fresh = Uuid::from_u128(2);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        // First generated value collides again, second is free
        let allocator = IdAllocator::with_generator(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                taken
            } else {
                fresh
            }
        });

        let existing = HashSet::from([taken]);
        let id = allocator.ensure_unique(taken, &existing).unwrap();
        assert_eq!(id, fresh);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_exhaustion_is_reported() {
        let stuck = Uuid::from_u128(7);
        let allocator = IdAllocator::with_generator(move || stuck);
        let existing = HashSet::from([stuck]);

        let result = allocator.allocate(&existing);
        assert!(matches!(
            result,
            Err(GameShelfError::AllocationExhausted {
                attempts: MAX_ALLOCATION_ATTEMPTS
            })
        ));
    }

    #[test]
    fn test_nil_generator_is_exhausted() {
        let allocator = IdAllocator::with_generator(Uuid::nil);
        assert!(allocator.allocate(&HashSet::new()).is_err());
    }
}
