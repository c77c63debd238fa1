//! Game registry module
//!
//! Identifier allocation, the keyed entry store, the one-shot identifier
//! migration for legacy entries, and the read-only display projection.
//!
//! # Lifecycle
//!
//! ```text
//! RegistryStore ──load──▶ GameRegistry ──migrate──▶ identified entries
//!                              │
//!             add/edit/delete ─┤ (full write after every mutation)
//!                              ▼
//!                      project(entries, SortMode) ──▶ view
//! ```

pub mod allocator;
pub mod game_registry;
pub mod migration;
pub mod projection;

pub use allocator::{IdAllocator, MAX_ALLOCATION_ATTEMPTS};
pub use game_registry::GameRegistry;
pub use migration::{MigrationOutcome, migrate};
pub use projection::project;
