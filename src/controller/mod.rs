//! Library controller module
//!
//! Coordinates the registry, icon cache, settings and the import worker for
//! an interactive front end.
//!
//! # Architecture
//!
//! - `LibraryController`: single entry point for every mutation, owned by the
//!   control thread
//! - `LibraryView`: projected snapshot published after every change
//! - `EntryCustomizer` / `UserPrompt`: user-facing collaborators supplied by
//!   the front end
//!
//! # Import flow
//!
//! ```text
//! begin_import ──▶ interactive = false ──▶ ImportJob (worker thread)
//!                                               │ ItemProcessed ...
//!                                               ▼ BatchDone(report)
//! poll_import / wait_for_import ◀───────────────┘
//!        └──▶ interactive = true, publish view
//! ```
//!
//! The registry is shared with the worker behind a `parking_lot::RwLock`;
//! the interactive flag itself is only touched on the control thread.

pub mod app_controller;
pub mod collaborators;

pub use app_controller::{LibraryController, LibraryView};
pub use collaborators::{
    AcceptDefaults, AutoConfirm, Customization, EntryCustomizer, Notice, UserPrompt,
};
