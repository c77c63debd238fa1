//! Bulk import
//!
//! `pipeline` turns paths into entries one at a time; `job` runs a batch on the
//! background worker thread and reports back over a channel.

pub mod job;
pub mod pipeline;

pub use job::{ImportEvent, ImportJob};
pub use pipeline::{
    ImportItem, ImportOutcome, ImportReport, ItemStatus, derive_default_entry, import_one,
    prepare_candidate, run_import,
};
