//! Background import job
//!
//! Runs the import pipeline on a single named worker thread. Progress and the
//! final report travel back to the control thread over an mpsc channel; the
//! worker sends exactly one `ImportEvent::BatchDone` as its last message.

use crate::controller::EntryCustomizer;
use crate::error::{GameShelfError, Result, StringError};
use crate::import::pipeline::{ImportReport, ItemStatus, panic_message, run_import};
use crate::registry::GameRegistry;
use crate::utils::icon_cache::IconCache;
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

/// Message from the import worker
#[derive(Debug)]
pub enum ImportEvent {
    /// One path has been handled
    ItemProcessed {
        /// Position in the batch
        index: usize,
        /// Batch size
        total: usize,
        /// Path that was handled
        path: PathBuf,
        /// What happened to it
        status: ItemStatus,
    },
    /// The whole batch finished; always the last event
    BatchDone(ImportReport),
}

/// Handle to a running import worker
#[derive(Debug)]
pub struct ImportJob {
    handle: Option<JoinHandle<()>>,
    events: Receiver<ImportEvent>,
    total: usize,
}

impl ImportJob {
    /// Start importing `paths` on a new worker thread
    ///
    /// The customizer moves to the worker and is called there, once per path.
    pub fn spawn(
        paths: Vec<PathBuf>,
        registry: Arc<RwLock<GameRegistry>>,
        icons: Arc<IconCache>,
        mut customizer: Box<dyn EntryCustomizer>,
    ) -> Result<Self> {
        let (tx, events) = mpsc::channel();
        let total = paths.len();

        let handle = thread::Builder::new()
            .name("gameshelf-import".to_string())
            .spawn(move || {
                let report = run_import(
                    &paths,
                    &registry,
                    &icons,
                    customizer.as_mut(),
                    |index, item| {
                        let event = ImportEvent::ItemProcessed {
                            index,
                            total,
                            path: item.path.clone(),
                            status: item.outcome.status(),
                        };
                        if tx.send(event).is_err() {
                            debug!("Import progress receiver dropped");
                        }
                    },
                );
                if tx.send(ImportEvent::BatchDone(report)).is_err() {
                    debug!("Import completion receiver dropped");
                }
            })
            .map_err(|e| GameShelfError::ImportWorkerFailed(Box::new(e)))?;

        Ok(Self {
            handle: Some(handle),
            events,
            total,
        })
    }

    #[cfg(test)]
    pub(crate) fn from_parts(
        handle: JoinHandle<()>,
        events: Receiver<ImportEvent>,
        total: usize,
    ) -> Self {
        Self {
            handle: Some(handle),
            events,
            total,
        }
    }

    /// Number of paths in the batch
    pub fn total(&self) -> usize {
        self.total
    }

    /// Next event without blocking
    pub fn try_event(&self) -> std::result::Result<ImportEvent, TryRecvError> {
        self.events.try_recv()
    }

    /// Next event, blocking until one arrives
    ///
    /// Returns `None` once the worker has exited and every event was consumed.
    pub fn next_event(&self) -> Option<ImportEvent> {
        self.events.recv().ok()
    }

    /// Wait for the worker thread to exit
    ///
    /// A panic on the worker is reported as `ImportWorkerFailed`.
    pub fn join(mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        handle.join().map_err(|payload| {
            let message = panic_message(payload.as_ref());
            error!("Import worker panicked: {message}");
            GameShelfError::ImportWorkerFailed(StringError::new(message))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameEntry;
    use crate::controller::{AcceptDefaults, Customization};
    use crate::import::ImportOutcome;
    use crate::registry::IdAllocator;
    use crate::test_utils::MemoryStore;

    fn shared_registry() -> Arc<RwLock<GameRegistry>> {
        let registry =
            GameRegistry::load(Box::new(MemoryStore::default()), IdAllocator::new()).unwrap();
        Arc::new(RwLock::new(registry))
    }

    fn drain(job: &ImportJob) -> (Vec<ItemStatus>, Option<ImportReport>) {
        let mut progress = Vec::new();
        while let Some(event) = job.next_event() {
            match event {
                ImportEvent::ItemProcessed { status, .. } => progress.push(status),
                ImportEvent::BatchDone(report) => return (progress, Some(report)),
            }
        }
        (progress, None)
    }

    #[test]
    fn test_worker_reports_progress_then_done() {
        let registry = shared_registry();
        let job = ImportJob::spawn(
            vec![PathBuf::from("/games/a.exe"), PathBuf::from("/games/b.exe")],
            Arc::clone(&registry),
            Arc::new(IconCache::new()),
            Box::new(AcceptDefaults),
        )
        .unwrap();
        assert_eq!(job.total(), 2);

        let (progress, report) = drain(&job);
        job.join().unwrap();

        assert_eq!(progress.len(), 2);
        let report = report.expect("BatchDone must be sent");
        assert_eq!(report.added(), 2);
        assert_eq!(registry.read().len(), 2);
    }

    #[test]
    fn test_customizer_panic_still_finishes_batch() {
        let registry = shared_registry();
        let customizer = |entry: GameEntry| {
            assert_ne!(entry.display_name, "b", "customizer crashed");
            Customization::Confirmed(entry)
        };
        let job = ImportJob::spawn(
            vec![
                PathBuf::from("/games/a.exe"),
                PathBuf::from("/games/b.exe"),
                PathBuf::from("/games/c.exe"),
            ],
            Arc::clone(&registry),
            Arc::new(IconCache::new()),
            Box::new(customizer),
        )
        .unwrap();

        let (progress, report) = drain(&job);
        job.join().unwrap();

        assert!(matches!(progress[0], ItemStatus::Added(_)));
        assert_eq!(progress[1], ItemStatus::Failed);
        assert!(matches!(progress[2], ItemStatus::Added(_)));
        let report = report.expect("BatchDone must be sent");
        assert!(matches!(
            report.items[1].outcome,
            ImportOutcome::Failed(GameShelfError::ImportWorkerFailed(_))
        ));
        assert_eq!(registry.read().len(), 2);
    }

    #[test]
    fn test_empty_batch_still_sends_done() {
        let job = ImportJob::spawn(
            Vec::new(),
            shared_registry(),
            Arc::new(IconCache::new()),
            Box::new(AcceptDefaults),
        )
        .unwrap();

        let (progress, report) = drain(&job);
        job.join().unwrap();

        assert!(progress.is_empty());
        assert_eq!(report.unwrap().items.len(), 0);
    }
}
