//! Library controller implementation
//!
//! Owns the shared registry, the icon cache and the settings, and is the only
//! place mutations enter the library from the control thread.

use crate::config::{
    AppPaths, ConfigManager, GameEntry, JsonFileStore, RegistryStore, Settings, SortMode,
    WindowState,
};
use crate::controller::collaborators::{Customization, EntryCustomizer, Notice, UserPrompt};
use crate::error::{GameShelfError, Result, StringError};
use crate::import::{ImportEvent, ImportJob, ImportReport, prepare_candidate};
use crate::registry::{GameRegistry, IdAllocator, migrate, project};
use crate::utils::icon_cache::{IconCache, IconImage};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError, TrySendError};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Snapshot of the library for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryView {
    /// Ordering applied to `entries`
    pub sort_mode: SortMode,
    /// Entries in display order
    pub entries: Vec<GameEntry>,
    /// Whether mutations are currently accepted (false during an import)
    pub interactive: bool,
}

/// Library controller
///
/// Lives on the control thread. While an import runs the controller is not
/// interactive: every mutating call returns `ImportInProgress` until the
/// worker's `BatchDone` has been consumed by `poll_import` or `wait_for_import`.
pub struct LibraryController {
    paths: AppPaths,
    registry: Arc<RwLock<GameRegistry>>,
    icons: Arc<IconCache>,
    settings: Settings,
    interactive: bool,
    import: Option<ImportJob>,
    view_sender: Option<SyncSender<LibraryView>>,
}

impl LibraryController {
    /// Open the library stored under `paths`
    ///
    /// Loads settings and the registry, then migrates legacy entries and tells
    /// `prompt` how many were migrated.
    pub fn open(paths: AppPaths, prompt: &mut dyn UserPrompt) -> Result<Self> {
        paths.ensure_root()?;
        let settings = ConfigManager::load_settings(&paths);
        let store = JsonFileStore::new(paths.registry_file());
        Self::open_with(
            paths,
            settings,
            Box::new(store),
            IdAllocator::new(),
            Arc::new(IconCache::new()),
            prompt,
        )
    }

    /// Open with explicit collaborators
    pub fn open_with(
        paths: AppPaths,
        settings: Settings,
        store: Box<dyn RegistryStore>,
        allocator: IdAllocator,
        icons: Arc<IconCache>,
        prompt: &mut dyn UserPrompt,
    ) -> Result<Self> {
        let mut registry = GameRegistry::load(store, allocator)?;

        let outcome = migrate(&mut registry)?;
        if outcome.changed() {
            prompt.notify(&Notice::MigrationCompleted {
                count: outcome.migrated_count(),
            });
        }

        info!(
            "Library opened with {} entries, sort mode {:?}",
            registry.len(),
            settings.sort_mode
        );

        Ok(Self {
            paths,
            registry: Arc::new(RwLock::new(registry)),
            icons,
            settings,
            interactive: true,
            import: None,
            view_sender: None,
        })
    }

    /// Receive a `LibraryView` after every change
    ///
    /// The current view is sent immediately. Views that do not fit into the
    /// channel's `capacity` are dropped rather than blocking the controller.
    pub fn subscribe(&mut self, capacity: usize) -> Receiver<LibraryView> {
        let (sender, receiver) = mpsc::sync_channel(capacity.max(1));
        self.view_sender = Some(sender);
        self.publish();
        receiver
    }

    /// Current projection of the library
    pub fn view(&self) -> LibraryView {
        self.view_with(self.settings.sort_mode)
    }

    /// Projection with an explicit ordering, leaving the setting untouched
    pub fn view_with(&self, sort_mode: SortMode) -> LibraryView {
        let registry = self.registry.read();
        LibraryView {
            sort_mode,
            entries: project(registry.all(), sort_mode)
                .into_iter()
                .cloned()
                .collect(),
            interactive: self.interactive,
        }
    }

    /// Look up entry `id`
    pub fn find(&self, id: Uuid) -> Result<GameEntry> {
        self.registry.read().find_by_id(id).cloned()
    }

    /// Icon for entry `id`, loaded on first use
    pub fn icon_for(&self, id: Uuid) -> Result<IconImage> {
        let entry = self.find(id)?;
        Ok(self.icons.get_or_load(&entry, false))
    }

    /// Icons for every entry of `view`, in view order
    pub fn icons_for_view(&self, view: &LibraryView) -> Vec<IconImage> {
        let entries: Vec<&GameEntry> = view.entries.iter().collect();
        self.icons.get_or_load_many(&entries)
    }

    /// Icon cache shared with the import worker
    pub fn icons(&self) -> &IconCache {
        &self.icons
    }

    /// Current settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Whether mutations are accepted right now
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Whether an import batch is running
    pub fn import_in_progress(&self) -> bool {
        self.import.is_some()
    }

    /// Add the executable at `path`
    ///
    /// Returns `None` if the customizer cancelled.
    pub fn add_game(
        &mut self,
        path: &Path,
        customizer: &mut dyn EntryCustomizer,
    ) -> Result<Option<GameEntry>> {
        self.ensure_interactive()?;

        let candidate = prepare_candidate(path, &self.registry)?;
        let Customization::Confirmed(entry) = customizer.customize(candidate) else {
            debug!("Add of {} cancelled", path.display());
            return Ok(None);
        };

        let stored = self.registry.write().add(entry)?;
        self.publish();
        Ok(Some(stored))
    }

    /// Edit entry `id` through `customizer`
    ///
    /// The cached icon is dropped when the executable or custom icon changed.
    /// Returns `None` if the customizer cancelled.
    pub fn edit_game(
        &mut self,
        id: Uuid,
        customizer: &mut dyn EntryCustomizer,
    ) -> Result<Option<GameEntry>> {
        self.ensure_interactive()?;

        let current = self.find(id)?;
        let Customization::Confirmed(new_values) = customizer.customize(current.clone()) else {
            debug!("Edit of {} cancelled", id);
            return Ok(None);
        };

        let updated = self.registry.write().edit(id, new_values)?;
        if current.icon_differs_from(&updated) {
            self.icons.invalidate(id);
        }
        self.publish();
        Ok(Some(updated))
    }

    /// Delete entry `id` after `prompt` confirms
    ///
    /// Returns `None` if the user declined.
    pub fn delete_game(
        &mut self,
        id: Uuid,
        prompt: &mut dyn UserPrompt,
    ) -> Result<Option<GameEntry>> {
        self.ensure_interactive()?;

        let entry = self.find(id)?;
        if !prompt.confirm_delete(&entry) {
            debug!("Delete of '{}' declined", entry.display_name);
            return Ok(None);
        }

        let removed = self.registry.write().delete(id)?;
        self.icons.invalidate(id);
        self.publish();
        Ok(Some(removed))
    }

    /// Change the list ordering and persist it
    pub fn set_sort_mode(&mut self, mode: SortMode) -> Result<()> {
        self.ensure_interactive()?;
        if self.settings.sort_mode == mode {
            return Ok(());
        }

        let previous = self.settings.sort_mode;
        self.settings.sort_mode = mode;
        if let Err(e) = ConfigManager::save_settings(&self.paths, &self.settings) {
            self.settings.sort_mode = previous;
            return Err(e);
        }

        info!("Sort mode changed to {:?}", mode);
        self.publish();
        Ok(())
    }

    /// Start importing `paths` on the background worker
    ///
    /// The controller stops accepting mutations before the worker starts and
    /// accepts them again once the batch is finished.
    pub fn begin_import(
        &mut self,
        paths: Vec<PathBuf>,
        customizer: Box<dyn EntryCustomizer>,
    ) -> Result<()> {
        self.ensure_interactive()?;

        self.interactive = false;
        match ImportJob::spawn(
            paths,
            Arc::clone(&self.registry),
            Arc::clone(&self.icons),
            customizer,
        ) {
            Ok(job) => {
                info!("Import of {} paths started", job.total());
                self.import = Some(job);
                self.publish();
                Ok(())
            }
            Err(e) => {
                self.interactive = true;
                Err(e)
            }
        }
    }

    /// Process pending import events without blocking
    ///
    /// Returns the report once the batch is finished, `None` while it runs or
    /// when no import was started.
    pub fn poll_import(&mut self) -> Result<Option<ImportReport>> {
        loop {
            let Some(job) = &self.import else {
                return Ok(None);
            };
            match job.try_event() {
                Ok(event) => {
                    if let Some(report) = self.handle_import_event(event)? {
                        return Ok(Some(report));
                    }
                }
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Disconnected) => return Err(self.fail_import()),
            }
        }
    }

    /// Block until the running import finishes
    ///
    /// Returns `None` when no import was started.
    pub fn wait_for_import(&mut self) -> Result<Option<ImportReport>> {
        loop {
            let Some(job) = &self.import else {
                return Ok(None);
            };
            match job.next_event() {
                Some(event) => {
                    if let Some(report) = self.handle_import_event(event)? {
                        return Ok(Some(report));
                    }
                }
                None => return Err(self.fail_import()),
            }
        }
    }

    /// Save settings, including the window state, before exit
    ///
    /// A running import is allowed to finish first.
    pub fn shutdown(mut self, window: WindowState) -> Result<()> {
        if self.import.is_some() {
            info!("Waiting for running import before shutdown");
            if let Err(e) = self.wait_for_import() {
                warn!("Import did not finish cleanly: {e}");
            }
        }

        self.settings.window = window;
        ConfigManager::save_settings(&self.paths, &self.settings)?;
        info!("Library closed");
        Ok(())
    }

    fn handle_import_event(&mut self, event: ImportEvent) -> Result<Option<ImportReport>> {
        match event {
            ImportEvent::ItemProcessed {
                index,
                total,
                path,
                status,
            } => {
                debug!(
                    "Import {}/{}: {} -> {:?}",
                    index + 1,
                    total,
                    path.display(),
                    status
                );
                self.publish();
                Ok(None)
            }
            ImportEvent::BatchDone(report) => {
                let joined = self.import.take().map_or(Ok(()), ImportJob::join);
                self.interactive = true;
                self.publish();
                joined?;
                info!("Import finished: {}", report.summary());
                Ok(Some(report))
            }
        }
    }

    /// Worker went away without `BatchDone`
    fn fail_import(&mut self) -> GameShelfError {
        let error = match self.import.take().map(ImportJob::join) {
            Some(Err(e)) => e,
            _ => GameShelfError::ImportWorkerFailed(StringError::new(
                "import worker exited without reporting",
            )),
        };
        self.interactive = true;
        warn!("Import aborted: {error}");
        self.publish();
        error
    }

    fn ensure_interactive(&self) -> Result<()> {
        if self.interactive {
            Ok(())
        } else {
            Err(GameShelfError::ImportInProgress)
        }
    }

    fn publish(&mut self) {
        let Some(sender) = &self.view_sender else {
            return;
        };
        match sender.try_send(self.view()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => debug!("View subscriber is behind, skipping update"),
            Err(TrySendError::Disconnected(_)) => {
                debug!("View subscriber gone");
                self.view_sender = None;
            }
        }
    }
}

impl std::fmt::Debug for LibraryController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryController")
            .field("paths", &self.paths)
            .field("settings", &self.settings)
            .field("interactive", &self.interactive)
            .field("import_in_progress", &self.import.is_some())
            .finish_non_exhaustive()
    }
}
