//! Icon cache module
//!
//! In-memory cache of 32x32 RGBA icons keyed by entry identifier. Icons are
//! loaded lazily the first time an entry is rendered and reused until the entry
//! is invalidated or flagged as icon-dirty.
//!
//! # Resolution order
//!
//! 1. Cached image (evicted first when the caller flags the entry icon-dirty)
//! 2. `custom_icon_path`, decoded with the `image` crate, when the file exists
//! 3. Icon embedded in `executable_path`, when the file exists
//! 4. Built-in generic application icon
//!
//! A failed decode of an existing custom icon goes straight to step 4.
//!
//! # Failure handling
//!
//! No operation fails. `IconLoadError`s are logged and replaced by the
//! fallback icon, so icon problems never block registry operations.
//!
//! # Example
//!
//! ```
//! use gameshelf::config::GameEntry;
//! use gameshelf::utils::icon_cache::{IconCache, IconSource};
//! use uuid::Uuid;
//!
//! let cache = IconCache::new();
//! let mut entry = GameEntry::new("Missing", "/nowhere/missing.exe", "/nowhere");
//! entry.id = Uuid::new_v4();
//!
//! let icon = cache.get_or_load(&entry, false);
//! assert_eq!(icon.source(), IconSource::Fallback);
//! assert_eq!(icon.rgba().len(), 32 * 32 * 4);
//! ```

use crate::config::GameEntry;
use crate::error::IconLoadError;
use crate::utils::icon_extractor::{
    ICON_SIZE, extract_icon_from_exe, generic_application_icon,
};
use image::{ImageReader, imageops::FilterType};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Where a cached icon came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconSource {
    /// Decoded from the entry's custom icon file
    Custom,
    /// Extracted from the entry's executable
    Executable,
    /// Built-in generic application icon
    Fallback,
}

/// Immutable 32x32 RGBA icon
///
/// Cloning is cheap; pixel data is shared.
#[derive(Clone, PartialEq, Eq)]
pub struct IconImage {
    rgba: Arc<[u8]>,
    source: IconSource,
}

impl IconImage {
    fn new(rgba: Vec<u8>, source: IconSource) -> Self {
        Self {
            rgba: rgba.into(),
            source,
        }
    }

    /// Raw RGBA8 pixels, row-major, `width() * height() * 4` bytes
    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// Where the pixels came from
    pub fn source(&self) -> IconSource {
        self.source
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        ICON_SIZE
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        ICON_SIZE
    }

    /// Whether this is the generic fallback icon
    pub fn is_fallback(&self) -> bool {
        self.source == IconSource::Fallback
    }
}

impl fmt::Debug for IconImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IconImage")
            .field("source", &self.source)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

/// Filesystem access used to resolve icons
///
/// Every method may fail; the cache absorbs the failures.
pub trait IconProbe: Send + Sync {
    /// Whether `path` names an existing file
    fn file_exists(&self, path: &Path) -> bool;

    /// Extract the icon embedded in an executable as 32x32 RGBA
    fn extract_icon(&self, executable: &Path) -> Result<Vec<u8>, IconLoadError>;

    /// Decode an image file to 32x32 RGBA
    fn decode_image(&self, path: &Path) -> Result<Vec<u8>, IconLoadError>;
}

/// Probe backed by the real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemProbe;

impl IconProbe for FileSystemProbe {
    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn extract_icon(&self, executable: &Path) -> Result<Vec<u8>, IconLoadError> {
        extract_icon_from_exe(executable)
    }

    /// Decode with format sniffing, then resize to 32x32 using Lanczos3
    fn decode_image(&self, path: &Path) -> Result<Vec<u8>, IconLoadError> {
        let decode_error = |source| IconLoadError::Decode {
            path: path.to_path_buf(),
            source,
        };

        let img = ImageReader::open(path)
            .and_then(ImageReader::with_guessed_format)
            .map_err(|e| decode_error(image::ImageError::IoError(e)))?
            .decode()
            .map_err(decode_error)?;

        let rgba = img
            .resize_exact(ICON_SIZE, ICON_SIZE, FilterType::Lanczos3)
            .to_rgba8()
            .into_raw();
        debug_assert_eq!(rgba.len(), (ICON_SIZE * ICON_SIZE * 4) as usize);
        Ok(rgba)
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached icons
    pub count: usize,
    /// Total size of all cached pixel data in bytes
    pub size_bytes: u64,
}

impl CacheStats {
    /// Format size as human-readable string
    ///
    /// ```
    /// use gameshelf::utils::icon_cache::CacheStats;
    ///
    /// let stats = CacheStats { count: 10, size_bytes: 40960 };
    /// assert_eq!(stats.size_human_readable(), "40 KB");
    /// ```
    #[expect(
        clippy::cast_precision_loss,
        reason = "display-only conversion of byte counts"
    )]
    pub fn size_human_readable(&self) -> String {
        const KB: u64 = 1024;
        const MB: u64 = 1024 * KB;

        if self.size_bytes >= MB {
            format!("{:.1} MB", self.size_bytes as f64 / MB as f64)
        } else if self.size_bytes >= KB {
            format!("{} KB", self.size_bytes / KB)
        } else {
            format!("{} bytes", self.size_bytes)
        }
    }
}

/// In-memory icon cache keyed by entry identifier
///
/// All methods take `&self`; the map is guarded by a mutex that is never held
/// while an icon is being loaded, so the cache can be shared across threads.
pub struct IconCache {
    icons: Mutex<HashMap<Uuid, IconImage>>,
    probe: Arc<dyn IconProbe>,
    fallback: IconImage,
}

impl IconCache {
    /// Cache reading from the real filesystem
    pub fn new() -> Self {
        Self::with_probe(Arc::new(FileSystemProbe))
    }

    /// Cache using a custom probe
    pub fn with_probe(probe: Arc<dyn IconProbe>) -> Self {
        Self {
            icons: Mutex::new(HashMap::new()),
            probe,
            fallback: IconImage::new(generic_application_icon(), IconSource::Fallback),
        }
    }

    /// Return the icon for `entry`, loading it on a miss
    ///
    /// With `icon_dirty` set, any cached image for the entry is dropped first
    /// and the icon is resolved again from the entry's current fields.
    /// Entries without an identifier are resolved but never cached.
    pub fn get_or_load(&self, entry: &GameEntry, icon_dirty: bool) -> IconImage {
        if entry.id.is_nil() {
            return self.resolve(entry);
        }

        {
            let mut icons = self.icons.lock();
            if icon_dirty {
                if icons.remove(&entry.id).is_some() {
                    debug!("Evicted icon-dirty entry {}", entry.id);
                }
            } else if let Some(icon) = icons.get(&entry.id) {
                return icon.clone();
            }
        }

        let icon = self.resolve(entry);
        self.icons.lock().insert(entry.id, icon.clone());
        icon
    }

    /// Icons for several entries, loading misses in parallel
    ///
    /// Output order matches `entries`.
    pub fn get_or_load_many(&self, entries: &[&GameEntry]) -> Vec<IconImage> {
        entries
            .par_iter()
            .map(|entry| self.get_or_load(entry, false))
            .collect()
    }

    /// Drop the cached icon for `id`; returns whether one was cached
    pub fn invalidate(&self, id: Uuid) -> bool {
        let removed = self.icons.lock().remove(&id).is_some();
        if removed {
            debug!("Invalidated cached icon for {}", id);
        }
        removed
    }

    /// Whether an icon is cached for `id`
    pub fn contains(&self, id: Uuid) -> bool {
        self.icons.lock().contains_key(&id)
    }

    /// Drop every cached icon
    pub fn clear(&self) {
        self.icons.lock().clear();
    }

    /// Number of cached icons and their pixel data size
    pub fn stats(&self) -> CacheStats {
        let icons = self.icons.lock();
        CacheStats {
            count: icons.len(),
            size_bytes: icons.values().map(|icon| icon.rgba.len() as u64).sum(),
        }
    }

    /// The generic application icon
    pub fn fallback_icon(&self) -> IconImage {
        self.fallback.clone()
    }

    fn resolve(&self, entry: &GameEntry) -> IconImage {
        if let Some(custom) = entry.custom_icon()
            && self.probe.file_exists(custom)
        {
            return match self.probe.decode_image(custom) {
                Ok(rgba) => self.checked(entry, rgba, IconSource::Custom),
                Err(e) => {
                    warn!("Custom icon for '{}' unusable: {e}", entry.display_name);
                    self.fallback_icon()
                }
            };
        }

        if !self.probe.file_exists(&entry.executable_path) {
            debug!(
                "No icon source for '{}', using fallback icon",
                entry.display_name
            );
            return self.fallback_icon();
        }

        match self.probe.extract_icon(&entry.executable_path) {
            Ok(rgba) => self.checked(entry, rgba, IconSource::Executable),
            Err(IconLoadError::Unsupported) => self.fallback_icon(),
            Err(e) => {
                warn!("Icon extraction for '{}' failed: {e}", entry.display_name);
                self.fallback_icon()
            }
        }
    }

    fn checked(&self, entry: &GameEntry, rgba: Vec<u8>, source: IconSource) -> IconImage {
        if rgba.len() == (ICON_SIZE * ICON_SIZE * 4) as usize {
            IconImage::new(rgba, source)
        } else {
            warn!(
                "Icon for '{}' has {} bytes, expected 32x32 RGBA",
                entry.display_name,
                rgba.len()
            );
            self.fallback_icon()
        }
    }
}

impl Default for IconCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for IconCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IconCache")
            .field("cached", &self.icons.lock().len())
            .finish_non_exhaustive()
    }
}
