//! Utility modules
//!
//! Provides the icon cache, native icon extraction and logging setup.

pub mod icon_cache;
pub mod icon_extractor;
pub mod logging;

pub use icon_cache::{CacheStats, FileSystemProbe, IconCache, IconImage, IconProbe, IconSource};
pub use icon_extractor::{display_name_from_path, extract_icon_from_exe};
pub use logging::init_logging;
