//! Error types for `gameshelf`
//!
//! `GameShelfError` covers every failure that is surfaced to a caller.
//! Icon loading has its own `IconLoadError`, which the icon cache logs and
//! absorbs; it never reaches registry or controller callers.
//!
//! Variants that wrap a lower-level failure keep it as `#[source]` so the full
//! chain is visible in logs.

use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Simple error type for wrapping string messages while implementing `std::error::Error`
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StringError(pub String);

impl StringError {
    /// Create a new `StringError` from a string message
    pub fn new(msg: impl Into<String>) -> Box<Self> {
        Box::new(Self(msg.into()))
    }
}

/// Main error type for `gameshelf`
#[derive(Debug, Error)]
pub enum GameShelfError {
    /// No live entry carries this identifier
    #[error("Game entry not found: {0}")]
    NotFound(Uuid),

    /// The identifier allocator kept producing identifiers that were already taken
    #[error("Failed to allocate a unique identifier after {attempts} attempts")]
    AllocationExhausted {
        /// Number of candidates generated before giving up
        attempts: usize,
    },

    /// Reading or writing the registry store failed
    /// Preserves the underlying error source for full error chain transparency
    #[error("Failed to persist game registry: {0}")]
    PersistenceFailure(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Settings or data directory error
    /// Preserves the underlying error source for full error chain transparency
    #[error("Configuration error: {0}")]
    ConfigError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A mutation was requested while an import batch owns the registry
    #[error("An import is already in progress")]
    ImportInProgress,

    /// The import worker could not be started or died before reporting
    #[error("Import worker failed: {0}")]
    ImportWorkerFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A dropped path cannot be turned into a game entry
    #[error("Cannot import path: {}", .0.display())]
    InvalidImportPath(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl GameShelfError {
    /// Wrap any error as a persistence failure
    pub fn persistence(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::PersistenceFailure(source.into())
    }
}

/// Result type alias for `gameshelf` operations
pub type Result<T> = std::result::Result<T, GameShelfError>;

/// Soft failure while producing an icon
///
/// Only ever logged by the icon cache, which substitutes the generic icon.
#[derive(Debug, Error)]
pub enum IconLoadError {
    /// The referenced file does not exist
    #[error("Icon source not found: {}", .0.display())]
    FileMissing(PathBuf),

    /// The file exists but is not a decodable image
    #[error("Failed to decode icon {}: {source}", path.display())]
    Decode {
        /// File that failed to decode
        path: PathBuf,
        /// Decoder error
        #[source]
        source: image::ImageError,
    },

    /// The platform could not extract an icon from the executable
    #[error("Failed to extract icon from {}: {reason}", path.display())]
    Extraction {
        /// Executable the icon was requested from
        path: PathBuf,
        /// Platform-specific failure description
        reason: String,
    },

    /// Native icon extraction is not available on this platform
    #[error("Native icon extraction is not supported on this platform")]
    Unsupported,
}

/// Convert an error to a user-friendly message
///
/// Returns text suitable for a dialog or terminal. Missing entries read as
/// "no longer exists" and persistence failures as retryable save errors.
pub fn get_user_friendly_error(error: &GameShelfError) -> String {
    match error {
        GameShelfError::NotFound(_) => "This entry no longer exists.\n\n\
             It may have been removed in the meantime.\n\
             Refresh the game list and try again."
            .to_string(),
        GameShelfError::AllocationExhausted { .. } => {
            "Could not assign an identifier to the game entry.\n\n\
             Please try again. If the problem persists, restart the application."
                .to_string()
        }
        GameShelfError::PersistenceFailure(e) => {
            format!(
                "Failed to save your game library:\n\n{e}\n\n\
                 Your change was not applied. Check disk space and permissions, then try again."
            )
        }
        GameShelfError::ConfigError(_) => "Failed to load or save settings.\n\n\
             Your preferences may not persist.\n\
             Check that you have write permissions to the data directory."
            .to_string(),
        GameShelfError::ImportInProgress => "An import is still running.\n\n\
             Wait for it to finish before changing the library."
            .to_string(),
        GameShelfError::ImportWorkerFailed(e) => {
            format!(
                "The import stopped unexpectedly:\n\n{e}\n\n\
                 Entries added before the failure were kept."
            )
        }
        GameShelfError::InvalidImportPath(path) => {
            format!(
                "Cannot add '{}' as a game.\n\n\
                 Drop an executable file instead.",
                path.display()
            )
        }
        GameShelfError::IoError(e) => {
            format!(
                "A file system error occurred:\n\n{e}\n\n\
                 Please check file permissions and disk space."
            )
        }
        GameShelfError::JsonError(e) => {
            format!(
                "A data file is corrupted:\n\n{e}\n\n\
                 Restore it from a backup or remove it to start over."
            )
        }
    }
}
