//! File deletion.
//!
//! # Overview
//!
//! Deletion is either permanent (`fs::remove_file`) or a move to the
//! system trash via the `trash` crate. [`delete_batch`] attempts every path
//! it is given; a failure on one path never stops the rest. Missing files
//! are reported as failures, not errors, since another process may have
//! removed them between scan and delete.
//!
//! Directories are refused: only regular files (and symlinks, which are
//! removed without touching their target) are deleted.
//!
//! # Example
//!
//! ```no_run
//! use dupesift::actions::delete::{delete_file, DeleteMode};
//! use std::path::Path;
//!
//! match delete_file(Path::new("/path/to/duplicate.txt"), DeleteMode::Trash) {
//!     Ok(size) => println!("Freed {} bytes", size),
//!     Err(e) => eprintln!("Failed: {}", e),
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The path is a directory.
    #[error("not a file: {0}")]
    NotAFile(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed {
        /// Path that could not be trashed
        path: PathBuf,
        /// Error reported by the platform trash
        message: String,
    },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::NotAFile(p)
            | Self::TrashFailed { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }

    /// Whether the file was already gone.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// How files are removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DeleteMode {
    /// Remove from the filesystem; cannot be undone.
    #[default]
    Permanent,
    /// Move to the system trash.
    Trash,
}

impl std::fmt::Display for DeleteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Permanent => write!(f, "permanent"),
            Self::Trash => write!(f, "trash"),
        }
    }
}

/// Delete one file. Returns its size in bytes.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `NotAFile` if the path is a directory
/// - `PermissionDenied` if deletion is not allowed
/// - `TrashFailed` if the trash operation fails
pub fn delete_file(path: &Path, mode: DeleteMode) -> Result<u64, DeleteError> {
    let metadata = fs::symlink_metadata(path).map_err(|e| DeleteError::from_io(path, e))?;
    if metadata.is_dir() {
        return Err(DeleteError::NotAFile(path.to_path_buf()));
    }
    let size = metadata.len();

    match mode {
        DeleteMode::Permanent => {
            fs::remove_file(path).map_err(|e| {
                log::error!("Permanent delete failed for {}: {}", path.display(), e);
                DeleteError::from_io(path, e)
            })?;
            log::info!("Permanently deleted: {} ({} bytes)", path.display(), size);
        }
        DeleteMode::Trash => {
            trash::delete(path).map_err(|e| {
                log::error!("Trash operation failed for {}: {}", path.display(), e);
                DeleteError::TrashFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
            })?;
            log::info!("Moved to trash: {} ({} bytes)", path.display(), size);
        }
    }

    Ok(size)
}

/// A path that could not be deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteFailure {
    /// The path
    pub path: PathBuf,
    /// Why it failed
    pub reason: String,
    /// Whether the file did not exist
    pub not_found: bool,
}

/// Result of a batch deletion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    /// Paths removed, in request order
    pub deleted: Vec<PathBuf>,
    /// Paths that could not be removed, in request order
    pub failed: Vec<DeleteFailure>,
    /// Total bytes freed
    pub bytes_freed: u64,
}

impl DeleteOutcome {
    /// Number of paths attempted.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.deleted.len() + self.failed.len()
    }

    /// Whether every deletion succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    /// Paths that failed.
    #[must_use]
    pub fn failed_paths(&self) -> Vec<PathBuf> {
        self.failed.iter().map(|f| f.path.clone()).collect()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.all_succeeded() {
            format!(
                "Deleted {} file(s), freed {}",
                self.deleted.len(),
                bytesize::ByteSize::b(self.bytes_freed)
            )
        } else {
            format!(
                "Deleted {} file(s), {} failed, freed {}",
                self.deleted.len(),
                self.failed.len(),
                bytesize::ByteSize::b(self.bytes_freed)
            )
        }
    }
}

/// Callback trait for deletion progress reporting.
pub trait DeleteProgressCallback {
    /// Called before each file deletion.
    fn on_before_delete(&self, _path: &Path, _index: usize, _total: usize) {}

    /// Called after successful deletion.
    fn on_delete_success(&self, path: &Path, size: u64);

    /// Called after failed deletion.
    fn on_delete_failure(&self, path: &Path, error: &DeleteError);

    /// Called when the batch completes.
    fn on_complete(&self, _outcome: &DeleteOutcome) {}
}

/// Delete multiple files.
///
/// Duplicated input paths are attempted once, in first-seen order. Every
/// path is attempted regardless of earlier failures.
pub fn delete_batch(
    paths: &[PathBuf],
    mode: DeleteMode,
    callback: Option<&dyn DeleteProgressCallback>,
) -> DeleteOutcome {
    let mut seen = HashSet::new();
    let unique: Vec<&PathBuf> = paths.iter().filter(|p| seen.insert(*p)).collect();
    let total = unique.len();
    let mut outcome = DeleteOutcome::default();

    for (index, path) in unique.into_iter().enumerate() {
        if let Some(cb) = callback {
            cb.on_before_delete(path, index, total);
        }

        match delete_file(path, mode) {
            Ok(size) => {
                outcome.bytes_freed += size;
                if let Some(cb) = callback {
                    cb.on_delete_success(path, size);
                }
                outcome.deleted.push(path.clone());
            }
            Err(e) => {
                log::warn!("Failed to delete {}: {}", path.display(), e);
                if let Some(cb) = callback {
                    cb.on_delete_failure(path, &e);
                }
                outcome.failed.push(DeleteFailure {
                    path: path.clone(),
                    reason: e.to_string(),
                    not_found: e.is_not_found(),
                });
            }
        }
    }

    if let Some(cb) = callback {
        cb.on_complete(&outcome);
    }
    log::info!("{}", outcome.summary());

    outcome
}
