//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! [`Walker`] traverses one root directory depth-first (children sorted by
//! name for deterministic output) and returns the regular files that are
//! candidates for fingerprinting.
//!
//! Errors fall into two classes:
//! - **Traversal errors** (unreadable directory, missing root, symlink loop)
//!   abort the walk with a [`ScanError`]: the root was not fully seen.
//! - **Per-file problems** (metadata unreadable, vanished file, file over the
//!   size limit) are returned as [`SkippedFile`] entries next to the
//!   candidates so the caller can report them.
//!
//! # Example
//!
//! ```no_run
//! use dupesift::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::default());
//! let output = walker.walk().unwrap();
//! println!("{} candidates, {} skipped", output.files.len(), output.skipped.len());
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use walkdir::{DirEntry, WalkDir};

use super::{FileEntry, ScanError, WalkerConfig};

/// Why a file found during the walk is not a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Larger than the configured limit; carries the file size.
    TooLarge(u64),
    /// Metadata could not be read; carries the error text.
    Unreadable(String),
}

/// A file excluded during the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    /// Path of the excluded file
    pub path: PathBuf,
    /// Why it was excluded
    pub reason: SkipReason,
}

/// Result of walking a root.
#[derive(Debug, Clone, Default)]
pub struct WalkOutput {
    /// Regular files that passed every filter
    pub files: Vec<FileEntry>,
    /// Files that were excluded and should be reported
    pub skipped: Vec<SkippedFile>,
    /// Whether the walk stopped early because shutdown was requested
    pub interrupted: bool,
}

/// Directory walker for one root.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given root.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The root this walker traverses.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Build gitignore matcher from config patterns.
    fn build_gitignore(&self) -> Option<Gitignore> {
        if self.config.ignore_patterns.is_empty() {
            return None;
        }

        let mut builder = GitignoreBuilder::new(&self.root);
        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if !gitignore.is_empty() => Some(gitignore),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    /// Whether the walk should descend into / yield this entry.
    fn keep_entry(&self, entry: &DirEntry, gitignore: Option<&Gitignore>) -> bool {
        if entry.depth() == 0 {
            return true;
        }

        if self.config.skip_hidden && entry.file_name().to_string_lossy().starts_with('.') {
            log::trace!("Skipping hidden: {}", entry.path().display());
            return false;
        }

        if let Some(gi) = gitignore {
            let relative = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());
            if gi
                .matched(relative, entry.file_type().is_dir())
                .is_ignore()
            {
                log::trace!("Ignoring: {}", entry.path().display());
                return false;
            }
        }

        true
    }

    fn validate_root(&self) -> Result<(), ScanError> {
        let metadata = std::fs::metadata(&self.root)
            .map_err(|e| ScanError::from_io(self.root.clone(), e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(self.root.clone()));
        }
        Ok(())
    }

    /// Walk the root, collecting candidates.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] if the root is missing or not a directory, or if
    /// any directory below it cannot be read.
    pub fn walk(&self) -> Result<WalkOutput, ScanError> {
        self.validate_root()?;

        let gitignore = self.build_gitignore();
        let mut output = WalkOutput::default();

        let walk_dir = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        let entries = walk_dir
            .into_iter()
            .filter_entry(|e| self.keep_entry(e, gitignore.as_ref()));

        for entry_result in entries {
            if self.is_shutdown_requested() {
                log::debug!("Walker: Shutdown requested, stopping iteration");
                output.interrupted = true;
                break;
            }

            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    if let Some(skipped) = self.absorb_walk_error(&e) {
                        output.skipped.push(skipped);
                        continue;
                    }
                    return Err(self.walk_error(e));
                }
            };

            if !entry.file_type().is_file() {
                if !entry.file_type().is_dir() {
                    log::trace!("Skipping non-regular file: {}", entry.path().display());
                }
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    log::warn!("Cannot read metadata for {}: {}", entry.path().display(), e);
                    output.skipped.push(SkippedFile {
                        path: entry.into_path(),
                        reason: SkipReason::Unreadable(e.to_string()),
                    });
                    continue;
                }
            };

            let size = metadata.len();

            if let Some(max) = self.config.max_size {
                if size > max {
                    log::debug!("Skipping large file ({} bytes): {}", size, entry.path().display());
                    output.skipped.push(SkippedFile {
                        path: entry.into_path(),
                        reason: SkipReason::TooLarge(size),
                    });
                    continue;
                }
            }

            if size == 0 && self.config.skip_empty {
                log::trace!("Skipping empty file: {}", entry.path().display());
                continue;
            }

            output.files.push(FileEntry::new(entry.into_path(), size));
        }

        log::debug!(
            "Walked {}: {} candidates, {} skipped",
            self.root.display(),
            output.files.len(),
            output.skipped.len()
        );

        Ok(output)
    }

    /// A dangling entry below the root (vanished file, broken symlink) is a
    /// per-file problem, not a traversal failure.
    fn absorb_walk_error(&self, error: &walkdir::Error) -> Option<SkippedFile> {
        if error.depth() == 0 || error.loop_ancestor().is_some() {
            return None;
        }
        let io = error.io_error()?;
        if io.kind() != ErrorKind::NotFound {
            return None;
        }
        let path = error.path()?.to_path_buf();
        log::debug!("Entry vanished during walk: {}", path.display());
        Some(SkippedFile {
            path,
            reason: SkipReason::Unreadable(io.to_string()),
        })
    }

    fn walk_error(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);

        if error.loop_ancestor().is_some() {
            log::warn!("Symlink loop detected at {}", path.display());
            return ScanError::SymlinkLoop(path);
        }

        log::warn!("Walker error for {}: {}", path.display(), error);
        match error.into_io_error() {
            Some(io) => ScanError::from_io(path, io),
            None => ScanError::Io {
                path,
                source: std::io::Error::other("directory traversal failed"),
            },
        }
    }
}
