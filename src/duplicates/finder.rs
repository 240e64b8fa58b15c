//! Scan pipeline.
//!
//! # Overview
//!
//! [`DuplicateFinder`] runs one scan:
//! 1. **Walk** each root in order, collecting candidate files. A root that
//!    cannot be fully traversed aborts the whole scan.
//! 2. **Fingerprint** the candidates on a rayon pool. Each worker hashes a
//!    file, classifies it, and folds the result into a fresh
//!    [`DuplicateIndex`]. Files that fail to hash are reported and skipped.
//!
//! The index built here is a staging copy: nothing is visible to readers of
//! the live cache until the caller publishes it.
//!
//! # Example
//!
//! ```no_run
//! use dupesift::activity::LogRecorder;
//! use dupesift::classify::Classifier;
//! use dupesift::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_threads(4));
//! let classifier = Classifier::new(Arc::new(Vec::new()), Arc::new(LogRecorder));
//!
//! let outcome = finder
//!     .find_duplicates_in_paths(&[PathBuf::from(".")], &classifier, &LogRecorder)
//!     .unwrap();
//! println!("Found {} duplicate groups", outcome.summary.duplicate_groups);
//! ```

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use rayon::prelude::*;
use serde::Serialize;

use super::index::{DuplicateIndex, FileRecord};
use crate::activity::ActivityRecorder;
use crate::classify::Classifier;
use crate::progress::{ProgressCallback, PHASE_FINGERPRINTING, PHASE_WALKING};
use crate::scanner::{
    FileEntry, FingerprintAlgorithm, Fingerprinter, ScanError, SkipReason, Walker, WalkerConfig,
    DEFAULT_BUFFER_SIZE,
};

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Worker threads for fingerprinting. 0 uses the global rayon pool,
    /// which has one thread per hardware thread.
    pub threads: usize,
    /// Digest for content fingerprints.
    pub algorithm: FingerprintAlgorithm,
    /// Read buffer size for fingerprinting.
    pub buffer_size: usize,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("threads", &self.threads)
            .field("algorithm", &self.algorithm)
            .field("buffer_size", &self.buffer_size)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            algorithm: FingerprintAlgorithm::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            walker_config: WalkerConfig::default()
                .with_max_size(Some(crate::scanner::DEFAULT_MAX_FILE_SIZE)),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the worker thread count (0 = all hardware threads).
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the fingerprint algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: FingerprintAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the read buffer size.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary statistics from a scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanSummary {
    /// Number of roots walked
    pub roots: usize,
    /// Candidate files found by the walk
    pub total_files: usize,
    /// Total size of the candidates in bytes
    pub total_size: u64,
    /// Candidates fingerprinted and indexed
    pub processed_files: usize,
    /// Candidates that could not be fingerprinted
    pub failed_files: usize,
    /// Files excluded during the walk (too large, unreadable metadata)
    pub skipped_files: usize,
    /// Groups with two or more members
    pub duplicate_groups: usize,
    /// Files across all duplicate groups
    pub duplicate_files: usize,
    /// Wall-clock duration of the scan
    #[serde(with = "duration_millis")]
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Format total size as human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize::b(self.total_size).to_string()
    }
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

/// Errors that abort a scan.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// A root could not be traversed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// The worker pool could not be created.
    #[error("Failed to build thread pool: {0}")]
    ThreadPool(String),
}

/// A completed scan: the staging index plus its statistics.
#[derive(Debug)]
pub struct ScanOutcome {
    /// Index holding every fingerprinted file
    pub index: DuplicateIndex,
    /// Statistics for the scan
    pub summary: ScanSummary,
}

/// Duplicate finder that runs the walk and fingerprint pipeline.
#[derive(Debug)]
pub struct DuplicateFinder {
    config: FinderConfig,
    fingerprinter: Fingerprinter,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut fingerprinter =
            Fingerprinter::new(config.algorithm).with_buffer_size(config.buffer_size);
        if let Some(ref flag) = config.shutdown_flag {
            fingerprinter = fingerprinter.with_shutdown_flag(flag.clone());
        }
        Self {
            config,
            fingerprinter,
        }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Scan `roots` and build a staging index.
    ///
    /// Roots are walked in order. Skipped files and per-file fingerprint
    /// failures are reported through `recorder` and do not fail the scan.
    ///
    /// # Errors
    ///
    /// - [`FinderError::Scan`] if any root cannot be fully traversed
    /// - [`FinderError::Interrupted`] if shutdown was requested; any partial
    ///   results are discarded
    /// - [`FinderError::ThreadPool`] if a dedicated pool was requested and
    ///   could not be built
    pub fn find_duplicates_in_paths(
        &self,
        roots: &[PathBuf],
        classifier: &Classifier,
        recorder: &dyn ActivityRecorder,
    ) -> Result<ScanOutcome, FinderError> {
        let start_time = Instant::now();
        let mut summary = ScanSummary {
            roots: roots.len(),
            ..ScanSummary::default()
        };

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let files = self.walk_roots(roots, recorder, &mut summary)?;
        summary.total_files = files.len();
        summary.total_size = files.iter().map(|f| f.size).sum();

        log::info!(
            "Found {} candidate files ({} total)",
            summary.total_files,
            summary.total_size_display()
        );

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let index = DuplicateIndex::new();
        let (processed, failed) = self.fingerprint_all(&files, classifier, recorder, &index)?;

        if self.config.is_shutdown_requested() {
            log::info!("Fingerprinting interrupted by shutdown signal");
            return Err(FinderError::Interrupted);
        }

        summary.processed_files = processed;
        summary.failed_files = failed;
        summary.duplicate_groups = index.duplicate_bucket_count();
        summary.duplicate_files = index.materialize().iter().map(|g| g.len()).sum();
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Scan complete: {} duplicate groups, {} files in groups, {} failed",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.failed_files
        );

        Ok(ScanOutcome { index, summary })
    }

    fn walk_roots(
        &self,
        roots: &[PathBuf],
        recorder: &dyn ActivityRecorder,
        summary: &mut ScanSummary,
    ) -> Result<Vec<FileEntry>, FinderError> {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(PHASE_WALKING, 0);
        }

        let mut files = Vec::new();
        let mut seen: HashSet<PathBuf> = HashSet::new();
        for root in roots {
            log::info!("Walking {}", root.display());
            if let Some(ref callback) = self.config.progress_callback {
                callback.on_message(&format!("Walking {}", root.display()));
            }

            let mut walker = Walker::new(root, self.config.walker_config.clone());
            if let Some(ref flag) = self.config.shutdown_flag {
                walker = walker.with_shutdown_flag(flag.clone());
            }

            let output = match walker.walk() {
                Ok(output) => output,
                Err(e) => {
                    recorder.record(&format!("Error scanning directory {}: {}", root.display(), e));
                    return Err(FinderError::Scan(e));
                }
            };

            for skipped in &output.skipped {
                let message = match &skipped.reason {
                    SkipReason::TooLarge(size) => {
                        format!("Skipping large file: {} ({} bytes)", skipped.path.display(), size)
                    }
                    SkipReason::Unreadable(reason) => format!(
                        "Error reading attributes of file: {} - {}",
                        skipped.path.display(),
                        reason
                    ),
                };
                recorder.record(&message);
            }
            summary.skipped_files += output.skipped.len();

            if output.interrupted {
                return Err(FinderError::Interrupted);
            }
            let before = files.len();
            files.extend(
                output
                    .files
                    .into_iter()
                    .filter(|file| seen.insert(file.path.clone())),
            );
            log::debug!(
                "{}: {} new candidate files",
                root.display(),
                files.len() - before
            );
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(PHASE_WALKING);
        }
        Ok(files)
    }

    /// Fingerprint and classify `files` into `index`. Returns
    /// `(processed, failed)` counts.
    fn fingerprint_all(
        &self,
        files: &[FileEntry],
        classifier: &Classifier,
        recorder: &dyn ActivityRecorder,
        index: &DuplicateIndex,
    ) -> Result<(usize, usize), FinderError> {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(PHASE_FINGERPRINTING, files.len());
        }

        let processed = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);
        let done = AtomicUsize::new(0);

        let work = || {
            files.par_iter().for_each(|file| {
                if self.config.is_shutdown_requested() {
                    return;
                }

                match self.fingerprinter.fingerprint(&file.path) {
                    Ok(fingerprint) => {
                        let category = classifier.classify(&file.path);
                        log::trace!(
                            "Processed {} ({}, {})",
                            file.path.display(),
                            fingerprint,
                            category
                        );
                        index.insert(FileRecord {
                            path: file.path.clone(),
                            fingerprint,
                            category,
                        });
                        processed.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        if !self.config.is_shutdown_requested() {
                            log::warn!("Failed to fingerprint {}: {}", file.path.display(), e);
                            recorder.record(&format!(
                                "Error processing file: {} - {}",
                                file.path.display(),
                                e
                            ));
                            failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }

                let current = done.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(ref callback) = self.config.progress_callback {
                    callback.on_progress(current, &file.path.to_string_lossy());
                    callback.on_item_completed(file.size);
                }
            });
        };

        if self.config.threads == 0 {
            work();
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.threads)
                .build()
                .map_err(|e| FinderError::ThreadPool(e.to_string()))?;
            pool.install(work);
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(PHASE_FINGERPRINTING);
        }

        Ok((processed.into_inner(), failed.into_inner()))
    }
}
