//! The deduplication engine.
//!
//! # Overview
//!
//! [`Deduplicator`] owns the rule store and the live duplicate cache and
//! keeps them coherent:
//! - A scan clears the cache, builds a staging index, and publishes it in
//!   one step once the scan succeeds. Readers never see a half-built index.
//! - Adding a rule invalidates the cache, because every cached category may
//!   now be wrong. A scan that was running when the rule arrived still
//!   returns its groups but does not publish them.
//! - Deleting a file removes it from the cache; a group left with a single
//!   member disappears.
//!
//! All operations take `&self`; the engine is meant to be shared behind an
//! `Arc` between a scanning thread and readers.
//!
//! # Example
//!
//! ```no_run
//! use dupesift::activity::LogRecorder;
//! use dupesift::duplicates::FinderConfig;
//! use dupesift::engine::Deduplicator;
//! use dupesift::rules::{RuleDefinition, RuleKind};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! let engine = Deduplicator::new(FinderConfig::default(), Arc::new(LogRecorder));
//! engine
//!     .add_rule(RuleDefinition::new(RuleKind::FileExtension, ".log", "Logs"))
//!     .unwrap();
//!
//! let groups = engine.scan(&[PathBuf::from("/data")]).unwrap();
//! for group in &groups {
//!     println!("{}: {} copies", group.fingerprint, group.len());
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::actions::{delete_batch, DeleteError, DeleteMode, DeleteOutcome, DeleteProgressCallback};
use crate::activity::ActivityRecorder;
use crate::classify::Classifier;
use crate::duplicates::{
    DuplicateFinder, DuplicateGroup, DuplicateIndex, FinderConfig, FinderError, Removal,
    ScanSummary,
};
use crate::rules::{Rule, RuleDefinition, RuleError, RuleStore};

/// Groups and statistics from one scan.
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Duplicate groups, sorted by fingerprint
    pub groups: Vec<DuplicateGroup>,
    /// Scan statistics
    pub summary: ScanSummary,
    /// Whether the groups were published to the cache. False when the rules
    /// or cache were changed while the scan was running.
    pub cached: bool,
}

/// Duplicate detection and classification engine.
pub struct Deduplicator {
    rules: RuleStore,
    cache: RwLock<DuplicateIndex>,
    /// Bumped whenever the cache is invalidated; a scan only publishes if
    /// this is unchanged since it started.
    epoch: AtomicU64,
    /// Serializes scans and deletions with each other.
    mutation: Mutex<()>,
    finder: DuplicateFinder,
    delete_mode: DeleteMode,
    recorder: Arc<dyn ActivityRecorder>,
}

impl std::fmt::Debug for Deduplicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deduplicator")
            .field("rules", &self.rules.len())
            .field("epoch", &self.epoch.load(Ordering::SeqCst))
            .field("finder", &self.finder)
            .field("delete_mode", &self.delete_mode)
            .finish()
    }
}

impl Deduplicator {
    /// Create an engine with no rules and an empty cache.
    #[must_use]
    pub fn new(config: FinderConfig, recorder: Arc<dyn ActivityRecorder>) -> Self {
        Self {
            rules: RuleStore::new(),
            cache: RwLock::new(DuplicateIndex::new()),
            epoch: AtomicU64::new(0),
            mutation: Mutex::new(()),
            finder: DuplicateFinder::new(config),
            delete_mode: DeleteMode::default(),
            recorder,
        }
    }

    /// Set how [`delete_paths`](Self::delete_paths) removes files.
    #[must_use]
    pub fn with_delete_mode(mut self, mode: DeleteMode) -> Self {
        self.delete_mode = mode;
        self
    }

    fn read_cache(&self) -> RwLockReadGuard<'_, DuplicateIndex> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, DuplicateIndex> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Scan `roots` and return the duplicate groups found.
    ///
    /// # Errors
    ///
    /// Fails if any root cannot be traversed, or if the scan is interrupted.
    /// Either way the cache is left empty.
    pub fn scan(&self, roots: &[PathBuf]) -> Result<Vec<DuplicateGroup>, FinderError> {
        self.scan_with_summary(roots).map(|report| report.groups)
    }

    /// Scan `roots`, returning groups together with scan statistics.
    ///
    /// # Errors
    ///
    /// See [`scan`](Self::scan).
    pub fn scan_with_summary(&self, roots: &[PathBuf]) -> Result<ScanReport, FinderError> {
        let _guard = self.mutation.lock().unwrap_or_else(PoisonError::into_inner);

        let started_epoch = {
            let cache = self.write_cache();
            cache.clear();
            self.epoch.load(Ordering::SeqCst)
        };
        let classifier = Classifier::new(self.rules.snapshot(), self.recorder.clone());

        let listing: Vec<String> = roots.iter().map(|r| r.display().to_string()).collect();
        self.recorder.record(&format!(
            "Starting duplicate scan of {} directories: [{}]",
            roots.len(),
            listing.join(", ")
        ));
        log::info!(
            "Scanning {} roots with {} rules",
            roots.len(),
            classifier.rule_count()
        );

        let outcome = match self
            .finder
            .find_duplicates_in_paths(roots, &classifier, self.recorder.as_ref())
        {
            Ok(outcome) => outcome,
            Err(FinderError::Interrupted) => {
                self.recorder
                    .record("Scan interrupted; partial results discarded");
                return Err(FinderError::Interrupted);
            }
            Err(e) => {
                log::error!("Scan failed: {}", e);
                return Err(e);
            }
        };

        let groups = outcome.index.materialize();
        let cached = {
            let mut cache = self.write_cache();
            if self.epoch.load(Ordering::SeqCst) == started_epoch {
                *cache = outcome.index;
                true
            } else {
                false
            }
        };
        if !cached {
            self.recorder
                .record("Rules or cache changed during scan; results were not cached");
        }

        let file_total: usize = groups.iter().map(DuplicateGroup::len).sum();
        self.recorder.record(&format!(
            "Scan completed in {} ms. Found {} duplicate groups containing {} files total",
            outcome.summary.scan_duration.as_millis(),
            groups.len(),
            file_total
        ));

        Ok(ScanReport {
            groups,
            summary: outcome.summary,
            cached,
        })
    }

    /// Validate and append a classification rule, then invalidate the cache.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::InvalidRule`] if the kind is missing, the pattern
    /// is empty, or the category is blank. The store and cache are unchanged.
    pub fn add_rule(&self, definition: RuleDefinition) -> Result<(), RuleError> {
        let rule = match definition.clone().validate() {
            Ok(rule) => rule,
            Err(e) => {
                self.recorder
                    .record(&format!("Attempted to add invalid rule: {} ({})", definition, e));
                return Err(e);
            }
        };
        let message = format!(
            "Added new rule - Type: {}, Pattern: {}, Category: {}",
            rule.kind(),
            rule.pattern(),
            rule.category()
        );

        {
            let cache = self.write_cache();
            self.rules.push(rule);
            self.epoch.fetch_add(1, Ordering::SeqCst);
            cache.clear();
        }

        self.recorder.record(&message);
        Ok(())
    }

    /// All rules in evaluation order.
    #[must_use]
    pub fn list_rules(&self) -> Vec<Rule> {
        self.rules.list()
    }

    /// Delete files from disk and drop them from the cache.
    ///
    /// Every path is attempted; missing files are reported under `failed`
    /// and leave the cache untouched.
    pub fn delete_paths(&self, paths: &[PathBuf]) -> DeleteOutcome {
        if paths.is_empty() {
            self.recorder
                .record("Delete operation called with empty file list");
            return DeleteOutcome::default();
        }

        let _guard = self.mutation.lock().unwrap_or_else(PoisonError::into_inner);
        let tracker = CacheEviction { engine: self };
        let outcome = delete_batch(paths, self.delete_mode, Some(&tracker));

        if !outcome.failed.is_empty() {
            let failed: Vec<String> = outcome
                .failed
                .iter()
                .map(|f| f.path.display().to_string())
                .collect();
            self.recorder.record(&format!(
                "Failed to delete {} files: [{}]",
                outcome.failed.len(),
                failed.join(", ")
            ));
        }
        self.recorder.record(&format!(
            "Delete operation completed. Successfully deleted {} of {} files",
            outcome.deleted.len(),
            outcome.total_count()
        ));

        outcome
    }

    /// Drop `path` from the cache without touching the filesystem.
    pub fn remove_path(&self, path: &Path) -> Removal {
        self.read_cache().remove_path(path)
    }

    /// Number of cached duplicate groups.
    #[must_use]
    pub fn cache_size(&self) -> usize {
        self.read_cache().duplicate_bucket_count()
    }

    /// Empty the cache. Rules are kept.
    pub fn clear_cache(&self) {
        {
            let cache = self.write_cache();
            self.epoch.fetch_add(1, Ordering::SeqCst);
            cache.clear();
        }
        self.recorder.record("Cleared duplicate caches");
    }

    /// Current duplicate groups from the cache.
    #[must_use]
    pub fn groups(&self) -> Vec<DuplicateGroup> {
        self.read_cache().materialize()
    }

    /// Cached category of a file.
    #[must_use]
    pub fn category_of(&self, path: &Path) -> Option<String> {
        self.read_cache().category_of(path)
    }
}

/// Keeps the cache in step with a delete batch.
struct CacheEviction<'a> {
    engine: &'a Deduplicator,
}

impl DeleteProgressCallback for CacheEviction<'_> {
    fn on_delete_success(&self, path: &Path, _size: u64) {
        self.engine.remove_path(path);
        self.engine
            .recorder
            .record(&format!("Deleted file: {}", path.display()));
    }

    fn on_delete_failure(&self, path: &Path, error: &DeleteError) {
        let message = if error.is_not_found() {
            format!("File not found for deletion: {}", path.display())
        } else {
            format!("Failed to delete file: {} - {}", path.display(), error)
        };
        self.engine.recorder.record(&message);
    }
}
