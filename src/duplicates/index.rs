//! Fingerprint and category indexes.
//!
//! [`DuplicateIndex`] pairs two concurrent maps:
//! - the fingerprint index: fingerprint -> bucket of paths
//! - the category index: path -> category (plus the owning fingerprint)
//!
//! Both are `DashMap`s, so scan workers fold results in parallel with
//! per-shard locking instead of one lock around the whole index. Every
//! operation that touches both maps locks the bucket first and the category
//! entry second; keeping that order everywhere is what makes concurrent
//! inserts and removals deadlock-free.

use std::path::{Path, PathBuf};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::groups::{DuplicateGroup, GroupMember};

/// One scanned file, ready to be folded into the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Path of the file
    pub path: PathBuf,
    /// Hex content fingerprint
    pub fingerprint: String,
    /// Category assigned by the classifier
    pub category: String,
}

#[derive(Debug, Clone)]
struct IndexedFile {
    fingerprint: String,
    category: String,
}

/// What [`DuplicateIndex::remove_path`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The path was not indexed; nothing changed.
    NotIndexed,
    /// The path was removed and its group still has two or more members.
    Removed,
    /// The path was removed and its group fell below two members, so the
    /// bucket (and its lone survivor) were dropped.
    GroupDissolved,
}

/// Concurrent fingerprint and category indexes.
#[derive(Debug, Default)]
pub struct DuplicateIndex {
    buckets: DashMap<String, Vec<PathBuf>>,
    files: DashMap<PathBuf, IndexedFile>,
}

impl DuplicateIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or append a record.
    ///
    /// Returns `false` if the path was already in this bucket. A path seen
    /// earlier under a different fingerprint is moved to the new bucket.
    pub fn insert(&self, record: FileRecord) -> bool {
        let FileRecord {
            path,
            fingerprint,
            category,
        } = record;

        let previous = {
            let mut bucket = self.buckets.entry(fingerprint.clone()).or_default();
            if bucket.contains(&path) {
                return false;
            }
            let previous = self.files.insert(
                path.clone(),
                IndexedFile {
                    fingerprint: fingerprint.clone(),
                    category,
                },
            );
            bucket.push(path.clone());
            previous
        };

        if let Some(prev) = previous {
            if prev.fingerprint != fingerprint {
                self.detach(&prev.fingerprint, &path);
            }
        }
        true
    }

    /// Remove `path` from `fingerprint`'s bucket without touching categories.
    fn detach(&self, fingerprint: &str, path: &Path) {
        if let Entry::Occupied(mut bucket) = self.buckets.entry(fingerprint.to_string()) {
            bucket.get_mut().retain(|p| p != path);
            if bucket.get().is_empty() {
                bucket.remove();
            }
        }
    }

    /// Remove a path from both indexes.
    ///
    /// If its bucket is left with fewer than two members the bucket is
    /// dropped, along with the survivor's category entry, so every indexed
    /// path stays in exactly one bucket. The bucket is held locked for the
    /// whole operation; no reader sees a member without a category.
    pub fn remove_path(&self, path: &Path) -> Removal {
        let Some(fingerprint) = self.files.get(path).map(|f| f.fingerprint.clone()) else {
            return Removal::NotIndexed;
        };

        match self.buckets.entry(fingerprint) {
            Entry::Occupied(mut bucket) => {
                bucket.get_mut().retain(|p| p != path);
                self.files.remove(path);

                if bucket.get().len() < 2 {
                    let (_, survivors) = bucket.remove_entry();
                    for survivor in &survivors {
                        self.files.remove(survivor);
                    }
                    Removal::GroupDissolved
                } else {
                    Removal::Removed
                }
            }
            Entry::Vacant(_) => {
                self.files.remove(path);
                Removal::Removed
            }
        }
    }

    /// Empty both indexes.
    pub fn clear(&self) {
        self.buckets.clear();
        self.files.clear();
    }

    /// Category of an indexed path.
    #[must_use]
    pub fn category_of(&self, path: &Path) -> Option<String> {
        self.files.get(path).map(|f| f.category.clone())
    }

    /// Fingerprint of an indexed path.
    #[must_use]
    pub fn fingerprint_of(&self, path: &Path) -> Option<String> {
        self.files.get(path).map(|f| f.fingerprint.clone())
    }

    /// Whether `path` is indexed.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    /// Paths in a bucket, sorted.
    #[must_use]
    pub fn bucket(&self, fingerprint: &str) -> Option<Vec<PathBuf>> {
        self.buckets.get(fingerprint).map(|b| {
            let mut paths = b.clone();
            paths.sort();
            paths
        })
    }

    /// Number of buckets, including single-member ones.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of buckets with two or more members.
    #[must_use]
    pub fn duplicate_bucket_count(&self) -> usize {
        self.buckets.iter().filter(|b| b.value().len() >= 2).count()
    }

    /// Number of indexed paths.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty() && self.files.is_empty()
    }

    /// Build the duplicate-group view: buckets with two or more members,
    /// each member paired with its category. Sorted by fingerprint, members
    /// by path.
    #[must_use]
    pub fn materialize(&self) -> Vec<DuplicateGroup> {
        let mut groups: Vec<DuplicateGroup> = self
            .buckets
            .iter()
            .filter(|bucket| bucket.value().len() >= 2)
            .map(|bucket| {
                let members = bucket
                    .value()
                    .iter()
                    .map(|path| GroupMember {
                        path: path.clone(),
                        category: self.category_of(path).unwrap_or_else(|| {
                            log::warn!("No category indexed for {}", path.display());
                            crate::classify::FallbackCategory::Uncategorized
                                .label()
                                .to_string()
                        }),
                    })
                    .collect();
                DuplicateGroup::new(bucket.key().clone(), members)
            })
            .collect();

        groups.sort_by(|a, b| a.fingerprint.cmp(&b.fingerprint));
        groups
    }
}
