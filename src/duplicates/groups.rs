//! Duplicate groups as reported to callers.
//!
//! # Overview
//!
//! A [`DuplicateGroup`] is a fingerprint together with two or more files
//! whose content produced it. Each member carries the category it was
//! classified under at scan time, so one group can span several categories.
//!
//! Groups are a snapshot: they are built from the live index on demand and
//! do not change when the index does.
//!
//! # Example
//!
//! ```
//! use dupesift::duplicates::{DuplicateGroup, GroupMember, GroupingStats};
//! use std::path::PathBuf;
//!
//! let group = DuplicateGroup::new(
//!     "5d41402abc4b2a76b9719d911017c592".to_string(),
//!     vec![
//!         GroupMember::new(PathBuf::from("/d/b.txt"), "Documents"),
//!         GroupMember::new(PathBuf::from("/d/a.txt"), "Documents"),
//!     ],
//! );
//!
//! // Members are kept in path order
//! assert_eq!(group.paths()[0], PathBuf::from("/d/a.txt"));
//! assert_eq!(group.duplicate_count(), 1);
//!
//! let stats = GroupingStats::from_groups(&[group]);
//! assert_eq!(stats.groups, 1);
//! assert_eq!(stats.files, 2);
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One file within a duplicate group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    /// Path of the file
    pub path: PathBuf,
    /// Category the file was classified under
    pub category: String,
}

impl GroupMember {
    /// Create a new member.
    #[must_use]
    pub fn new(path: PathBuf, category: impl Into<String>) -> Self {
        Self {
            path,
            category: category.into(),
        }
    }
}

/// Files sharing one content fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Hex fingerprint shared by all members
    pub fingerprint: String,
    /// Members, sorted by path
    pub members: Vec<GroupMember>,
}

impl DuplicateGroup {
    /// Create a group. Members are sorted by path.
    #[must_use]
    pub fn new(fingerprint: String, mut members: Vec<GroupMember>) -> Self {
        members.sort_by(|a, b| a.path.cmp(&b.path));
        Self {
            fingerprint,
            members,
        }
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the group has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Copies beyond the first.
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.members.len().saturating_sub(1)
    }

    /// Member paths in order.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.members.iter().map(|m| m.path.clone()).collect()
    }

    /// Whether `path` is a member.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.members.iter().any(|m| m.path == path)
    }

    /// Category of a member.
    #[must_use]
    pub fn category_of(&self, path: &Path) -> Option<&str> {
        self.members
            .iter()
            .find(|m| m.path == path)
            .map(|m| m.category.as_str())
    }

    /// Distinct categories among the members, sorted.
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = self.members.iter().map(|m| m.category.as_str()).collect();
        categories.sort_unstable();
        categories.dedup();
        categories
    }
}

/// Totals over a set of groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GroupingStats {
    /// Number of groups
    pub groups: usize,
    /// Files across all groups
    pub files: usize,
    /// Files beyond one per group
    pub duplicates: usize,
}

impl GroupingStats {
    /// Tally `groups`.
    #[must_use]
    pub fn from_groups(groups: &[DuplicateGroup]) -> Self {
        groups.iter().fold(Self::default(), |mut acc, g| {
            acc.groups += 1;
            acc.files += g.len();
            acc.duplicates += g.duplicate_count();
            acc
        })
    }
}
