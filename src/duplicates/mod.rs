//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - The concurrent fingerprint and category indexes ([`index`])
//! - Duplicate groups as handed to callers ([`groups`])
//! - The walk-then-fingerprint scan pipeline ([`finder`])

pub mod finder;
pub mod groups;
pub mod index;

pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanOutcome, ScanSummary};
pub use groups::{DuplicateGroup, GroupMember, GroupingStats};
pub use index::{DuplicateIndex, FileRecord, Removal};
