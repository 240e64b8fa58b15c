//! JSON output for scripting.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "groups": [
//!     {
//!       "fingerprint": "5d41402abc4b2a76b9719d911017c592",
//!       "members": [
//!         { "path": "/data/a.txt", "category": "Documents" },
//!         { "path": "/data/b.txt", "category": "Documents" }
//!       ]
//!     }
//!   ],
//!   "summary": {
//!     "roots": 1,
//!     "total_files": 10,
//!     "total_size": 52311,
//!     "processed_files": 10,
//!     "failed_files": 0,
//!     "skipped_files": 0,
//!     "duplicate_groups": 1,
//!     "duplicate_files": 2,
//!     "scan_duration": 12
//!   },
//!   "exit_code": 0,
//!   "exit_code_name": "DS000"
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::actions::DeleteOutcome;
use crate::duplicates::{DuplicateGroup, ScanSummary};
use crate::error::ExitCode;
use crate::rules::Rule;

/// Scan results.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a> {
    /// Duplicate groups
    pub groups: &'a [DuplicateGroup],
    /// Scan statistics
    pub summary: &'a ScanSummary,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name
    pub exit_code_name: &'static str,
}

impl<'a> JsonOutput<'a> {
    /// Wrap scan results.
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup], summary: &'a ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            groups,
            summary,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix(),
        }
    }
}

/// Delete results.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDeleteOutput<'a> {
    /// What was and wasn't deleted
    #[serde(flatten)]
    pub outcome: &'a DeleteOutcome,
    /// The exit code number
    pub exit_code: i32,
}

/// Rule listing.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRulesOutput<'a> {
    /// Rules in evaluation order
    pub rules: &'a [Rule],
}

/// Write `value` as JSON followed by a newline.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<T: Serialize, W: Write>(
    value: &T,
    writer: &mut W,
    pretty: bool,
) -> Result<(), JsonOutputError> {
    if pretty {
        serde_json::to_writer_pretty(&mut *writer, value)?;
    } else {
        serde_json::to_writer(&mut *writer, value)?;
    }
    writer.write_all(b"\n")?;
    Ok(())
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON output: {0}")]
    Io(#[from] std::io::Error),
}
