//! File actions module.
//!
//! Deletion of duplicate copies, either permanently or to the system trash.
//!
//! ```no_run
//! use dupesift::actions::{delete_batch, DeleteMode};
//! use std::path::PathBuf;
//!
//! let outcome = delete_batch(&[PathBuf::from("/dup1.txt")], DeleteMode::Trash, None);
//! println!("{}", outcome.summary());
//! ```

pub mod delete;

pub use delete::{
    delete_batch, delete_file, DeleteError, DeleteFailure, DeleteMode, DeleteOutcome,
    DeleteProgressCallback,
};
