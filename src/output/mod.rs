//! Output formatters for scan, delete, and rule results.
//!
//! - [`text`]: colored terminal output
//! - [`json`]: machine-readable output for scripting

pub mod json;
pub mod text;

pub use json::{write_json, JsonDeleteOutput, JsonOutput, JsonOutputError, JsonRulesOutput};
pub use text::TextOutput;
