//! File classification.
//!
//! A [`Classifier`] evaluates user rules in insertion order and falls back to
//! the built-in [`taxonomy`] when none match. Classification never fails:
//! a rule that cannot be evaluated (an invalid regex) is treated as not
//! matching and the problem is recorded through the [`ActivityRecorder`].
//!
//! # Example
//!
//! ```
//! use dupesift::activity::LogRecorder;
//! use dupesift::classify::Classifier;
//! use dupesift::rules::{RuleDefinition, RuleKind};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let rules = vec![RuleDefinition::new(RuleKind::FileExtension, ".log", "Logs")
//!     .validate()
//!     .unwrap()];
//! let classifier = Classifier::new(Arc::new(rules), Arc::new(LogRecorder));
//!
//! assert_eq!(classifier.classify(Path::new("/var/app.log")), "Logs");
//! assert_eq!(classifier.classify(Path::new("/var/app.txt")), "Documents");
//! ```

pub mod taxonomy;

use std::path::Path;
use std::sync::Arc;

use crate::activity::ActivityRecorder;
use crate::rules::Rule;

pub use taxonomy::{categorize, FallbackCategory};

/// Rule-then-taxonomy classifier over a fixed rule snapshot.
#[derive(Clone)]
pub struct Classifier {
    rules: Arc<Vec<Rule>>,
    recorder: Arc<dyn ActivityRecorder>,
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl Classifier {
    /// Create a classifier over a rule snapshot.
    #[must_use]
    pub fn new(rules: Arc<Vec<Rule>>, recorder: Arc<dyn ActivityRecorder>) -> Self {
        Self { rules, recorder }
    }

    /// Category for the file at `path`.
    #[must_use]
    pub fn classify(&self, path: &Path) -> String {
        let full_path = path.to_string_lossy();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        self.classify_parts(&full_path, &file_name)
    }

    /// Category for an already-split path and file name.
    #[must_use]
    pub fn classify_parts(&self, full_path: &str, file_name: &str) -> String {
        for rule in self.rules.iter() {
            match rule.matches(full_path, file_name) {
                Ok(true) => return rule.category().to_string(),
                Ok(false) => {}
                Err(e) => {
                    log::debug!("Rule '{}' failed on {}: {}", rule.pattern(), full_path, e);
                    self.recorder.record(&format!(
                        "Error applying rule {} to file {}: {}",
                        rule, file_name, e
                    ));
                }
            }
        }

        categorize(file_name).label().to_string()
    }

    /// Number of user rules consulted before the fallback.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}
