//! User-defined classification rules.
//!
//! # Overview
//!
//! A [`Rule`] maps files to a category by one of three tests:
//! - [`RuleKind::PathContains`]: substring of the full path
//! - [`RuleKind::FileExtension`]: case-insensitive suffix of the file name
//! - [`RuleKind::NameRegex`]: regular expression found anywhere in the file name
//!
//! Rules live in a [`RuleStore`], an append-only ordered list. Evaluation
//! order is insertion order and the first matching rule wins.
//!
//! # Example
//!
//! ```
//! use dupesift::rules::{RuleDefinition, RuleKind, RuleStore};
//!
//! let store = RuleStore::new();
//! let rule = RuleDefinition::new(RuleKind::FileExtension, ".log", "Logs")
//!     .validate()
//!     .unwrap();
//! store.push(rule);
//!
//! assert_eq!(store.len(), 1);
//! assert_eq!(store.list()[0].category(), "Logs");
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Errors raised while building or storing a rule.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// The rule definition is missing a field or has an empty one.
    #[error("Invalid rule: {0}")]
    InvalidRule(String),
}

/// The closed set of rule tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleKind {
    /// Substring match on the full path.
    #[serde(alias = "path")]
    PathContains,
    /// Case-insensitive suffix match on the file name.
    #[serde(alias = "ext")]
    FileExtension,
    /// Regex search on the file name.
    #[serde(rename = "FILE_NAME_REGEX", alias = "NAME_REGEX", alias = "regex")]
    NameRegex,
}

impl RuleKind {
    /// Wire name used in config files and activity messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PathContains => "PATH_CONTAINS",
            Self::FileExtension => "FILE_EXTENSION",
            Self::NameRegex => "FILE_NAME_REGEX",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleKind {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "path" | "path_contains" | "path-contains" => Ok(Self::PathContains),
            "ext" | "extension" | "file_extension" | "file-extension" => Ok(Self::FileExtension),
            "regex" | "name_regex" | "name-regex" | "file_name_regex" => Ok(Self::NameRegex),
            other => Err(RuleError::InvalidRule(format!(
                "unknown rule kind '{}' (expected path, ext or regex)",
                other
            ))),
        }
    }
}

/// A rule as received from a caller, before validation.
///
/// Every field is optional so that incomplete definitions coming from
/// config files or other front-ends can be reported as
/// [`RuleError::InvalidRule`] instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    /// Which test to apply.
    #[serde(default, alias = "type")]
    pub kind: Option<RuleKind>,
    /// Pattern interpreted according to `kind`.
    #[serde(default)]
    pub pattern: Option<String>,
    /// Category assigned on match.
    #[serde(default)]
    pub category: Option<String>,
}

impl RuleDefinition {
    /// Create a fully populated definition.
    #[must_use]
    pub fn new(kind: RuleKind, pattern: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            kind: Some(kind),
            pattern: Some(pattern.into()),
            category: Some(category.into()),
        }
    }

    /// Check every field and produce an immutable [`Rule`].
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::InvalidRule`] if any field is missing or empty.
    pub fn validate(self) -> Result<Rule, RuleError> {
        let kind = self
            .kind
            .ok_or_else(|| RuleError::InvalidRule("rule must have a kind".to_string()))?;
        let pattern = self
            .pattern
            .filter(|p| !p.is_empty())
            .ok_or_else(|| RuleError::InvalidRule("rule must have a pattern".to_string()))?;
        let category = self
            .category
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| RuleError::InvalidRule("rule must have a category".to_string()))?;

        Ok(Rule::compile(kind, pattern, category))
    }
}

impl fmt::Display for RuleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rule {{ kind: {}, pattern: {}, category: {} }}",
            self.kind.map_or("<missing>", RuleKind::as_str),
            self.pattern.as_deref().unwrap_or("<missing>"),
            self.category.as_deref().unwrap_or("<missing>"),
        )
    }
}

/// Parse the CLI form `kind:pattern:category`.
///
/// The category is everything after the second colon, so it may itself
/// contain colons. Regex patterns containing `:` are not expressible here;
/// use the config file for those.
impl FromStr for RuleDefinition {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let (Some(kind), Some(pattern), Some(category)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(RuleError::InvalidRule(format!(
                "'{}' is not of the form kind:pattern:category",
                s
            )));
        };

        Ok(Self::new(kind.parse()?, pattern, category))
    }
}

/// A validated, immutable classification rule.
#[derive(Debug, Clone)]
pub struct Rule {
    kind: RuleKind,
    pattern: String,
    category: String,
    /// Compiled form of a `NameRegex` pattern, or the compile error text.
    regex: Option<Result<Regex, String>>,
}

impl Rule {
    fn compile(kind: RuleKind, pattern: String, category: String) -> Self {
        let regex = match kind {
            RuleKind::NameRegex => Some(Regex::new(&pattern).map_err(|e| e.to_string())),
            RuleKind::PathContains | RuleKind::FileExtension => None,
        };
        Self {
            kind,
            pattern,
            category,
            regex,
        }
    }

    /// The rule's test.
    #[must_use]
    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    /// The raw pattern as supplied.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Category assigned on match.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Test the rule against a file.
    ///
    /// `path` is the full path string and `file_name` its final component.
    ///
    /// # Errors
    ///
    /// Returns the compile error text for a `NameRegex` rule whose pattern
    /// is not a valid regular expression.
    pub fn matches(&self, path: &str, file_name: &str) -> Result<bool, String> {
        match self.kind {
            RuleKind::PathContains => Ok(path.contains(self.pattern.as_str())),
            RuleKind::FileExtension => Ok(file_name
                .to_lowercase()
                .ends_with(&self.pattern.to_lowercase())),
            RuleKind::NameRegex => match &self.regex {
                Some(Ok(re)) => Ok(re.is_match(file_name)),
                Some(Err(e)) => Err(e.clone()),
                None => Err("regex was not compiled".to_string()),
            },
        }
    }

    /// Convert back into the caller-facing definition.
    #[must_use]
    pub fn to_definition(&self) -> RuleDefinition {
        RuleDefinition::new(self.kind, self.pattern.clone(), self.category.clone())
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.pattern == other.pattern && self.category == other.category
    }
}

impl Eq for Rule {}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Type: {}, Pattern: {}, Category: {}",
            self.kind, self.pattern, self.category
        )
    }
}

impl Serialize for Rule {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_definition().serialize(serializer)
    }
}

/// Ordered, append-only list of rules.
///
/// Readers take a cheap snapshot ([`RuleStore::snapshot`]) and never observe
/// a partially appended rule. Writers are serialized by the inner lock.
#[derive(Debug, Default)]
pub struct RuleStore {
    rules: RwLock<Arc<Vec<Rule>>>,
}

impl RuleStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a validated rule. Returns the new rule count.
    pub fn push(&self, rule: Rule) -> usize {
        let mut guard = self
            .rules
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut next = Vec::with_capacity(guard.len() + 1);
        next.extend(guard.iter().cloned());
        next.push(rule);
        let len = next.len();
        *guard = Arc::new(next);
        len
    }

    /// Shared view of the rules as they are right now.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<Rule>> {
        Arc::clone(
            &self
                .rules
                .read()
                .unwrap_or_else(std::sync::PoisonError::into_inner),
        )
    }

    /// Owned copy of the rules, in evaluation order.
    #[must_use]
    pub fn list(&self) -> Vec<Rule> {
        self.snapshot().as_ref().clone()
    }

    /// Number of stored rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Whether no rules have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_complete_definition() {
        let rule = RuleDefinition::new(RuleKind::PathContains, "/photos/", "Photos")
            .validate()
            .unwrap();
        assert_eq!(rule.kind(), RuleKind::PathContains);
        assert_eq!(rule.pattern(), "/photos/");
        assert_eq!(rule.category(), "Photos");
    }

    #[test]
    fn test_validate_missing_fields() {
        let missing_kind = RuleDefinition {
            kind: None,
            pattern: Some("x".into()),
            category: Some("X".into()),
        };
        assert!(matches!(
            missing_kind.validate(),
            Err(RuleError::InvalidRule(_))
        ));

        let missing_pattern = RuleDefinition {
            kind: Some(RuleKind::FileExtension),
            pattern: None,
            category: Some("X".into()),
        };
        assert!(missing_pattern.validate().is_err());

        let empty_category = RuleDefinition::new(RuleKind::FileExtension, ".x", "  ");
        assert!(empty_category.validate().is_err());
    }

    #[test]
    fn test_path_contains_is_case_sensitive() {
        let rule = RuleDefinition::new(RuleKind::PathContains, "Work", "Work")
            .validate()
            .unwrap();
        assert_eq!(rule.matches("/home/me/Work/a.txt", "a.txt"), Ok(true));
        assert_eq!(rule.matches("/home/me/work/a.txt", "a.txt"), Ok(false));
    }

    #[test]
    fn test_file_extension_ignores_case() {
        let rule = RuleDefinition::new(RuleKind::FileExtension, ".LOG", "Logs")
            .validate()
            .unwrap();
        assert_eq!(rule.matches("/d/x.log", "x.log"), Ok(true));
        assert_eq!(rule.matches("/d/X.Log", "X.Log"), Ok(true));
        assert_eq!(rule.matches("/d/x.logs", "x.logs"), Ok(false));
    }

    #[test]
    fn test_name_regex_finds_anywhere() {
        let rule = RuleDefinition::new(RuleKind::NameRegex, r"IMG_\d+", "Camera")
            .validate()
            .unwrap();
        assert_eq!(rule.matches("/d/copy of IMG_0042.jpg", "copy of IMG_0042.jpg"), Ok(true));
        assert_eq!(rule.matches("/IMG_1/x.jpg", "x.jpg"), Ok(false));
    }

    #[test]
    fn test_invalid_regex_is_stored_but_errors_on_match() {
        let rule = RuleDefinition::new(RuleKind::NameRegex, "([a-z", "Broken")
            .validate()
            .unwrap();
        assert!(rule.matches("/d/abc", "abc").is_err());
    }

    #[test]
    fn test_parse_cli_form() {
        let def: RuleDefinition = "ext:.log:Logs".parse().unwrap();
        assert_eq!(def, RuleDefinition::new(RuleKind::FileExtension, ".log", "Logs"));

        let def: RuleDefinition = "path:/tmp:Scratch: old".parse().unwrap();
        assert_eq!(def.category.as_deref(), Some("Scratch: old"));

        assert!("ext:.log".parse::<RuleDefinition>().is_err());
        assert!("glob:*.x:X".parse::<RuleDefinition>().is_err());
    }

    #[test]
    fn test_definition_deserializes_wire_names() {
        let def: RuleDefinition = serde_json::from_str(
            r#"{"type":"FILE_NAME_REGEX","pattern":"^a","category":"A"}"#,
        )
        .unwrap();
        assert_eq!(def.kind, Some(RuleKind::NameRegex));

        let def: RuleDefinition =
            serde_json::from_str(r#"{"kind":"PATH_CONTAINS","pattern":"x"}"#).unwrap();
        assert!(def.category.is_none());
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_store_keeps_insertion_order() {
        let store = RuleStore::new();
        assert!(store.is_empty());
        for (i, cat) in ["First", "Second", "Third"].iter().enumerate() {
            let n = store.push(
                RuleDefinition::new(RuleKind::PathContains, "x", *cat)
                    .validate()
                    .unwrap(),
            );
            assert_eq!(n, i + 1);
        }
        let cats: Vec<_> = store.list().iter().map(|r| r.category().to_string()).collect();
        assert_eq!(cats, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_snapshot_is_unaffected_by_later_push() {
        let store = RuleStore::new();
        let before = store.snapshot();
        store.push(
            RuleDefinition::new(RuleKind::FileExtension, ".a", "A")
                .validate()
                .unwrap(),
        );
        assert!(before.is_empty());
        assert_eq!(store.snapshot().len(), 1);
    }
}
