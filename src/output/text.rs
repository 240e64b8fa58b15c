//! Human-readable terminal output.

use std::io::{self, Write};

use yansi::{Condition, Paint};

use crate::actions::DeleteOutcome;
use crate::duplicates::{DuplicateGroup, GroupingStats, ScanSummary};
use crate::rules::Rule;

/// Plain-text renderer, optionally colored.
#[derive(Debug, Clone, Copy)]
pub struct TextOutput {
    color: bool,
}

impl TextOutput {
    /// Create a renderer.
    #[must_use]
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn when(&self) -> Condition {
        if self.color {
            Condition::ALWAYS
        } else {
            Condition::NEVER
        }
    }

    /// Write duplicate groups followed by a summary line.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn write_groups<W: Write>(
        &self,
        groups: &[DuplicateGroup],
        summary: &ScanSummary,
        writer: &mut W,
    ) -> io::Result<()> {
        for (i, group) in groups.iter().enumerate() {
            writeln!(
                writer,
                "{} {} ({} files)",
                format!("Group {}", i + 1).bold().whenever(self.when()),
                group.fingerprint.as_str().dim().whenever(self.when()),
                group.len()
            )?;
            for member in &group.members {
                writeln!(
                    writer,
                    "  {}  {}",
                    format!("[{}]", member.category).cyan().whenever(self.when()),
                    member.path.display()
                )?;
            }
            writeln!(writer)?;
        }

        let stats = GroupingStats::from_groups(groups);
        let headline = if stats.groups == 0 {
            "No duplicates found".to_string()
        } else {
            format!(
                "{} duplicate groups, {} files, {} redundant copies",
                stats.groups, stats.files, stats.duplicates
            )
        };
        writeln!(
            writer,
            "{} (scanned {} files, {}, in {} ms)",
            headline.green().bold().whenever(self.when()),
            summary.total_files,
            summary.total_size_display(),
            summary.scan_duration.as_millis()
        )?;
        if summary.failed_files > 0 || summary.skipped_files > 0 {
            writeln!(
                writer,
                "{}",
                format!(
                    "{} files could not be read, {} skipped",
                    summary.failed_files, summary.skipped_files
                )
                .yellow()
                .whenever(self.when())
            )?;
        }
        Ok(())
    }

    /// Write the result of a delete batch.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn write_delete<W: Write>(&self, outcome: &DeleteOutcome, writer: &mut W) -> io::Result<()> {
        for path in &outcome.deleted {
            writeln!(
                writer,
                "{} {}",
                "deleted".green().whenever(self.when()),
                path.display()
            )?;
        }
        for failure in &outcome.failed {
            writeln!(
                writer,
                "{} {}: {}",
                "failed ".red().whenever(self.when()),
                failure.path.display(),
                failure.reason
            )?;
        }
        writeln!(writer, "{}", outcome.summary().bold().whenever(self.when()))
    }

    /// Write rules in evaluation order.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn write_rules<W: Write>(&self, rules: &[Rule], writer: &mut W) -> io::Result<()> {
        if rules.is_empty() {
            return writeln!(writer, "No rules configured; built-in categories apply");
        }
        for (i, rule) in rules.iter().enumerate() {
            writeln!(
                writer,
                "{:>3}. {:<16} {:<24} -> {}",
                i + 1,
                rule.kind().as_str(),
                rule.pattern(),
                rule.category().bold().whenever(self.when())
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::DeleteFailure;
    use crate::duplicates::GroupMember;
    use crate::rules::{RuleDefinition, RuleKind};
    use std::path::PathBuf;

    fn render<F: FnOnce(&mut Vec<u8>) -> io::Result<()>>(f: F) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_groups_plain() {
        let groups = vec![DuplicateGroup::new(
            "abc".to_string(),
            vec![
                GroupMember::new(PathBuf::from("/d/a.txt"), "Documents"),
                GroupMember::new(PathBuf::from("/d/b.txt"), "Documents"),
            ],
        )];
        let out = render(|w| TextOutput::new(false).write_groups(&groups, &ScanSummary::default(), w));

        assert!(out.contains("Group 1 abc (2 files)"));
        assert!(out.contains("  [Documents]  /d/a.txt"));
        assert!(out.contains("1 duplicate groups, 2 files, 1 redundant copies"));
        assert!(!out.contains('\u{1b}'));
    }

    #[test]
    fn test_no_duplicates_message() {
        let out = render(|w| TextOutput::new(false).write_groups(&[], &ScanSummary::default(), w));
        assert!(out.starts_with("No duplicates found"));
    }

    #[test]
    fn test_color_emits_escapes() {
        let out = render(|w| TextOutput::new(true).write_groups(&[], &ScanSummary::default(), w));
        assert!(out.contains('\u{1b}'));
    }

    #[test]
    fn test_delete_plain() {
        let outcome = DeleteOutcome {
            deleted: vec![PathBuf::from("/a")],
            failed: vec![DeleteFailure {
                path: PathBuf::from("/b"),
                reason: "file not found: /b".to_string(),
                not_found: true,
            }],
            bytes_freed: 0,
        };
        let out = render(|w| TextOutput::new(false).write_delete(&outcome, w));
        assert!(out.contains("deleted /a"));
        assert!(out.contains("failed  /b: file not found: /b"));
        assert!(out.contains("1 failed"));
    }

    #[test]
    fn test_rules_listing() {
        let rules = vec![RuleDefinition::new(RuleKind::FileExtension, ".log", "Logs")
            .validate()
            .unwrap()];
        let out = render(|w| TextOutput::new(false).write_rules(&rules, w));
        assert!(out.contains("FILE_EXTENSION"));
        assert!(out.contains("-> Logs"));

        let out = render(|w| TextOutput::new(false).write_rules(&[], w));
        assert!(out.contains("No rules configured"));
    }
}
