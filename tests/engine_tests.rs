use dupesift::activity::ActivityLog;
use dupesift::duplicates::{FinderConfig, FinderError};
use dupesift::engine::Deduplicator;
use dupesift::progress::{ProgressCallback, PHASE_FINGERPRINTING};
use dupesift::rules::{RuleDefinition, RuleError, RuleKind};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, Weak};
use std::thread;
use tempfile::{tempdir, TempDir};

fn engine() -> (Deduplicator, Arc<ActivityLog>) {
    let log = Arc::new(ActivityLog::new());
    let engine = Deduplicator::new(FinderConfig::default(), log.clone());
    (engine, log)
}

fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn docs_fixture() -> TempDir {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"same words");
    write(dir.path(), "b.txt", b"same words");
    write(dir.path(), "c.txt", b"different words");
    dir
}

#[test]
fn test_identical_text_files_form_one_documents_group() {
    let dir = docs_fixture();
    let (engine, _) = engine();

    let groups = engine.scan(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(groups.len(), 1);
    let group = &groups[0];
    assert_eq!(group.len(), 2);
    assert!(group.contains(&dir.path().join("a.txt")));
    assert!(group.contains(&dir.path().join("b.txt")));
    assert!(!group.contains(&dir.path().join("c.txt")));
    assert!(group.members.iter().all(|m| m.category == "Documents"));
    assert_eq!(engine.cache_size(), 1);
}

#[test]
fn test_extension_rule_reclassifies_logs() {
    let dir = tempdir().unwrap();
    write(dir.path(), "x.log", b"2024-01-01 boot");
    write(dir.path(), "copy/x.log", b"2024-01-01 boot");
    let (engine, _) = engine();

    let before = engine.scan(&[dir.path().to_path_buf()]).unwrap();
    assert_eq!(before[0].categories(), vec!["Uncategorized"]);

    engine
        .add_rule(RuleDefinition::new(RuleKind::FileExtension, ".log", "Logs"))
        .unwrap();
    assert_eq!(engine.cache_size(), 0);

    let after = engine.scan(&[dir.path().to_path_buf()]).unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].categories(), vec!["Logs"]);
}

#[test]
fn test_first_rule_wins_over_later_rules_and_taxonomy() {
    let dir = tempdir().unwrap();
    write(dir.path(), "inbox/IMG_0001.jpg", b"pixels");
    write(dir.path(), "backup/IMG_0001.jpg", b"pixels");
    let (engine, _) = engine();

    engine
        .add_rule(RuleDefinition::new(RuleKind::PathContains, "backup", "Backups"))
        .unwrap();
    engine
        .add_rule(RuleDefinition::new(RuleKind::NameRegex, "^IMG_", "Camera"))
        .unwrap();

    engine.scan(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(
        engine.category_of(&dir.path().join("backup/IMG_0001.jpg")),
        Some("Backups".to_string())
    );
    assert_eq!(
        engine.category_of(&dir.path().join("inbox/IMG_0001.jpg")),
        Some("Camera".to_string())
    );
}

#[test]
fn test_incomplete_rule_is_rejected() {
    let (engine, log) = engine();
    let definition = RuleDefinition {
        kind: Some(RuleKind::PathContains),
        pattern: None,
        category: Some("Anything".to_string()),
    };

    let err = engine.add_rule(definition).unwrap_err();

    assert!(matches!(err, RuleError::InvalidRule(_)));
    assert!(engine.list_rules().is_empty());
    assert!(log.contains("Attempted to add invalid rule"));
}

#[test]
fn test_list_rules_in_insertion_order() {
    let (engine, log) = engine();
    engine
        .add_rule(RuleDefinition::new(RuleKind::FileExtension, ".bak", "Backups"))
        .unwrap();
    engine
        .add_rule(RuleDefinition::new(RuleKind::PathContains, "/tmp/", "Scratch"))
        .unwrap();

    let rules = engine.list_rules();
    let categories: Vec<&str> = rules.iter().map(|r| r.category()).collect();
    assert_eq!(categories, vec!["Backups", "Scratch"]);
    assert!(log.contains("Added new rule - Type: FILE_EXTENSION, Pattern: .bak, Category: Backups"));
}

#[test]
fn test_delete_one_of_pair_removes_group() {
    let dir = docs_fixture();
    let (engine, log) = engine();
    engine.scan(&[dir.path().to_path_buf()]).unwrap();

    let target = dir.path().join("a.txt");
    let outcome = engine.delete_paths(&[target.clone()]);

    assert_eq!(outcome.deleted, vec![target.clone()]);
    assert!(outcome.failed.is_empty());
    assert!(!target.exists());
    assert_eq!(engine.cache_size(), 0);
    assert!(engine.category_of(&target).is_none());
    assert!(log.contains("Successfully deleted 1 of 1 files"));
}

#[test]
fn test_delete_one_of_three_keeps_pair() {
    let dir = docs_fixture();
    write(dir.path(), "d.txt", b"same words");
    let (engine, _) = engine();
    engine.scan(&[dir.path().to_path_buf()]).unwrap();

    engine.delete_paths(&[dir.path().join("d.txt")]);

    let groups = engine.groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    assert!(!groups[0].contains(&dir.path().join("d.txt")));
}

#[test]
fn test_delete_batch_continues_past_missing_file() {
    let dir = docs_fixture();
    let (engine, log) = engine();
    engine.scan(&[dir.path().to_path_buf()]).unwrap();

    let missing = dir.path().join("never-existed.txt");
    let present = dir.path().join("b.txt");
    let outcome = engine.delete_paths(&[missing.clone(), present.clone()]);

    assert_eq!(outcome.deleted, vec![present]);
    assert_eq!(outcome.failed_paths(), vec![missing]);
    assert!(outcome.failed[0].not_found);
    assert!(log.contains("File not found for deletion"));
    assert!(log.contains("Failed to delete 1 files"));
}

#[test]
fn test_missing_root_fails_and_leaves_cache_empty() {
    let dir = docs_fixture();
    let (engine, _) = engine();
    engine.scan(&[dir.path().to_path_buf()]).unwrap();
    assert_eq!(engine.cache_size(), 1);

    let result = engine.scan(&[
        dir.path().to_path_buf(),
        dir.path().join("no-such-directory"),
    ]);

    assert!(matches!(result, Err(FinderError::Scan(_))));
    assert_eq!(engine.cache_size(), 0);
}

#[test]
fn test_rescan_gives_same_groups() {
    let dir = docs_fixture();
    let (engine, _) = engine();
    let roots = vec![dir.path().to_path_buf()];

    let first = engine.scan(&roots).unwrap();
    let second = engine.scan(&roots).unwrap();

    assert_eq!(first, second);
    assert_eq!(engine.groups(), second);
}

#[test]
fn test_overlapping_roots_do_not_double_count() {
    let dir = docs_fixture();
    let (engine, _) = engine();

    let groups = engine
        .scan(&[dir.path().to_path_buf(), dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
}

#[test]
fn test_clear_cache_then_groups_empty() {
    let dir = docs_fixture();
    let (engine, log) = engine();
    engine.scan(&[dir.path().to_path_buf()]).unwrap();

    engine.clear_cache();

    assert!(engine.groups().is_empty());
    assert!(log.contains("Cleared duplicate caches"));
}

#[test]
fn test_readers_during_deletes_never_see_singletons() {
    let dir = tempdir().unwrap();
    let mut victims = Vec::new();
    for i in 0..20 {
        write(dir.path(), &format!("keep_{}.txt", i), format!("body {}", i).as_bytes());
        victims.push(write(
            dir.path(),
            &format!("copy_{}.txt", i),
            format!("body {}", i).as_bytes(),
        ));
    }
    let (engine, _) = engine();
    let engine = Arc::new(engine);
    engine.scan(&[dir.path().to_path_buf()]).unwrap();
    assert_eq!(engine.cache_size(), 20);

    let reader = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for _ in 0..200 {
                for group in engine.groups() {
                    assert!(group.len() >= 2);
                    assert!(group.members.iter().all(|m| !m.category.is_empty()));
                }
            }
        })
    };

    for victim in &victims {
        engine.delete_paths(std::slice::from_ref(victim));
    }
    reader.join().unwrap();

    assert_eq!(engine.cache_size(), 0);
}

/// Adds a rule to the engine as soon as fingerprinting starts.
#[derive(Default)]
struct AddRuleOnFingerprint {
    engine: OnceLock<Weak<Deduplicator>>,
}

impl ProgressCallback for AddRuleOnFingerprint {
    fn on_phase_start(&self, phase: &str, _total: usize) {
        if phase != PHASE_FINGERPRINTING {
            return;
        }
        if let Some(engine) = self.engine.get().and_then(Weak::upgrade) {
            engine
                .add_rule(RuleDefinition::new(RuleKind::FileExtension, ".txt", "Text"))
                .unwrap();
        }
    }

    fn on_progress(&self, _current: usize, _path: &str) {}

    fn on_phase_end(&self, _phase: &str) {}
}

#[test]
fn test_rule_added_during_scan_keeps_results_out_of_cache() {
    let dir = docs_fixture();
    let log = Arc::new(ActivityLog::new());
    let callback = Arc::new(AddRuleOnFingerprint::default());
    let config = FinderConfig::default().with_progress_callback(callback.clone());
    let engine = Arc::new(Deduplicator::new(config, log.clone()));
    callback.engine.set(Arc::downgrade(&engine)).unwrap();

    let report = engine
        .scan_with_summary(&[dir.path().to_path_buf()])
        .unwrap();

    // Groups were classified with the rules in force when the scan started
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].categories(), vec!["Documents"]);
    assert!(!report.cached);
    assert_eq!(engine.cache_size(), 0);
    assert_eq!(engine.list_rules().len(), 1);
    assert!(log.contains("results were not cached"));
}

#[cfg(unix)]
mod permission_tests {
    use super::*;
    use dupesift::scanner::ScanError;
    use std::os::unix::fs::PermissionsExt;

    fn set_mode(path: &Path, mode: u32) {
        let mut perms = fs::metadata(path).unwrap().permissions();
        perms.set_mode(mode);
        fs::set_permissions(path, perms).unwrap();
    }

    #[test]
    fn test_unreadable_file_is_skipped_and_recorded() {
        let dir = docs_fixture();
        let locked = write(dir.path(), "locked.txt", b"same words");
        set_mode(&locked, 0o000);

        // Permission bits do not stop root
        if fs::File::open(&locked).is_ok() {
            set_mode(&locked, 0o644);
            return;
        }

        let (engine, log) = engine();
        let result = engine.scan_with_summary(&[dir.path().to_path_buf()]);
        set_mode(&locked, 0o644);

        let report = result.unwrap();
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].len(), 2);
        assert!(!report.groups[0].contains(&locked));
        assert_eq!(report.summary.failed_files, 1);
        assert!(log.contains("Error processing file"));
        assert_eq!(engine.cache_size(), 1);
    }

    #[test]
    fn test_unreadable_subdirectory_aborts_scan() {
        let dir = docs_fixture();
        let sub = dir.path().join("private");
        write(&sub, "hidden.txt", b"hidden content");
        set_mode(&sub, 0o000);

        if fs::read_dir(&sub).is_ok() {
            set_mode(&sub, 0o755);
            return;
        }

        let (engine, log) = engine();
        let result = engine.scan(&[dir.path().to_path_buf()]);
        set_mode(&sub, 0o755);

        assert!(matches!(
            result,
            Err(FinderError::Scan(ScanError::PermissionDenied(_)))
        ));
        assert_eq!(engine.cache_size(), 0);
        assert!(log.contains("Error scanning directory"));
    }
}
