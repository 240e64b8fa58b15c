use dupesift::classify::categorize;
use dupesift::duplicates::{DuplicateIndex, FileRecord};
use dupesift::scanner::{FingerprintAlgorithm, Fingerprinter};
use proptest::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn record(i: usize, fingerprint: u8) -> FileRecord {
    FileRecord {
        path: PathBuf::from(format!("/fake/path/{}", i)),
        fingerprint: format!("{:02x}", fingerprint),
        category: "Documents".to_string(),
    }
}

proptest! {
    #[test]
    fn test_fingerprint_determinism(content in prop::collection::vec(any::<u8>(), 0..20_000)) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.bin");
        fs::write(&path, &content).unwrap();

        let fingerprinter = Fingerprinter::default();
        let first = fingerprinter.fingerprint(&path).unwrap();
        let second = fingerprinter.fingerprint(&path).unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first, fingerprinter.fingerprint_bytes(&content));
    }

    #[test]
    fn test_fingerprint_independent_of_buffer_size(
        content in prop::collection::vec(any::<u8>(), 0..5_000),
        buffer in 1usize..512,
    ) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.bin");
        fs::write(&path, &content).unwrap();

        for algorithm in [FingerprintAlgorithm::Md5, FingerprintAlgorithm::Blake3] {
            let small = Fingerprinter::new(algorithm).with_buffer_size(buffer);
            let default = Fingerprinter::new(algorithm);
            prop_assert_eq!(small.fingerprint(&path).unwrap(), default.fingerprint(&path).unwrap());
        }
    }

    #[test]
    fn test_materialized_groups_invariants(fingerprints in prop::collection::vec(0u8..8, 0..60)) {
        let index = DuplicateIndex::new();
        for (i, &fp) in fingerprints.iter().enumerate() {
            index.insert(record(i, fp));
        }

        let groups = index.materialize();

        // Invariant: every group has at least 2 members
        for group in &groups {
            prop_assert!(group.len() >= 2);
        }

        // Invariant: no path appears in two groups
        let mut seen = HashSet::new();
        for group in &groups {
            for member in &group.members {
                prop_assert!(seen.insert(member.path.clone()));
            }
        }

        // Invariant: grouped files = files whose fingerprint occurs at least twice
        let expected: usize = (0u8..8)
            .map(|fp| fingerprints.iter().filter(|&&f| f == fp).count())
            .filter(|&n| n >= 2)
            .sum();
        prop_assert_eq!(seen.len(), expected);
    }

    #[test]
    fn test_removal_keeps_groups_at_least_pairs(
        fingerprints in prop::collection::vec(0u8..5, 2..40),
        removals in prop::collection::vec(any::<prop::sample::Index>(), 0..20),
    ) {
        let index = DuplicateIndex::new();
        for (i, &fp) in fingerprints.iter().enumerate() {
            index.insert(record(i, fp));
        }

        for pick in removals {
            let victim = pick.index(fingerprints.len());
            index.remove_path(&PathBuf::from(format!("/fake/path/{}", victim)));

            for group in index.materialize() {
                prop_assert!(group.len() >= 2);
                for member in &group.members {
                    prop_assert_eq!(index.category_of(&member.path), Some(member.category.clone()));
                }
            }
        }
    }

    #[test]
    fn test_categorize_is_case_insensitive(stem in "[a-z]{1,8}", ext in "(txt|PNG|Mp3|zip|sql|json)") {
        let lower = categorize(&format!("{}.{}", stem, ext.to_lowercase()));
        let upper = categorize(&format!("{}.{}", stem.to_uppercase(), ext.to_uppercase()));
        prop_assert_eq!(lower, upper);
    }
}
