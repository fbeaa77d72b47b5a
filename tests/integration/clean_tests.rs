#![cfg(unix)]

use dupscan::actions::{clean_duplicates, CleanConfig, RemovalMode};
use dupscan::duplicates::{scan_duplicates, KeyKind};
use std::fs;
use std::path::{Path, PathBuf};

use super::common::{tree_03, tree_04};

const NO_PATTERNS: &[&str] = &[];

#[test]
fn test_links_point_at_survivor_relatively() {
    let dir = tree_04();
    let mut result = scan_duplicates(dir.path(), KeyKind::ContentHash, NO_PATTERNS).unwrap();

    let report = clean_duplicates(&mut result, &CleanConfig::links()).unwrap();
    assert_eq!(report.removed_count(), 1);
    assert_eq!(report.links_created(), 1);
    assert_eq!(report.bytes_freed(), 3);
    assert!(report.all_succeeded());

    let copy = dir.path().join("dir/ddd");
    let meta = fs::symlink_metadata(&copy).unwrap();
    assert!(meta.file_type().is_symlink());
    assert_eq!(fs::read_link(&copy).unwrap(), PathBuf::from("../aaa"));
    assert_eq!(fs::read(&copy).unwrap(), b"aaa");
    assert!(result.is_empty());
}

#[test]
fn test_rescan_after_linking_finds_nothing() {
    let dir = tree_03();
    let mut result = scan_duplicates(dir.path(), KeyKind::ContentHash, NO_PATTERNS).unwrap();
    clean_duplicates(&mut result, &CleanConfig::links()).unwrap();

    let again = scan_duplicates(dir.path(), KeyKind::ContentHash, NO_PATTERNS).unwrap();
    assert_eq!(again.duplicate_count(), 0);
    assert_eq!(again.scanned_files, 5);
}

#[test]
fn test_delete_keeps_first_path() {
    let dir = tree_03();
    let mut result = scan_duplicates(dir.path(), KeyKind::NameAndSize, NO_PATTERNS).unwrap();

    let report = clean_duplicates(&mut result, &CleanConfig::default()).unwrap();
    assert_eq!(report.removed_count(), 1);
    assert!(dir.path().join("ccc").exists());
    assert!(!dir.path().join("dir/ccc").exists());
    assert!(fs::symlink_metadata(dir.path().join("dir/ccc")).is_err());
}

#[test]
fn test_backup_renames_copy() {
    let dir = tree_04();
    let mut result = scan_duplicates(dir.path(), KeyKind::ContentHash, NO_PATTERNS).unwrap();

    let config = CleanConfig::links().with_mode(RemovalMode::Backup);
    let report = clean_duplicates(&mut result, &config).unwrap();

    let backup = dir.path().join("dir/ddd_bak");
    assert_eq!(report.removed[0].backup_path.as_deref(), Some(backup.as_path()));
    assert_eq!(fs::read(&backup).unwrap(), b"aaa");
    assert!(fs::symlink_metadata(dir.path().join("dir/ddd"))
        .unwrap()
        .file_type()
        .is_symlink());
}

#[test]
fn test_modified_copy_is_skipped() {
    let dir = tree_04();
    let mut result = scan_duplicates(dir.path(), KeyKind::ContentHash, NO_PATTERNS).unwrap();

    let copy = dir.path().join("dir/ddd");
    fs::write(&copy, b"changed since the scan").unwrap();

    let report = clean_duplicates(&mut result, &CleanConfig::links()).unwrap();
    assert_eq!(report.removed_count(), 0);
    assert_eq!(report.failure_count(), 1);
    assert!(!report.all_succeeded());
    assert!(fs::symlink_metadata(&copy).unwrap().file_type().is_file());
}

#[test]
fn test_missing_survivor_skips_group() {
    let dir = tree_04();
    let mut result = scan_duplicates(dir.path(), KeyKind::ContentHash, NO_PATTERNS).unwrap();
    fs::remove_file(dir.path().join("aaa")).unwrap();

    let report = clean_duplicates(&mut result, &CleanConfig::links()).unwrap();
    assert_eq!(report.removed_count(), 0);
    assert_eq!(report.failure_count(), 1);
    assert!(Path::new(&dir.path().join("dir/ddd")).is_file());
}
