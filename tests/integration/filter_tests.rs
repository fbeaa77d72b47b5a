use dupscan::duplicates::{scan_duplicates, DuplicateFinder, FinderError, KeyKind};
use dupscan::scanner::DEFAULT_IGNORE_PATTERNS;

use super::common::{tree_03, write};

#[test]
fn test_default_patterns_skip_hidden_and_cache_entries() {
    let dir = tree_03();
    write(dir.path(), ".git/aaa", b"aaa");
    write(dir.path(), "cache/aaa", b"aaa");
    write(dir.path(), "dir/.hidden", b"");
    write(dir.path(), "dir/cache.json", b"");

    let result = scan_duplicates(dir.path(), KeyKind::Name, DEFAULT_IGNORE_PATTERNS).unwrap();
    assert_eq!(result.scanned_files, 7);
    assert_eq!(result.duplicate_count(), 3);
}

#[test]
fn test_default_finder_uses_default_patterns() {
    let dir = tree_03();
    write(dir.path(), ".snapshot/aaa", b"aaa");

    let result = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path(), KeyKind::Name)
        .unwrap();
    assert_eq!(result.scanned_files, 7);
}

#[test]
fn test_root_is_never_filtered() {
    let parent = tempfile::tempdir().unwrap();
    let root = parent.path().join(".hidden_root");
    write(&root, "aaa", b"x");
    write(&root, "sub/aaa", b"x");

    let result = scan_duplicates(&root, KeyKind::ContentHash, DEFAULT_IGNORE_PATTERNS).unwrap();
    assert_eq!(result.scanned_files, 2);
    assert_eq!(result.duplicate_count(), 1);
}

#[test]
fn test_custom_patterns_replace_defaults() {
    let dir = tree_03();
    write(dir.path(), ".git/aaa", b"aaa");

    let result = scan_duplicates(dir.path(), KeyKind::Name, &["ccc", "d*d"]).unwrap();
    // .git is scanned now; ccc files and dir/ddd are not.
    assert_eq!(result.scanned_files, 5);
    assert_eq!(result.duplicate_count(), 3);
}

#[test]
fn test_directory_pattern_prunes_subtree() {
    let dir = tree_03();
    let result = scan_duplicates(dir.path(), KeyKind::ContentHash, &["dir"]).unwrap();
    assert_eq!(result.scanned_files, 3);
    assert_eq!(result.duplicate_count(), 1);
}

#[test]
fn test_invalid_pattern_is_reported() {
    let dir = tree_03();
    let err = scan_duplicates(dir.path(), KeyKind::Name, &["a[b"]).unwrap_err();
    assert!(matches!(err, FinderError::Filter(_)));
}
