use dupscan::cache::ScanStore;
use dupscan::duplicates::{scan_duplicates, DuplicateFinder, EquivalenceKey, FinderConfig, KeyKind};
use std::path::Path;

use super::common::{tree_01, tree_02, tree_03, tree_04, write};

const NO_PATTERNS: &[&str] = &[];

fn counts(root: &Path) -> (usize, usize, usize) {
    let count = |kind| {
        scan_duplicates(root, kind, NO_PATTERNS)
            .unwrap()
            .duplicate_count()
    };
    (
        count(KeyKind::Name),
        count(KeyKind::NameAndSize),
        count(KeyKind::ContentHash),
    )
}

#[test]
fn test_tree_01_has_no_duplicates() {
    let dir = tree_01();
    assert_eq!(counts(dir.path()), (0, 0, 0));
}

#[test]
fn test_tree_02_empty_files_share_content() {
    let dir = tree_02();
    assert_eq!(counts(dir.path()), (0, 0, 1));
}

#[test]
fn test_tree_03_counts() {
    let dir = tree_03();
    assert_eq!(counts(dir.path()), (3, 1, 2));
}

#[test]
fn test_tree_04_counts() {
    let dir = tree_04();
    assert_eq!(counts(dir.path()), (3, 0, 1));
}

#[test]
fn test_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    let result = scan_duplicates(dir.path(), KeyKind::ContentHash, NO_PATTERNS).unwrap();
    assert!(result.is_empty());
    assert_eq!(result.scanned_files, 0);
    assert_eq!(result.duplicate_size(), 0);
}

#[test]
fn test_name_and_size_group_members() {
    let dir = tree_03();
    let result = scan_duplicates(dir.path(), KeyKind::NameAndSize, NO_PATTERNS).unwrap();

    let key = EquivalenceKey::NameAndSize("ccc".to_string(), 3);
    let group = result.get(&key).unwrap();
    assert_eq!(
        group.paths(),
        vec![dir.path().join("ccc"), dir.path().join("dir/ccc")]
    );
    assert_eq!(result.duplicate_size(), 3);
}

#[test]
fn test_content_groups_ignore_names() {
    let dir = tree_04();
    let result = scan_duplicates(dir.path(), KeyKind::ContentHash, NO_PATTERNS).unwrap();

    assert_eq!(result.group_count(), 1);
    let group = result.groups.values().next().unwrap();
    assert_eq!(
        group.paths(),
        vec![dir.path().join("aaa"), dir.path().join("dir/ddd")]
    );
    assert_eq!(group.survivor().path, dir.path().join("aaa"));
    assert_eq!(result.duplicate_size(), 3);
}

#[test]
fn test_duplicate_size_counts_redundant_copies_only() {
    let dir = tempfile::tempdir().unwrap();
    for rel in ["a/big", "b/big", "c/big"] {
        write(dir.path(), rel, &[7u8; 1000]);
    }
    let result = scan_duplicates(dir.path(), KeyKind::ContentHash, NO_PATTERNS).unwrap();
    assert_eq!(result.duplicate_count(), 2);
    assert_eq!(result.duplicate_size(), 2000);
}

#[test]
fn test_scan_subdirectory_only() {
    let dir = tree_03();
    let result = scan_duplicates(&dir.path().join("dir"), KeyKind::Name, NO_PATTERNS).unwrap();
    assert_eq!(result.scanned_files, 4);
    assert!(result.is_empty());
}

#[test]
fn test_file_root_is_rejected() {
    let dir = tree_01();
    let finder = DuplicateFinder::with_defaults();
    assert!(finder
        .find_duplicates(&dir.path().join("aaa"), KeyKind::Name)
        .is_err());
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_not_scanned() {
    let dir = tree_01();
    std::os::unix::fs::symlink(dir.path().join("aaa"), dir.path().join("link")).unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    std::os::unix::fs::symlink(dir.path().join("bbb"), dir.path().join("sub/bbb")).unwrap();

    let result = scan_duplicates(dir.path(), KeyKind::Name, NO_PATTERNS).unwrap();
    assert_eq!(result.scanned_files, 2);
    assert!(result.is_empty());
}

#[cfg(unix)]
#[test]
fn test_fifos_and_sockets_are_not_scanned() {
    let dir = tree_01();
    let status = std::process::Command::new("mkfifo")
        .arg(dir.path().join("aaa.fifo"))
        .status()
        .unwrap();
    assert!(status.success());
    let _socket = std::os::unix::net::UnixListener::bind(dir.path().join("sock")).unwrap();

    let result = scan_duplicates(dir.path(), KeyKind::Name, NO_PATTERNS).unwrap();
    assert_eq!(result.scanned_files, 2);

    // Reading a FIFO would block forever.
    let result = scan_duplicates(dir.path(), KeyKind::ContentHash, NO_PATTERNS).unwrap();
    assert_eq!(result.scanned_files, 2);
    assert!(result.is_empty());
}

#[cfg(unix)]
#[test]
fn test_non_utf8_names_are_grouped() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tree_01();
    let odd = OsStr::from_bytes(b"bad\xff");
    std::fs::write(dir.path().join(odd), b"aaa").unwrap();

    let result = scan_duplicates(dir.path(), KeyKind::ContentHash, NO_PATTERNS).unwrap();
    assert_eq!(result.scanned_files, 3);
    assert_eq!(result.duplicate_count(), 1);
    let group = result.groups.values().next().unwrap();
    assert!(group.paths().contains(&dir.path().join(odd)));
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_a_hash_failure() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tree_04();
    let locked = dir.path().join("locked");
    write(dir.path(), "locked", b"aaa");
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();
    if std::fs::File::open(&locked).is_ok() {
        // Permission bits do not apply (running as root).
        return;
    }

    let finder = DuplicateFinder::new(
        FinderConfig::default().with_ignore_patterns(Vec::<String>::new()),
    );
    let mut store = ScanStore::default();
    let (result, summary) = finder
        .find_duplicates_in_store(&mut store, dir.path(), KeyKind::ContentHash)
        .unwrap();

    assert_eq!(summary.hash_failures, 1);
    assert!(summary.has_errors());
    assert_eq!(result.duplicate_count(), 1);
    assert!(result
        .groups
        .values()
        .all(|g| !g.paths().contains(&locked)));
}
