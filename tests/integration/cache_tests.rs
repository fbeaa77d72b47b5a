use dupscan::cache::{CacheFormat, ScanStore, StoreConfig};
use dupscan::duplicates::{DuplicateFinder, FinderConfig, KeyKind};
use std::fs;
use std::time::{Duration, SystemTime};

use super::common::{tree_03, write};

fn finder() -> DuplicateFinder {
    DuplicateFinder::new(FinderConfig::default().with_ignore_patterns(Vec::<String>::new()))
}

#[test]
fn test_saved_cache_avoids_rehashing() {
    let dir = tree_03();
    let cache_dir = tempfile::tempdir().unwrap();

    for format in [CacheFormat::Json, CacheFormat::Binary] {
        let cache = cache_dir.path().join(format!("scan.{}", format));

        let mut store = ScanStore::default();
        let (first, summary) = finder()
            .find_duplicates_in_store(&mut store, dir.path(), KeyKind::ContentHash)
            .unwrap();
        assert_eq!(summary.hashed, 7);
        store.save(&cache, format).unwrap();

        let mut reloaded = ScanStore::load(&cache, format).unwrap();
        assert_eq!(reloaded.len(), 7);
        let (second, summary) = finder()
            .find_duplicates_in_store(&mut reloaded, dir.path(), KeyKind::ContentHash)
            .unwrap();
        assert_eq!(summary.hashed, 0);
        assert_eq!(summary.reused, 7);
        assert_eq!(second.duplicate_count(), first.duplicate_count());
        assert_eq!(second.groups.keys().collect::<Vec<_>>(), first.groups.keys().collect::<Vec<_>>());
    }
}

#[test]
fn test_json_cache_is_keyed_by_path() {
    let dir = tree_03();
    let cache_dir = tempfile::tempdir().unwrap();
    let cache = cache_dir.path().join("scan.json");

    let mut store = ScanStore::default();
    finder()
        .find_duplicates_in_store(&mut store, dir.path(), KeyKind::ContentHash)
        .unwrap();
    store.save(&cache, CacheFormat::Json).unwrap();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&cache).unwrap()).unwrap();
    let map = value.as_object().unwrap();
    assert_eq!(map.len(), 7);

    let key = dir.path().join("dir/ddd");
    let entry = &map[key.to_str().unwrap()];
    assert_eq!(entry["name"], "ddd");
    assert_eq!(entry["path"], key.to_str().unwrap());
    assert_eq!(entry["is_file"], true);
    assert_eq!(entry["is_dir"], false);
    assert_eq!(entry["stat"]["size"], 4);
    assert_eq!(entry["hash"].as_str().unwrap().len(), 64);
}

#[test]
fn test_modified_file_is_rehashed() {
    let dir = tree_03();
    let mut store = ScanStore::default();
    finder()
        .find_duplicates_in_store(&mut store, dir.path(), KeyKind::ContentHash)
        .unwrap();

    let changed = dir.path().join("dir/ddd");
    fs::write(&changed, [0u8; 3]).unwrap();
    let later = SystemTime::now() + Duration::from_secs(10);
    filetime::set_file_mtime(&changed, filetime::FileTime::from_system_time(later)).unwrap();

    let (result, summary) = finder()
        .find_duplicates_in_store(&mut store, dir.path(), KeyKind::ContentHash)
        .unwrap();
    assert_eq!(summary.hashed, 1);
    // dir/ddd now matches ccc and dir/ccc.
    assert_eq!(result.duplicate_count(), 3);
}

#[test]
fn test_rehash_flag_recomputes_everything() {
    let dir = tree_03();
    let mut store = ScanStore::default();
    finder()
        .find_duplicates_in_store(&mut store, dir.path(), KeyKind::ContentHash)
        .unwrap();

    let rehashing = DuplicateFinder::new(
        FinderConfig::default()
            .with_ignore_patterns(Vec::<String>::new())
            .with_store_config(StoreConfig::default().with_force_rehash(true)),
    );
    let (_, summary) = rehashing
        .find_duplicates_in_store(&mut store, dir.path(), KeyKind::ContentHash)
        .unwrap();
    assert_eq!(summary.hashed, 7);
    assert_eq!(summary.reused, 0);
}

#[test]
fn test_deleted_files_leave_the_cache() {
    let dir = tree_03();
    let mut store = ScanStore::default();
    finder()
        .find_duplicates_in_store(&mut store, dir.path(), KeyKind::Name)
        .unwrap();
    assert_eq!(store.len(), 7);

    fs::remove_dir_all(dir.path().join("dir")).unwrap();
    let (result, summary) = finder()
        .find_duplicates_in_store(&mut store, dir.path(), KeyKind::Name)
        .unwrap();
    assert_eq!(summary.pruned, 4);
    assert_eq!(store.len(), 3);
    assert!(result.is_empty());
}

#[test]
fn test_one_cache_serves_several_roots() {
    let first = tree_03();
    let second = tempfile::tempdir().unwrap();
    write(second.path(), "aaa", b"aaa");
    write(second.path(), "zzz", b"aaa");

    let mut store = ScanStore::default();
    finder()
        .find_duplicates_in_store(&mut store, first.path(), KeyKind::ContentHash)
        .unwrap();
    let (result, _) = finder()
        .find_duplicates_in_store(&mut store, second.path(), KeyKind::ContentHash)
        .unwrap();

    // Entries of the first root are kept but not grouped.
    assert_eq!(store.len(), 9);
    assert_eq!(result.scanned_files, 2);
    assert_eq!(result.duplicate_count(), 1);
}

#[test]
fn test_metadata_scan_then_content_scan() {
    let dir = tree_03();
    let mut store = ScanStore::default();
    let (_, summary) = finder()
        .find_duplicates_in_store(&mut store, dir.path(), KeyKind::Name)
        .unwrap();
    assert_eq!(summary.hashed, 0);
    assert!(store.entries().all(|e| e.hash.is_none()));

    let (result, summary) = finder()
        .find_duplicates_in_store(&mut store, dir.path(), KeyKind::ContentHash)
        .unwrap();
    assert_eq!(summary.hashed, 7);
    assert_eq!(result.duplicate_count(), 2);
}

#[test]
fn test_clean_forgets_root() {
    let dir = tree_03();
    let mut store = ScanStore::default();
    finder()
        .find_duplicates_in_store(&mut store, dir.path(), KeyKind::Name)
        .unwrap();

    assert_eq!(store.clean(Some(&dir.path().join("dir"))), 4);
    assert_eq!(store.len(), 3);
    assert_eq!(store.clean(None), 3);
    assert!(store.is_empty());
}

#[test]
fn test_two_spellings_of_a_root_share_entries() {
    let dir = tree_03();
    let mut store = ScanStore::default();
    finder()
        .find_duplicates_in_store(&mut store, dir.path(), KeyKind::ContentHash)
        .unwrap();

    let detour = dir.path().join("dir").join("..").join(".");
    let (result, summary) = finder()
        .find_duplicates_in_store(&mut store, &detour, KeyKind::ContentHash)
        .unwrap();

    assert_eq!(store.len(), 7);
    assert_eq!(summary.reused, 7);
    assert_eq!(summary.hashed, 0);
    assert_eq!(summary.pruned, 0);
    assert_eq!(result.scanned_files, 7);
    assert!(result
        .groups
        .values()
        .flat_map(|g| g.paths())
        .all(|p| p.starts_with(dir.path()) && !p.components().any(|c| c.as_os_str() == "..")));
}
