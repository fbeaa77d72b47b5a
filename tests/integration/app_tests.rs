use clap::Parser;
use dupscan::cli::Cli;
use dupscan::config::Config;
use dupscan::error::ExitCode;
use dupscan::run_with_config;
use std::fs;
use std::path::Path;

use super::common::{tree_01, tree_03};

fn run(args: &[&str]) -> anyhow::Result<ExitCode> {
    let mut argv = vec!["dupscan", "--no-progress", "-q"];
    argv.extend_from_slice(args);
    run_with_config(Cli::parse_from(argv), Config::default())
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_json_listing_to_file() {
    let dir = tree_03();
    let out_dir = tempfile::tempdir().unwrap();
    let out = out_dir.path().join("dups.json");

    let code = run(&[arg(dir.path()), "-k", "name", "-o", arg(&out)]).unwrap();
    assert_eq!(code, ExitCode::Success);

    let text = fs::read_to_string(&out).unwrap();
    assert!(text.ends_with('\n'));
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let map = value.as_object().unwrap();
    assert_eq!(map.len(), 3);
    assert_eq!(
        map["ccc"],
        serde_json::json!([arg(&dir.path().join("ccc")), arg(&dir.path().join("dir/ccc"))])
    );
}

#[test]
fn test_custom_listing() {
    let dir = tree_03();
    let out_dir = tempfile::tempdir().unwrap();
    let out = out_dir.path().join("dups.txt");

    run(&[arg(dir.path()), "-k", "name-and-size", "--format", "custom", "-o", arg(&out)]).unwrap();

    let expected = format!(
        "ccc (3 bytes):\n    {}\n    {}\n\n",
        dir.path().join("ccc").display(),
        dir.path().join("dir/ccc").display()
    );
    assert_eq!(fs::read_to_string(&out).unwrap(), expected);
}

#[test]
fn test_no_listing_without_duplicates() {
    let dir = tree_01();
    let out_dir = tempfile::tempdir().unwrap();
    let out = out_dir.path().join("dups.json");

    let code = run(&[arg(dir.path()), "-o", arg(&out)]).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(!out.exists());
}

#[test]
fn test_cache_written_and_reused() {
    let dir = tree_03();
    let cache_dir = tempfile::tempdir().unwrap();
    let cache = cache_dir.path().join("scan.bin");

    run(&[arg(dir.path()), "-k", "content-hash", "-c", arg(&cache)]).unwrap();
    let store = dupscan::cache::ScanStore::load(&cache, dupscan::cache::CacheFormat::Binary).unwrap();
    assert_eq!(store.len(), 7);
    assert!(store.entries().all(|e| e.hash.is_some()));

    run(&[arg(dir.path()), "-k", "content-hash", "-c", arg(&cache)]).unwrap();
    let again = dupscan::cache::ScanStore::load(&cache, dupscan::cache::CacheFormat::Binary).unwrap();
    assert_eq!(again.len(), 7);
}

#[test]
fn test_corrupt_cache_is_replaced() {
    let dir = tree_03();
    let cache_dir = tempfile::tempdir().unwrap();
    let cache = cache_dir.path().join("scan.json");
    fs::write(&cache, "{ not json").unwrap();

    let code = run(&[arg(dir.path()), "-c", arg(&cache)]).unwrap();
    assert_eq!(code, ExitCode::Success);

    let store = dupscan::cache::ScanStore::load(&cache, dupscan::cache::CacheFormat::Json).unwrap();
    assert_eq!(store.len(), 7);
}

#[cfg(unix)]
#[test]
fn test_clean_links_updates_cache() {
    let dir = tree_03();
    let cache_dir = tempfile::tempdir().unwrap();
    let cache = cache_dir.path().join("scan.json");

    let code = run(&[
        arg(dir.path()),
        "-k",
        "content-hash",
        "-c",
        arg(&cache),
        "--clean",
        "--links",
    ])
    .unwrap();
    assert_eq!(code, ExitCode::Success);

    assert!(fs::symlink_metadata(dir.path().join("bbb"))
        .unwrap()
        .file_type()
        .is_symlink());
    let store = dupscan::cache::ScanStore::load(&cache, dupscan::cache::CacheFormat::Json).unwrap();
    assert_eq!(store.len(), 5);
    assert!(store.get(&dir.path().join("bbb")).is_none());
}

#[test]
fn test_missing_root_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = run(&[arg(&dir.path().join("missing"))]).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
}

#[test]
fn test_config_patterns_apply() {
    let dir = tree_03();
    let out_dir = tempfile::tempdir().unwrap();
    let out = out_dir.path().join("dups.json");
    let config = Config {
        ignore_patterns: Some(vec!["dir".to_string()]),
        ..Config::default()
    };

    let cli = Cli::parse_from([
        "dupscan",
        "--no-progress",
        "-q",
        arg(dir.path()),
        "-o",
        arg(&out),
    ]);
    run_with_config(cli, config).unwrap();
    assert!(!out.exists());
}

#[cfg(unix)]
#[test]
fn test_unwritable_cache_is_partial_success() {
    let dir = tree_03();
    let cache_dir = tempfile::tempdir().unwrap();
    // A directory in the way of the temp file makes every save fail.
    let cache = cache_dir.path().join("scan.json");
    fs::create_dir(cache_dir.path().join("scan.json.tmp")).unwrap();

    let out = cache_dir.path().join("dups.json");
    let code = run(&[arg(dir.path()), "-c", arg(&cache), "-k", "name", "-o", arg(&out)]).unwrap();
    assert_eq!(code, ExitCode::PartialSuccess);
    assert!(out.exists());
    assert!(!cache.exists());
}

#[cfg(unix)]
#[test]
fn test_non_utf8_name_does_not_break_the_cache() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tree_01();
    fs::write(dir.path().join(OsStr::from_bytes(b"bad\xff")), b"aaa").unwrap();
    let cache_dir = tempfile::tempdir().unwrap();
    let cache = cache_dir.path().join("scan.json");

    let code = run(&[arg(dir.path()), "-k", "content-hash", "-c", arg(&cache)]).unwrap();
    assert_eq!(code, ExitCode::Success);

    let store = dupscan::cache::ScanStore::load(&cache, dupscan::cache::CacheFormat::Json).unwrap();
    assert_eq!(store.len(), 2);
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_partial_success() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tree_01();
    let locked = dir.path().join("locked");
    fs::write(&locked, b"aaa").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::File::open(&locked).is_ok() {
        return;
    }

    let code = run(&[arg(dir.path()), "-k", "content-hash"]).unwrap();
    assert_eq!(code, ExitCode::PartialSuccess);
}
