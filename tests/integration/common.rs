//! Fixture trees shared by the integration tests.

use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub fn write(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Two files with distinct names and content.
pub fn tree_01() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "aaa", b"aaa");
    write(dir.path(), "bbb", b"bbb");
    dir
}

/// Two empty files and one with three zero bytes.
pub fn tree_02() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "aaa", b"");
    write(dir.path(), "bbb", b"");
    write(dir.path(), "ccc", &[0u8; 3]);
    dir
}

/// `tree_02` plus a subdirectory reusing the names.
pub fn tree_03() -> TempDir {
    let dir = tree_02();
    write(dir.path(), "dir/aaa", b"aaa");
    write(dir.path(), "dir/bbb", b"bbb");
    write(dir.path(), "dir/ccc", &[0u8; 3]);
    write(dir.path(), "dir/ddd", &[0u8; 4]);
    dir
}

/// Same names at two levels with mostly different content.
pub fn tree_04() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "aaa", b"aaa");
    write(root, "bbb", b"");
    write(root, "ccc", &[0u8; 3]);
    write(root, "dir/aaa", &[0u8; 4]);
    write(root, "dir/bbb", b"bbb");
    write(root, "dir/ccc", &[0u8; 5]);
    write(root, "dir/ddd", b"aaa");
    dir
}
