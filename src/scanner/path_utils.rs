//! Path helpers shared by the scan store and the cleaner.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Make a path absolute without resolving symlinks.
///
/// `.` and `..` components are folded away lexically, so every spelling of
/// a directory maps to the same key in the scan store.
///
/// ```
/// use dupscan::scanner::path_utils::absolute;
/// use std::path::{Path, PathBuf};
///
/// # #[cfg(unix)]
/// assert_eq!(
///     absolute(Path::new("/data/./a/../b")).unwrap(),
///     PathBuf::from("/data/b")
/// );
/// ```
///
/// # Errors
///
/// Fails if the current directory cannot be determined.
pub fn absolute(path: &Path) -> io::Result<PathBuf> {
    let path = std::path::absolute(path)?;

    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    normalized.pop();
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}

/// Relative path that leads from directory `base` to `target`.
///
/// Both paths should be absolute and free of `..` components, as produced
/// by [`absolute`] or by walking from an absolute root.
///
/// ```
/// use dupscan::scanner::path_utils::relative_to;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(
///     relative_to(Path::new("/data/a/file.txt"), Path::new("/data/b/c")),
///     PathBuf::from("../../a/file.txt")
/// );
/// ```
#[must_use]
pub fn relative_to(target: &Path, base: &Path) -> PathBuf {
    let target: Vec<Component<'_>> = target.components().collect();
    let base: Vec<Component<'_>> = base.components().collect();

    let common = target
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for component in &base[common..] {
        if !matches!(component, Component::CurDir) {
            relative.push("..");
        }
    }
    for component in &target[common..] {
        relative.push(component.as_os_str());
    }

    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    relative
}

/// Whether `path` lies under `root` (component-wise, `root` included).
#[must_use]
pub fn is_under(path: &Path, root: &Path) -> bool {
    path.starts_with(root)
}
