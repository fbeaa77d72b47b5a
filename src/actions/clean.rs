//! Duplicate cleanup: keep one survivor per group, remove the rest.
//!
//! # Overview
//!
//! For every group of a [`DuplicateScanResult`], the first member is kept.
//! Every other member is removed according to [`RemovalMode`]:
//! - `Delete`: unlinked from the filesystem
//! - `Backup`: renamed aside with a suffix (`_bak` by default)
//! - `Trash`: moved to the system trash (recoverable)
//!
//! With `replace_with_links`, a symbolic link pointing to the survivor by a
//! relative path is created where each removed copy was.
//!
//! # Safety
//!
//! Before touching a group the survivor is checked to still be a regular
//! file. Before removing a copy its size and mtime are compared with the
//! scanned record (TOCTOU protection). Work already done is never rolled
//! back; failures are collected in the [`CleanReport`].
//!
//! # Example
//!
//! ```no_run
//! use dupscan::actions::{clean_duplicates, CleanConfig};
//! use dupscan::duplicates::{scan_duplicates, KeyKind};
//! use std::path::Path;
//!
//! let mut result = scan_duplicates(Path::new("/data"), KeyKind::ContentHash, &[".*"]).unwrap();
//! let report = clean_duplicates(&mut result, &CleanConfig::links()).unwrap();
//! println!("{}", report.summary());
//! ```

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use thiserror::Error;

use crate::duplicates::DuplicateScanResult;
use crate::scanner::path_utils::relative_to;
use crate::scanner::{FileRecord, FileStat};

/// Suffix appended to copies renamed aside in [`RemovalMode::Backup`].
pub const DEFAULT_BACKUP_SUFFIX: &str = "_bak";

/// Error type for cleanup operations.
#[derive(Debug, Error)]
pub enum CleanError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to remove or link.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// File was modified since scan (TOCTOU protection).
    #[error("file modified since scan: {0}")]
    Modified(PathBuf),

    /// The kept copy is gone or no longer a regular file.
    #[error("survivor missing, group left untouched: {0}")]
    SurvivorMissing(PathBuf),

    /// Something already occupies the backup name.
    #[error("backup target {target} already exists, {path} left in place")]
    BackupExists {
        /// Copy that was to be renamed aside
        path: PathBuf,
        /// Existing file at the backup name
        target: PathBuf,
    },

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    Trash {
        /// File that could not be trashed
        path: PathBuf,
        /// Message from the trash backend
        message: String,
    },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl CleanError {
    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::Modified(p)
            | Self::SurvivorMissing(p)
            | Self::BackupExists { path: p, .. }
            | Self::Trash { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }
}

/// How redundant copies are taken out of place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RemovalMode {
    /// Remove the file permanently
    #[default]
    Delete,
    /// Rename the file with the backup suffix
    Backup,
    /// Move the file to the system trash
    Trash,
}

/// Configuration for cleanup.
#[derive(Debug, Clone)]
pub struct CleanConfig {
    /// Leave a relative symlink to the survivor at each removed path.
    pub replace_with_links: bool,
    /// How copies are removed.
    pub mode: RemovalMode,
    /// Suffix used by [`RemovalMode::Backup`].
    pub backup_suffix: String,
    /// Check size and mtime against the scanned record before removing.
    pub verify_unchanged: bool,
    /// Keep going after a per-file failure.
    pub continue_on_error: bool,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            replace_with_links: false,
            mode: RemovalMode::Delete,
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
            verify_unchanged: true,
            continue_on_error: true,
        }
    }
}

impl CleanConfig {
    /// Delete copies and replace them with links to the survivor.
    #[must_use]
    pub fn links() -> Self {
        Self::default().with_links(true)
    }

    /// Enable/disable symlink replacement.
    #[must_use]
    pub fn with_links(mut self, replace: bool) -> Self {
        self.replace_with_links = replace;
        self
    }

    /// Set the removal mode.
    #[must_use]
    pub fn with_mode(mut self, mode: RemovalMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the suffix used when renaming copies aside.
    #[must_use]
    pub fn with_backup_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.backup_suffix = suffix.into();
        self
    }

    /// Enable/disable TOCTOU verification.
    #[must_use]
    pub fn with_verify_unchanged(mut self, verify: bool) -> Self {
        self.verify_unchanged = verify;
        self
    }

    /// Enable/disable continue on error.
    #[must_use]
    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }
}

/// One copy taken out of place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedFile {
    /// Path of the removed copy
    pub path: PathBuf,
    /// Survivor it duplicated
    pub survivor: PathBuf,
    /// Size of the removed copy in bytes
    pub size: u64,
    /// Relative link target, if a link now stands at `path`
    pub link_target: Option<PathBuf>,
    /// Where the copy was renamed to in backup mode
    pub backup_path: Option<PathBuf>,
}

/// Outcome of a cleanup run.
#[derive(Debug, Clone, Default)]
pub struct CleanReport {
    /// Copies removed from their place
    pub removed: Vec<CleanedFile>,
    /// Failures with their messages
    pub failures: Vec<(PathBuf, String)>,
    /// Groups processed
    pub groups: usize,
}

impl CleanReport {
    /// Number of removed copies.
    #[must_use]
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    /// Number of symlinks created.
    #[must_use]
    pub fn links_created(&self) -> usize {
        self.removed.iter().filter(|f| f.link_target.is_some()).count()
    }

    /// Number of failures.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Bytes taken out of place.
    #[must_use]
    pub fn bytes_freed(&self) -> u64 {
        self.removed.iter().map(|f| f.size).sum()
    }

    /// Check if every operation succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut text = format!(
            "Removed {} duplicate(s) in {} group(s), freed {}",
            self.removed_count(),
            self.groups,
            ByteSize::b(self.bytes_freed())
        );
        if self.links_created() > 0 {
            text.push_str(&format!(", {} link(s) created", self.links_created()));
        }
        if !self.all_succeeded() {
            text.push_str(&format!(", {} failed", self.failure_count()));
        }
        text
    }

    fn fail(&mut self, error: CleanError, config: &CleanConfig) -> Result<(), CleanError> {
        log::warn!("{}", error);
        if !config.continue_on_error {
            return Err(error);
        }
        self.failures
            .push((error.path().to_path_buf(), error.to_string()));
        Ok(())
    }
}

/// Keep the first member of every group and remove the others.
///
/// Removed paths are dropped from `result`; groups left with fewer than two
/// members disappear. Earlier removals are kept even if a later one fails.
///
/// # Errors
///
/// Only when `continue_on_error` is off: the first per-file failure.
pub fn clean_duplicates(
    result: &mut DuplicateScanResult,
    config: &CleanConfig,
) -> Result<CleanReport, CleanError> {
    let mut report = CleanReport::default();
    let mut removed_paths: HashSet<PathBuf> = HashSet::new();

    let outcome = clean_groups(result, config, &mut report, &mut removed_paths);
    result.forget_paths(&removed_paths);
    outcome?;

    log::info!("{}", report.summary());
    Ok(report)
}

fn clean_groups(
    result: &DuplicateScanResult,
    config: &CleanConfig,
    report: &mut CleanReport,
    removed_paths: &mut HashSet<PathBuf>,
) -> Result<(), CleanError> {
    for group in result.groups.values() {
        report.groups += 1;
        let survivor = group.survivor();

        if let Err(e) = check_survivor(survivor) {
            report.fail(e, config)?;
            continue;
        }

        for copy in group.redundant() {
            match clean_one(copy, survivor, config) {
                Ok((cleaned, link_error)) => {
                    removed_paths.insert(cleaned.path.clone());
                    report.removed.push(cleaned);
                    if let Some(e) = link_error {
                        report.fail(e, config)?;
                    }
                }
                Err(e) => report.fail(e, config)?,
            }
        }
    }
    Ok(())
}

fn check_survivor(survivor: &FileRecord) -> Result<(), CleanError> {
    match fs::symlink_metadata(&survivor.path) {
        Ok(meta) if meta.file_type().is_file() => Ok(()),
        _ => Err(CleanError::SurvivorMissing(survivor.path.clone())),
    }
}

fn verify_unchanged(record: &FileRecord) -> Result<(), CleanError> {
    let meta =
        fs::symlink_metadata(&record.path).map_err(|e| CleanError::from_io(&record.path, e))?;
    let current = FileStat::from_metadata(&meta);

    if !meta.file_type().is_file()
        || current.size != record.stat.size
        || current.mtime_secs != record.stat.mtime_secs
        || current.mtime_nanos != record.stat.mtime_nanos
    {
        return Err(CleanError::Modified(record.path.clone()));
    }
    Ok(())
}

/// Remove one copy; a failed link after a successful removal is returned
/// alongside the removal so the caller can still account for it.
fn clean_one(
    copy: &FileRecord,
    survivor: &FileRecord,
    config: &CleanConfig,
) -> Result<(CleanedFile, Option<CleanError>), CleanError> {
    let path = &copy.path;
    if config.verify_unchanged {
        verify_unchanged(copy)?;
    }

    let mut backup_path = None;
    match config.mode {
        RemovalMode::Delete => {
            log::info!("Removing {}", path.display());
            fs::remove_file(path).map_err(|e| CleanError::from_io(path, e))?;
        }
        RemovalMode::Backup => {
            let target = with_suffix(path, &config.backup_suffix);
            if fs::symlink_metadata(&target).is_ok() {
                return Err(CleanError::BackupExists {
                    path: path.clone(),
                    target,
                });
            }
            log::info!("Moving {} to {}", path.display(), target.display());
            fs::rename(path, &target).map_err(|e| CleanError::from_io(path, e))?;
            backup_path = Some(target);
        }
        RemovalMode::Trash => {
            log::info!("Moving {} to trash", path.display());
            trash::delete(path).map_err(|e| CleanError::Trash {
                path: path.clone(),
                message: e.to_string(),
            })?;
        }
    }

    let mut cleaned = CleanedFile {
        path: path.clone(),
        survivor: survivor.path.clone(),
        size: copy.stat.size,
        link_target: None,
        backup_path,
    };

    if !config.replace_with_links {
        return Ok((cleaned, None));
    }

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    let target = relative_to(&survivor.path, base);
    match symlink_file(&target, path) {
        Ok(()) => {
            log::debug!("Linked {} -> {}", path.display(), target.display());
            cleaned.link_target = Some(target);
            Ok((cleaned, None))
        }
        Err(e) => Ok((cleaned, Some(CleanError::from_io(path, e)))),
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(unix)]
fn symlink_file(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_file(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}
