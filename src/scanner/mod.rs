//! Scanner module for directory traversal and file hashing.
//!
//! This module provides functionality for:
//! - Name-based ignore filtering of directory entries
//! - Lazy, single-threaded directory walking using walkdir
//! - Streaming content hashing with BLAKE3
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`filter`]: Glob ignore patterns compiled into a single matcher
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: BLAKE3 file hashing (streaming, fixed-size blocks)
//! - [`path_utils`]: Relative path computation for symlink targets
//!
//! # Example
//!
//! ```no_run
//! use dupscan::scanner::{PathFilter, Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let filter = PathFilter::default_patterns().unwrap();
//! let walker = Walker::new(Path::new("."), WalkerConfig::default(), filter);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(record) => println!("{}: {} bytes", record.path.display(), record.stat.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod filter;
pub mod hasher;
pub mod path_utils;
pub mod walker;

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

// Re-export main types
pub use filter::{FilterError, PathFilter, DEFAULT_IGNORE_PATTERNS};
pub use hasher::{Hasher, DEFAULT_BLOCK_SIZE};
pub use walker::Walker;

/// Snapshot of the `stat` fields kept for a file.
///
/// Modification time is split into whole seconds and nanoseconds so it
/// survives a JSON round trip without floating-point loss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    /// File size in bytes
    pub size: u64,
    /// Modification time, seconds relative to the Unix epoch
    pub mtime_secs: i64,
    /// Sub-second part of the modification time
    pub mtime_nanos: u32,
    /// Inode number (0 where the platform has none)
    pub inode: u64,
    /// Raw mode bits (0 where the platform has none)
    pub mode: u32,
}

impl FileStat {
    /// Build a stat snapshot from filesystem metadata.
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let (mtime_secs, mtime_nanos) = metadata
            .modified()
            .map(split_system_time)
            .unwrap_or((0, 0));

        Self {
            size: metadata.len(),
            mtime_secs,
            mtime_nanos,
            inode: inode_of(metadata),
            mode: mode_of(metadata),
        }
    }

    /// Modification time as a `SystemTime`.
    #[must_use]
    pub fn modified(&self) -> SystemTime {
        let nanos = std::time::Duration::new(0, self.mtime_nanos);
        if self.mtime_secs >= 0 {
            UNIX_EPOCH + std::time::Duration::from_secs(self.mtime_secs as u64) + nanos
        } else {
            UNIX_EPOCH - std::time::Duration::from_secs(self.mtime_secs.unsigned_abs()) + nanos
        }
    }
}

fn split_system_time(time: SystemTime) -> (i64, u32) {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => (d.as_secs() as i64, d.subsec_nanos()),
        Err(e) => {
            // Before the epoch: floor to whole seconds, keep nanos positive.
            let d = e.duration();
            let secs = -(d.as_secs() as i64);
            match d.subsec_nanos() {
                0 => (secs, 0),
                n => (secs - 1, 1_000_000_000 - n),
            }
        }
    }
}

#[cfg(unix)]
fn inode_of(metadata: &Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.ino()
}

#[cfg(not(unix))]
fn inode_of(_metadata: &Metadata) -> u64 {
    0
}

#[cfg(unix)]
fn mode_of(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    metadata.mode()
}

#[cfg(not(unix))]
fn mode_of(_metadata: &Metadata) -> u32 {
    0
}

/// Immutable snapshot of one filesystem entry taken at scan time.
///
/// Two records are equal when name, path, type flags, size and
/// modification time all match. Inode and mode are informational only,
/// so a record rebuilt from the scan cache keeps its identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Base name of the entry
    pub name: String,
    /// Absolute path to the entry
    pub path: PathBuf,
    /// Whether the entry is a directory
    pub is_dir: bool,
    /// Whether the entry is a regular file
    pub is_file: bool,
    /// Whether the entry is a symbolic link
    pub is_symlink: bool,
    /// Stat snapshot
    pub stat: FileStat,
}

impl FileRecord {
    /// Create a record from a path and its `symlink_metadata`.
    #[must_use]
    pub fn from_metadata(path: PathBuf, metadata: &Metadata) -> Self {
        let file_type = metadata.file_type();
        Self {
            name: base_name(&path),
            is_dir: file_type.is_dir(),
            is_file: file_type.is_file(),
            is_symlink: file_type.is_symlink(),
            stat: FileStat::from_metadata(metadata),
            path,
        }
    }

    /// Stat a path without following symlinks and build its record.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] if the path cannot be stat'ed.
    pub fn from_path(path: &Path) -> Result<Self, ScanError> {
        let metadata =
            std::fs::symlink_metadata(path).map_err(|e| ScanError::from_io(path, e))?;
        Ok(Self::from_metadata(path.to_path_buf(), &metadata))
    }

    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.stat.size
    }

    /// Inode number recorded at scan time.
    #[must_use]
    pub fn inode(&self) -> u64 {
        self.stat.inode
    }
}

impl PartialEq for FileRecord {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.path == other.path
            && self.is_dir == other.is_dir
            && self.is_file == other.is_file
            && self.is_symlink == other.is_symlink
            && self.stat.size == other.stat.size
            && self.stat.mtime_secs == other.stat.mtime_secs
            && self.stat.mtime_nanos == other.stat.mtime_nanos
    }
}

impl Eq for FileRecord {}

/// Base name of a path as a lossy UTF-8 string.
#[must_use]
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Traverse into symlinked directories.
    /// Symlinks themselves are never yielded either way.
    pub follow_symlinks: bool,
}

impl WalkerConfig {
    /// Set whether symlinked directories are traversed.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error for the given path.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied(p) | Self::NotFound(p) | Self::Io { path: p, .. } => p,
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Hashing was aborted by a shutdown request.
    #[error("Hashing interrupted: {0}")]
    Interrupted(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify an I/O error for the given path.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}
