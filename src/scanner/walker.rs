//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for lazily traversing a
//! directory tree and producing a [`FileRecord`] for every regular file
//! below the root.
//!
//! # Features
//!
//! - Streaming traversal: entries are read as the iterator is pulled
//! - Ignored entries are pruned before they are stat'ed or descended into
//! - Directories, FIFOs, sockets and device nodes are never yielded
//! - Symbolic links are never yielded; symlinked directories are only
//!   traversed when [`WalkerConfig::follow_symlinks`] is set
//! - Per-entry I/O errors are yielded as [`ScanError`] values and the walk
//!   continues with the next entry
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use dupscan::scanner::{PathFilter, Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let filter = PathFilter::new([".*"]).unwrap();
//! let walker = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::default(), filter);
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("Found {} files", files.len());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::{DirEntry, WalkDir};

use super::{FileRecord, PathFilter, ScanError, WalkerConfig};

/// Lazy directory walker.
///
/// Each call to [`Walker::walk`] starts a fresh traversal from the root.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Compiled ignore patterns
    filter: PathFilter,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given root.
    ///
    /// Record paths are built by joining entry names onto `path`, so pass
    /// an absolute root to get absolute record paths.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig, filter: PathFilter) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            filter,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Root this walker starts from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn is_ignored(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        let ignored = self.filter.matches(&name);
        if ignored {
            log::debug!("Skipping {}", entry.path().display());
        }
        ignored
    }

    /// Walk the directory tree, yielding file records.
    ///
    /// Directories and symbolic links are never yielded. Errors on an
    /// individual entry are logged and yielded as [`ScanError`] values
    /// rather than stopping iteration.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileRecord, ScanError>> + '_ {
        WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| !self.is_ignored(entry))
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    false
                } else {
                    true
                }
            })
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => self.process_entry(&entry),
                Err(e) => Some(Err(self.handle_walk_error(e))),
            })
    }

    fn process_entry(&self, entry: &DirEntry) -> Option<Result<FileRecord, ScanError>> {
        let file_type = entry.file_type();

        if file_type.is_dir() {
            return None;
        }

        if file_type.is_symlink() || entry.path_is_symlink() {
            log::trace!("Skipping symlink: {}", entry.path().display());
            return None;
        }

        // FIFOs, sockets and device nodes: opening a FIFO for hashing blocks.
        if !file_type.is_file() {
            log::debug!("Skipping special file: {}", entry.path().display());
            return None;
        }

        let path = entry.path().to_path_buf();
        match std::fs::symlink_metadata(&path) {
            Ok(metadata) => Some(Ok(FileRecord::from_metadata(path, &metadata))),
            Err(e) => Some(Err(self.handle_io_error(&path, e))),
        }
    }

    fn handle_io_error(&self, path: &Path, error: std::io::Error) -> ScanError {
        let err = ScanError::from_io(path, error);
        match &err {
            ScanError::NotFound(_) => {
                log::debug!("File not found (may have been deleted): {}", path.display());
            }
            _ => log::warn!("{}", err),
        }
        err
    }

    fn handle_walk_error(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);
        let io_error = error
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
        self.handle_io_error(&path, io_error)
    }
}
