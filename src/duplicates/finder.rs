//! Duplicate finder: walk, key and group in one call.
//!
//! # Overview
//!
//! [`DuplicateFinder`] composes the pipeline:
//! 1. **Filter** - compile the ignore patterns once
//! 2. **Walk + store** - refresh a [`ScanStore`] for the root, hashing
//!    content only when the key needs it
//! 3. **Group** - group the stored entries under the root by the chosen key
//!
//! Without a persistent cache the store lives only for the call. With one,
//! [`DuplicateFinder::find_duplicates_in_store`] refreshes the caller's store
//! so the next run can skip unchanged files.
//!
//! # Example
//!
//! ```no_run
//! use dupscan::duplicates::{scan_duplicates, KeyKind};
//! use std::path::Path;
//!
//! let result = scan_duplicates(Path::new("."), KeyKind::NameAndSize, &[".*", "cache*"]).unwrap();
//! println!("{} redundant copies in {} files", result.duplicate_count(), result.scanned_files);
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

use super::groups::DuplicateScanResult;
use super::key::KeyKind;
use crate::cache::{ScanStore, StoreConfig, StoreError, UpdateSummary};
use crate::scanner::{FilterError, PathFilter, DEFAULT_IGNORE_PATTERNS};

/// Configuration for the duplicate finder.
#[derive(Debug, Clone)]
pub struct FinderConfig {
    /// Glob patterns matched against entry base names during the walk
    pub ignore_patterns: Vec<String>,
    /// Settings for the underlying store refresh
    pub store: StoreConfig,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            ignore_patterns: DEFAULT_IGNORE_PATTERNS
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
            store: StoreConfig::default(),
        }
    }
}

impl FinderConfig {
    /// Replace the ignore patterns.
    #[must_use]
    pub fn with_ignore_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the store refresh settings.
    #[must_use]
    pub fn with_store_config(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }
}

/// Errors that end a duplicate scan.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An ignore pattern did not compile.
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// The scan store failed.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for FinderError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Interrupted => Self::Interrupted,
            StoreError::PathNotFound(path) => Self::PathNotFound(path),
            other => Self::Store(other),
        }
    }
}

/// Runs a scan of one root with one key function.
#[derive(Debug, Default)]
pub struct DuplicateFinder {
    config: FinderConfig,
}

impl DuplicateFinder {
    /// Create a finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Create a finder with default patterns and settings.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Finder configuration.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Scan `root` and group its files by `kind`, without a persistent cache.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - The path does not exist or is not a directory
    /// - An ignore pattern is malformed
    /// - The scan is interrupted by shutdown signal
    pub fn find_duplicates(
        &self,
        root: &Path,
        kind: KeyKind,
    ) -> Result<DuplicateScanResult, FinderError> {
        let mut store = ScanStore::new(self.config.store.clone());
        self.find_duplicates_in_store(&mut store, root, kind)
            .map(|(result, _)| result)
    }

    /// Refresh `store` for `root` and group the entries under `root`.
    ///
    /// The store's own settings are replaced by this finder's store settings
    /// for the refresh. Entries outside `root` are kept but not grouped.
    ///
    /// # Errors
    ///
    /// Same as [`DuplicateFinder::find_duplicates`].
    pub fn find_duplicates_in_store(
        &self,
        store: &mut ScanStore,
        root: &Path,
        kind: KeyKind,
    ) -> Result<(DuplicateScanResult, UpdateSummary), FinderError> {
        let metadata =
            std::fs::metadata(root).map_err(|_| FinderError::PathNotFound(root.to_path_buf()))?;
        if !metadata.is_dir() {
            return Err(FinderError::NotADirectory(root.to_path_buf()));
        }

        if self
            .config
            .store
            .shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
        {
            return Err(FinderError::Interrupted);
        }

        let filter = PathFilter::new(&self.config.ignore_patterns)?;
        log::info!(
            "Scanning {} by {} (ignoring {:?})",
            root.display(),
            kind,
            filter.patterns()
        );

        let taken = std::mem::take(store);
        *store = taken.with_config(self.config.store.clone());
        let summary = store.update(root, &filter, kind.requires_hash())?;

        let result = store.find_duplicates_within(root, kind);
        log::info!(
            "Found {} duplicate groups ({} redundant copies) among {} files",
            result.group_count(),
            result.duplicate_count(),
            result.scanned_files
        );

        Ok((result, summary))
    }
}

/// Scan `root` and group by `kind`, skipping entries matching `ignore_patterns`.
///
/// # Errors
///
/// See [`DuplicateFinder::find_duplicates`].
pub fn scan_duplicates<S: AsRef<str>>(
    root: &Path,
    kind: KeyKind,
    ignore_patterns: &[S],
) -> Result<DuplicateScanResult, FinderError> {
    let config = FinderConfig::default()
        .with_ignore_patterns(ignore_patterns.iter().map(|p| p.as_ref().to_string()));
    DuplicateFinder::new(config).find_duplicates(root, kind)
}
