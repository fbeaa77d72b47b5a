//! Path-keyed scan store with incremental refresh.
//!
//! # Overview
//!
//! [`ScanStore`] maps each absolute file path to a [`StoreEntry`]: the last
//! observed [`FileRecord`] and, when a content scan has run, its hash.
//! [`ScanStore::update`] walks a root, reuses entries whose record is
//! unchanged, hashes what is new or changed on a bounded rayon pool, and
//! prunes entries under the root that the walk no longer saw.
//!
//! Size and modification time stand in for "content unchanged". A file
//! rewritten with the same size and mtime keeps its stale hash; set
//! [`StoreConfig::force_rehash`] to re-read everything.
//!
//! # Example
//!
//! ```no_run
//! use dupscan::cache::{CacheFormat, ScanStore, StoreConfig};
//! use dupscan::duplicates::KeyKind;
//! use dupscan::scanner::PathFilter;
//! use std::path::Path;
//!
//! let mut store = ScanStore::new(StoreConfig::default());
//! let filter = PathFilter::default_patterns().unwrap();
//! store.update(Path::new("/data"), &filter, true).unwrap();
//! store.save(Path::new("/tmp/dupscan.json"), CacheFormat::Json).unwrap();
//!
//! let result = store.find_duplicates(KeyKind::ContentHash);
//! println!("{} redundant copies", result.duplicate_count());
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use bincode::Options;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::entry::StoreEntry;
use crate::duplicates::{group_records, DuplicateScanResult, KeyKind};
use crate::progress::ProgressCallback;
use crate::scanner::path_utils::{absolute, is_under};
use crate::scanner::{FileRecord, HashError, Hasher, PathFilter, Walker, WalkerConfig};

/// Serialization used for the persisted store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheFormat {
    /// JSON object mapping absolute path to entry
    #[default]
    Json,
    /// Compact bincode encoding of the same mapping
    Binary,
}

impl CacheFormat {
    /// Guess the format from a file extension (`.bin`, `.bincode`).
    #[must_use]
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Self::Json),
            "bin" | "bincode" => Some(Self::Binary),
            _ => None,
        }
    }
}

impl fmt::Display for CacheFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Binary => f.write_str("binary"),
        }
    }
}

impl FromStr for CacheFormat {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "binary" | "bin" | "bincode" => Ok(Self::Binary),
            other => Err(StoreError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Errors raised by the scan store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The scan root does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The cache file could not be decoded.
    #[error("Invalid cache file {path}: {reason}")]
    InvalidCache {
        /// Cache file that failed to load
        path: PathBuf,
        /// Decoder message
        reason: String,
    },

    /// Unknown cache serialization name.
    #[error("Unsupported cache format '{0}' (expected json or binary)")]
    UnsupportedFormat(String),

    /// An I/O error while reading or writing the cache file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Update stopped by a shutdown request; completed entries were kept.
    #[error("Scan interrupted by user")]
    Interrupted,
}

/// Settings for [`ScanStore::update`].
#[derive(Clone)]
pub struct StoreConfig {
    /// Ignore stored hashes and re-read every file when hashing.
    pub force_rehash: bool,
    /// Number of threads hashing in parallel.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Fixed read block size for hashing; `None` uses the platform default.
    pub block_size: Option<usize>,
    /// Traverse symlinked directories (symlinks are never stored).
    pub follow_symlinks: bool,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("force_rehash", &self.force_rehash)
            .field("io_threads", &self.io_threads)
            .field("block_size", &self.block_size)
            .field("follow_symlinks", &self.follow_symlinks)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            force_rehash: false,
            io_threads: 4,
            block_size: None,
            follow_symlinks: false,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl StoreConfig {
    /// Re-read content even when a stored hash matches.
    #[must_use]
    pub fn with_force_rehash(mut self, force: bool) -> Self {
        self.force_rehash = force;
        self
    }

    /// Set the number of hashing threads.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Use a fixed hashing block size.
    #[must_use]
    pub fn with_block_size(mut self, block_size: Option<usize>) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set whether symlinked directories are traversed.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn hasher(&self) -> Hasher {
        let mut hasher = Hasher::new();
        if let Some(size) = self.block_size {
            hasher = hasher.with_block_size(size);
        }
        if let Some(ref flag) = self.shutdown_flag {
            hasher = hasher.with_shutdown_flag(flag.clone());
        }
        hasher
    }
}

/// Counters from one [`ScanStore::update`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    /// Files seen by the walk
    pub observed: usize,
    /// Entries kept verbatim from the store
    pub reused: usize,
    /// Files whose content was hashed
    pub hashed: usize,
    /// Files that could not be hashed (kept without a hash)
    pub hash_failures: usize,
    /// Entries skipped because the walk could not read them
    pub walk_errors: usize,
    /// Stale entries removed from under the root
    pub pruned: usize,
}

impl UpdateSummary {
    /// Whether any entry failed to walk or hash.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.walk_errors > 0 || self.hash_failures > 0
    }
}

/// Persistent map from absolute path to [`StoreEntry`].
///
/// Entries iterate in path order. Directories and symlinks are never stored.
#[derive(Debug, Default)]
pub struct ScanStore {
    entries: BTreeMap<PathBuf, StoreEntry>,
    config: StoreConfig,
}

impl ScanStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self {
            entries: BTreeMap::new(),
            config,
        }
    }

    /// Replace the update settings, keeping the entries.
    #[must_use]
    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Current update settings.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry stored for an absolute path.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&StoreEntry> {
        self.entries.get(path)
    }

    /// All entries in path order.
    pub fn entries(&self) -> impl Iterator<Item = &StoreEntry> + '_ {
        self.entries.values()
    }

    /// Entries whose path lies under `root`, in path order.
    pub fn entries_under<'a>(&'a self, root: &'a Path) -> impl Iterator<Item = &'a StoreEntry> + 'a {
        self.entries
            .range(root.to_path_buf()..)
            .take_while(move |(path, _)| is_under(path, root))
            .map(|(_, entry)| entry)
    }

    /// Insert or replace an entry, keyed by its record's path.
    ///
    /// Only regular files are stored; other records are ignored.
    pub fn insert(&mut self, entry: StoreEntry) {
        if !entry.record.is_file || entry.record.is_dir || entry.record.is_symlink {
            log::debug!("Refusing to store non-file {}", entry.record.path.display());
            return;
        }
        self.entries.insert(entry.record.path.clone(), entry);
    }

    /// Remove the entry for one path, returning it.
    pub fn forget(&mut self, path: &Path) -> Option<StoreEntry> {
        self.entries.remove(path)
    }

    /// Remove every entry under `root`, or everything when `root` is `None`.
    ///
    /// Returns the number of entries removed.
    pub fn clean(&mut self, root: Option<&Path>) -> usize {
        let before = self.entries.len();
        match root {
            None => self.entries.clear(),
            Some(root) => {
                let root = absolute(root).unwrap_or_else(|_| root.to_path_buf());
                self.entries.retain(|path, _| !is_under(path, &root));
            }
        }
        before - self.entries.len()
    }

    /// Refresh the store from a walk of `root`.
    ///
    /// Unchanged entries are reused without reading content. New or changed
    /// files are hashed when `compute_hash` is set; a file that cannot be
    /// hashed is stored without a hash and counted in
    /// [`UpdateSummary::hash_failures`]. Entries under `root` that the walk
    /// did not see are pruned.
    ///
    /// # Errors
    ///
    /// - [`StoreError::PathNotFound`] if `root` does not exist
    /// - [`StoreError::Interrupted`] on shutdown; finished entries are kept
    ///   and nothing is pruned
    pub fn update(
        &mut self,
        root: &Path,
        filter: &PathFilter,
        compute_hash: bool,
    ) -> Result<UpdateSummary, StoreError> {
        let root = absolute(root).map_err(|e| StoreError::Io {
            path: root.to_path_buf(),
            source: e,
        })?;
        if fs::symlink_metadata(&root).is_err() {
            return Err(StoreError::PathNotFound(root));
        }

        log::info!(
            "Updating scan store for {} (hashing: {})",
            root.display(),
            compute_hash
        );

        let mut summary = UpdateSummary::default();
        let mut observed: HashSet<PathBuf> = HashSet::new();
        let mut fresh: Vec<StoreEntry> = Vec::new();
        let mut pending: Vec<FileRecord> = Vec::new();

        let walker_config = WalkerConfig::default().with_follow_symlinks(self.config.follow_symlinks);
        let mut walker = Walker::new(&root, walker_config, filter.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(flag.clone());
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("walking", 0);
        }

        for result in walker.walk() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    log::warn!("Skipping {}: {}", e.path().display(), e);
                    summary.walk_errors += 1;
                    continue;
                }
            };

            summary.observed += 1;
            if let Some(ref callback) = self.config.progress_callback {
                callback.on_progress(summary.observed, &record.path.to_string_lossy());
            }
            observed.insert(record.path.clone());

            match self.entries.get(&record.path) {
                Some(entry)
                    if entry.is_reusable_for(&record, compute_hash, self.config.force_rehash) =>
                {
                    log::trace!("Reusing stored entry for {}", record.path.display());
                    summary.reused += 1;
                }
                _ if compute_hash => pending.push(record),
                _ => fresh.push(StoreEntry::new(record)),
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("walking");
        }

        let hashed = self.hash_pending(pending);
        for (record, result) in hashed {
            match result {
                Ok(hash) => {
                    summary.hashed += 1;
                    fresh.push(StoreEntry::with_hash(record, hash));
                }
                Err(HashError::Interrupted(path)) => {
                    log::debug!("Hashing interrupted, not storing {}", path.display());
                }
                Err(e) => {
                    log::warn!("Could not hash {}: {}", record.path.display(), e);
                    summary.hash_failures += 1;
                    fresh.push(StoreEntry::new(record));
                }
            }
        }

        for entry in fresh {
            self.insert(entry);
        }

        if self.config.is_shutdown_requested() {
            log::warn!("Scan interrupted, stale entries under {} kept", root.display());
            return Err(StoreError::Interrupted);
        }

        let before = self.entries.len();
        self.entries
            .retain(|path, _| !is_under(path, &root) || observed.contains(path));
        summary.pruned = before - self.entries.len();

        log::info!(
            "Scan store updated: {} files, {} reused, {} hashed, {} pruned",
            summary.observed,
            summary.reused,
            summary.hashed,
            summary.pruned
        );

        Ok(summary)
    }

    /// Hash pending records on a bounded thread pool.
    fn hash_pending(&self, pending: Vec<FileRecord>) -> Vec<(FileRecord, Result<String, HashError>)> {
        if pending.is_empty() {
            return Vec::new();
        }

        log::info!("Hashing {} files", pending.len());
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("hashing", pending.len());
        }

        let hasher = self.config.hasher();
        let done = AtomicUsize::new(0);
        let hash_one = |record: FileRecord| {
            let result = hasher.content_hash(&record.path);
            if let Some(ref callback) = self.config.progress_callback {
                let current = done.fetch_add(1, Ordering::Relaxed) + 1;
                callback.on_progress(current, &record.path.to_string_lossy());
                callback.on_item_completed(record.stat.size);
            }
            (record, result)
        };

        let results: Vec<_> = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads)
            .build()
        {
            Ok(pool) => pool.install(|| pending.into_par_iter().map(hash_one).collect()),
            Err(e) => {
                log::warn!("Failed to create hashing thread pool ({}), hashing sequentially", e);
                pending.into_iter().map(hash_one).collect()
            }
        };

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("hashing");
        }
        results
    }

    /// Group every stored entry by `kind`, using stored metadata and hashes only.
    #[must_use]
    pub fn find_duplicates(&self, kind: KeyKind) -> DuplicateScanResult {
        group_records(
            self.entries
                .values()
                .map(|e| (&e.record, e.hash.as_deref())),
            kind,
            self.entries.len(),
        )
    }

    /// Group only the entries under `root`.
    #[must_use]
    pub fn find_duplicates_within(&self, root: &Path, kind: KeyKind) -> DuplicateScanResult {
        let root = absolute(root).unwrap_or_else(|_| root.to_path_buf());
        let entries: Vec<&StoreEntry> = self.entries_under(&root).collect();
        let scanned = entries.len();
        group_records(
            entries.into_iter().map(|e| (&e.record, e.hash.as_deref())),
            kind,
            scanned,
        )
    }

    /// Load a store from `path`, with default update settings.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be read and
    /// [`StoreError::InvalidCache`] if its content does not decode.
    pub fn load(path: &Path, format: CacheFormat) -> Result<Self, StoreError> {
        let bytes = fs::read(path).map_err(|e| StoreError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let invalid = |reason: String| StoreError::InvalidCache {
            path: path.to_path_buf(),
            reason,
        };

        let entries: BTreeMap<PathBuf, StoreEntry> = match format {
            CacheFormat::Json => serde_json::from_slice(&bytes).map_err(|e| invalid(e.to_string()))?,
            CacheFormat::Binary => bincode_options()
                .with_limit(bytes.len() as u64)
                .deserialize(&bytes)
                .map_err(|e| invalid(e.to_string()))?,
        };

        for (key, entry) in &entries {
            if *key != entry.record.path {
                return Err(invalid(format!(
                    "entry key {} does not match record path {}",
                    key.display(),
                    entry.record.path.display()
                )));
            }
            if !entry.record.is_file || entry.record.is_dir || entry.record.is_symlink {
                return Err(invalid(format!("non-file entry {}", key.display())));
            }
        }

        log::debug!(
            "Loaded {} cached entries from {} ({})",
            entries.len(),
            path.display(),
            format
        );

        Ok(Self {
            entries,
            config: StoreConfig::default(),
        })
    }

    /// Write the store to `path`.
    ///
    /// The file is written next to its destination and renamed into place.
    /// Entries whose path is not valid UTF-8 cannot be encoded and are left
    /// out with a warning; their count is returned.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] on any write failure.
    pub fn save(&self, path: &Path, format: CacheFormat) -> Result<usize, StoreError> {
        let io_err = |source: std::io::Error| StoreError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut tmp_name = path.as_os_str().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let mut skipped = 0;
        let encodable: BTreeMap<&PathBuf, &StoreEntry> = self
            .entries
            .iter()
            .filter(|(key, _)| {
                let ok = key.to_str().is_some();
                if !ok {
                    log::warn!("Not caching {}: path is not valid UTF-8", key.display());
                    skipped += 1;
                }
                ok
            })
            .collect();

        let file = File::create(&tmp_path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        let encoded = match format {
            CacheFormat::Json => serde_json::to_writer(&mut writer, &encodable)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
            CacheFormat::Binary => bincode_options()
                .serialize_into(&mut writer, &encodable)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
        };
        encoded.and_then(|()| writer.flush()).map_err(io_err)?;
        drop(writer);

        fs::rename(&tmp_path, path).map_err(io_err)?;
        log::debug!(
            "Saved {} cache entries to {} ({})",
            self.entries.len() - skipped,
            path.display(),
            format
        );
        Ok(skipped)
    }
}

fn bincode_options() -> impl Options {
    bincode::DefaultOptions::new().with_fixint_encoding()
}
