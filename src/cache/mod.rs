//! Scan store for incremental re-scans.
//!
//! This module keeps file metadata, and optionally content hashes, from a
//! previous scan so later scans can skip re-reading unchanged files.
//!
//! # Architecture
//!
//! * [`store`]: The path-keyed [`ScanStore`], its refresh logic and its
//!   JSON / bincode persistence.
//! * [`entry`]: The [`StoreEntry`] kept per file and its reuse rule.
//!
//! # Cache Invalidation
//!
//! An entry is reused when the freshly observed record equals the stored
//! one, i.e. the same:
//! * File path (primary key) and name
//! * File type flags
//! * File size
//! * Modification time (mtime)
//!
//! Inode is recorded but not compared. Entries under a scanned root that
//! the walk no longer finds are pruned.

pub mod entry;
pub mod store;

pub use entry::StoreEntry;
pub use store::{CacheFormat, ScanStore, StoreConfig, StoreError, UpdateSummary};
