//! Scan store entry definitions.

use serde::{Deserialize, Serialize};

use crate::scanner::{FileRecord, FileStat};

/// One stored file: its last observed record and, optionally, its content hash.
///
/// The persisted form is flat (`name`, `path`, type flags, `stat`, `hash`)
/// and identical for the JSON and binary cache formats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "PersistedEntry", from = "PersistedEntry")]
pub struct StoreEntry {
    /// Record observed by the most recent walk that saw this path
    pub record: FileRecord,
    /// Hex content digest, if one was computed for this record
    pub hash: Option<String>,
}

impl StoreEntry {
    /// Entry without a content hash.
    #[must_use]
    pub fn new(record: FileRecord) -> Self {
        Self { record, hash: None }
    }

    /// Entry carrying a computed content hash.
    #[must_use]
    pub fn with_hash(record: FileRecord, hash: String) -> Self {
        Self {
            record,
            hash: Some(hash),
        }
    }

    /// Whether this entry can be reused for a freshly observed record.
    ///
    /// The record must be equal (same name, path, type, size and mtime).
    /// When a hash is needed, the entry must already carry one and
    /// `force_rehash` must be off.
    #[must_use]
    pub fn is_reusable_for(&self, observed: &FileRecord, need_hash: bool, force_rehash: bool) -> bool {
        if self.record != *observed {
            return false;
        }
        !need_hash || (self.hash.is_some() && !force_rehash)
    }
}

#[derive(Serialize, Deserialize)]
struct PersistedEntry {
    name: String,
    path: std::path::PathBuf,
    is_dir: bool,
    is_file: bool,
    is_symlink: bool,
    stat: FileStat,
    hash: Option<String>,
}

impl From<StoreEntry> for PersistedEntry {
    fn from(entry: StoreEntry) -> Self {
        let FileRecord {
            name,
            path,
            is_dir,
            is_file,
            is_symlink,
            stat,
        } = entry.record;
        Self {
            name,
            path,
            is_dir,
            is_file,
            is_symlink,
            stat,
            hash: entry.hash,
        }
    }
}

impl From<PersistedEntry> for StoreEntry {
    fn from(p: PersistedEntry) -> Self {
        Self {
            record: FileRecord {
                name: p.name,
                path: p.path,
                is_dir: p.is_dir,
                is_file: p.is_file,
                is_symlink: p.is_symlink,
                stat: p.stat,
            },
            hash: p.hash,
        }
    }
}
