//! Duplicate groups and scan results.
//!
//! # Overview
//!
//! Grouping collects file records under their [`EquivalenceKey`] and keeps
//! only keys shared by two or more files. The outcome is a
//! [`DuplicateScanResult`], which also records how many files were
//! considered and which [`KeyKind`] produced the keys.
//!
//! # Example
//!
//! ```
//! use dupscan::duplicates::{group_records, KeyKind};
//! use dupscan::scanner::{FileRecord, FileStat};
//! use std::path::PathBuf;
//!
//! let record = |path: &str, size: u64| FileRecord {
//!     name: PathBuf::from(path).file_name().unwrap().to_string_lossy().into_owned(),
//!     path: PathBuf::from(path),
//!     is_dir: false,
//!     is_file: true,
//!     is_symlink: false,
//!     stat: FileStat { size, ..FileStat::default() },
//! };
//!
//! let files = vec![record("/a/x.txt", 1), record("/b/x.txt", 1), record("/a/y.txt", 5)];
//! let result = group_records(files.iter().map(|r| (r, None)), KeyKind::Name, files.len());
//!
//! assert_eq!(result.scanned_files, 3);
//! assert_eq!(result.duplicate_count(), 1);
//! assert_eq!(result.duplicate_size(), 1);
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use super::key::{EquivalenceKey, KeyKind};
use crate::output::{self, OutputError, OutputFormat};
use crate::scanner::FileRecord;

/// Two or more files sharing one equivalence key.
///
/// Members keep the order in which grouping saw them; the first member is
/// the survivor during cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    files: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Create a group from its members, or `None` if fewer than two.
    #[must_use]
    pub fn new(files: Vec<FileRecord>) -> Option<Self> {
        (files.len() >= 2).then_some(Self { files })
    }

    /// Members in grouping order.
    #[must_use]
    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Always `false` for a constructed group; kept for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The member kept in place by the cleaner.
    #[must_use]
    pub fn survivor(&self) -> &FileRecord {
        &self.files[0]
    }

    /// Every member except the survivor.
    #[must_use]
    pub fn redundant(&self) -> &[FileRecord] {
        &self.files[1..]
    }

    /// Number of redundant copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Space reclaimable by removing all but the first member.
    ///
    /// Assumes every member has the size of the first one.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.survivor().stat.size * self.duplicate_count() as u64
    }

    /// Paths of all members in grouping order.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}

/// Outcome of one duplicate scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateScanResult {
    /// Groups keyed by their equivalence key, in key order
    pub groups: BTreeMap<EquivalenceKey, DuplicateGroup>,
    /// Files considered, duplicates or not
    pub scanned_files: usize,
    /// Key function that produced `groups`
    pub key_kind: KeyKind,
}

impl DuplicateScanResult {
    /// Build a result from candidate buckets, dropping singletons.
    #[must_use]
    pub fn from_candidates(
        candidates: BTreeMap<EquivalenceKey, Vec<FileRecord>>,
        scanned_files: usize,
        key_kind: KeyKind,
    ) -> Self {
        let groups = candidates
            .into_iter()
            .filter_map(|(key, files)| DuplicateGroup::new(files).map(|g| (key, g)))
            .collect();

        Self {
            groups,
            scanned_files,
            key_kind,
        }
    }

    /// Number of redundant copies across all groups.
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.groups.values().map(DuplicateGroup::duplicate_count).sum()
    }

    /// Bytes reclaimable if every group kept a single copy.
    #[must_use]
    pub fn duplicate_size(&self) -> u64 {
        self.groups.values().map(DuplicateGroup::wasted_space).sum()
    }

    /// Number of duplicate groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Whether no duplicates were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Group for a key, if that key has duplicates.
    #[must_use]
    pub fn get(&self, key: &EquivalenceKey) -> Option<&DuplicateGroup> {
        self.groups.get(key)
    }

    /// Drop the given paths from their groups.
    ///
    /// Groups left with fewer than two members are removed.
    pub fn forget_paths(&mut self, removed: &HashSet<PathBuf>) {
        if removed.is_empty() {
            return;
        }
        self.groups.retain(|_, group| {
            group.files.retain(|f| !removed.contains(&f.path));
            group.files.len() >= 2
        });
    }

    /// Render the result in the requested output format.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError`] if serialization fails.
    pub fn format(&self, format: OutputFormat) -> Result<String, OutputError> {
        output::render(self, format)
    }
}

/// Group records by the key `kind` derives from each record and its hash.
///
/// Records for which no key can be derived (content grouping without a
/// stored hash) are left out. `scanned_files` is reported unchanged.
pub fn group_records<'a, I>(items: I, kind: KeyKind, scanned_files: usize) -> DuplicateScanResult
where
    I: IntoIterator<Item = (&'a FileRecord, Option<&'a str>)>,
{
    let mut candidates: BTreeMap<EquivalenceKey, Vec<FileRecord>> = BTreeMap::new();

    for (record, hash) in items {
        match kind.key_from_parts(record, hash) {
            Some(key) => candidates.entry(key).or_default().push(record.clone()),
            None => log::debug!(
                "No {} key for {}, excluded from grouping",
                kind,
                record.path.display()
            ),
        }
    }

    DuplicateScanResult::from_candidates(candidates, scanned_files, kind)
}
