//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Equivalence keys by name, name and size, or content hash
//! - Grouping records by key and dropping singletons
//! - Scan orchestration over the walker and the scan store

pub mod finder;
pub mod groups;
pub mod key;

// Re-export main types
pub use finder::{scan_duplicates, DuplicateFinder, FinderConfig, FinderError};
pub use groups::{group_records, DuplicateGroup, DuplicateScanResult};
pub use key::{
    content_key, name_and_size_key, name_key, EquivalenceKey, KeyKind, UnknownKeyKind,
};
