//! File actions module.
//!
//! This module provides duplicate cleanup:
//! - Permanent deletion, rename-aside backups, or the system trash
//! - Optional relative symlinks from each removed copy to the survivor
//! - TOCTOU verification to detect files modified since the scan
//!
//! ```no_run
//! use dupscan::actions::{clean_duplicates, CleanConfig, RemovalMode};
//! use dupscan::duplicates::{scan_duplicates, KeyKind};
//! use std::path::Path;
//!
//! let mut result = scan_duplicates(Path::new("/data"), KeyKind::ContentHash, &[".*"]).unwrap();
//! let config = CleanConfig::links().with_mode(RemovalMode::Trash);
//! let report = clean_duplicates(&mut result, &config).unwrap();
//! ```

pub mod clean;

// Re-export commonly used types
pub use clean::{
    clean_duplicates, CleanConfig, CleanError, CleanReport, CleanedFile, RemovalMode,
    DEFAULT_BACKUP_SUFFIX,
};
