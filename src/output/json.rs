//! JSON output formatter for duplicate scan results.
//!
//! Provides machine-readable JSON output for scripting and automation.
//!
//! # Output Schema
//!
//! One object whose keys are the stringified equivalence keys, in sorted
//! key order, and whose values are the member paths of each group:
//!
//! ```json
//! {
//!   "aaa.txt": [
//!     "/data/aaa.txt",
//!     "/data/dir/aaa.txt"
//!   ],
//!   "ccc.txt (3 bytes)": [
//!     "/data/ccc.txt",
//!     "/data/dir/ccc.txt"
//!   ]
//! }
//! ```
//!
//! Name-and-size keys are written as `"<name> (<size> bytes)"` and content
//! keys as the hex digest.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::duplicates::DuplicateScanResult;

/// Serializable view of a scan result's groups.
#[derive(Debug, Clone, Copy)]
pub struct JsonListing<'a> {
    result: &'a DuplicateScanResult,
}

impl<'a> JsonListing<'a> {
    /// Wrap a scan result for serialization.
    #[must_use]
    pub fn new(result: &'a DuplicateScanResult) -> Self {
        Self { result }
    }

    /// Serialize to JSON with two-space indentation.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for JsonListing<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.result.groups.len()))?;
        for (key, group) in &self.result.groups {
            let paths: Vec<String> = group
                .files()
                .iter()
                .map(|f| f.path.to_string_lossy().into_owned())
                .collect();
            map.serialize_entry(&key.to_string(), &paths)?;
        }
        map.end()
    }
}
