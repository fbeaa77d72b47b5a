//! Human-oriented text renderings of a duplicate listing.
//!
//! [`pretty`] prints the key-to-paths mapping as a multi-line debug
//! structure. [`custom`] prints one block per key:
//!
//! ```text
//! aaa.txt:
//!     /data/aaa.txt
//!     /data/dir/aaa.txt
//!
//! ```

use std::fmt::{self, Write as _};

use crate::duplicates::DuplicateScanResult;

/// Indent used for member paths in the custom format.
pub const DEFAULT_INDENT: usize = 4;

struct PrettyListing<'a>(&'a DuplicateScanResult);

impl fmt::Debug for PrettyListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, group) in &self.0.groups {
            map.entry(&key.to_string(), &group.paths());
        }
        map.finish()
    }
}

/// Render as a pretty-printed map from key to member paths.
#[must_use]
pub fn pretty(result: &DuplicateScanResult) -> String {
    format!("{:#?}", PrettyListing(result))
}

/// Render one `key:` block per group with paths indented by `indent` spaces.
///
/// Each block ends with a blank line.
#[must_use]
pub fn custom(result: &DuplicateScanResult, indent: usize) -> String {
    let pad = " ".repeat(indent);
    let mut out = String::new();
    for (key, group) in &result.groups {
        let _ = writeln!(out, "{}:", key);
        for file in group.files() {
            let _ = writeln!(out, "{}{}", pad, file.path.display());
        }
        out.push('\n');
    }
    out
}
