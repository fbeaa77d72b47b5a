//! Ignore-pattern matching for directory entries.
//!
//! A [`PathFilter`] compiles a set of shell-glob patterns once and is then
//! consulted for every entry name seen during a walk. Matching is done on
//! the entry's base name only, so a pattern such as `cache*` skips any
//! file or directory whose name starts with `cache`, at any depth.
//!
//! Patterns are plain fnmatch-style globs: `#` and `!` are literal
//! characters, and a pattern containing `/` can never match a base name.
//!
//! An empty pattern set produces a filter that matches nothing.

use globset::{Glob, GlobSet, GlobSetBuilder};

/// Patterns skipped when no other configuration is given:
/// hidden entries and anything named `cache*`.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[".*", "cache*"];

/// Errors raised while compiling ignore patterns.
#[derive(thiserror::Error, Debug)]
pub enum FilterError {
    /// A pattern could not be parsed as a glob.
    #[error("Invalid ignore pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Parser message
        message: String,
    },
}

/// Compiled matcher over entry names.
#[derive(Debug, Clone)]
pub struct PathFilter {
    matcher: GlobSet,
    patterns: Vec<String>,
}

impl PathFilter {
    /// Compile the given patterns into a single matcher.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidPattern`] for the first malformed pattern.
    pub fn new<I, S>(patterns: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        let mut kept = Vec::new();

        for pattern in patterns {
            let pattern = pattern.as_ref();
            let glob = Glob::new(pattern).map_err(|e| FilterError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.kind().to_string(),
            })?;
            builder.add(glob);
            kept.push(pattern.to_string());
        }

        let matcher = builder.build().map_err(|e| FilterError::InvalidPattern {
            pattern: kept.join(", "),
            message: e.to_string(),
        })?;

        log::debug!("Compiled {} ignore pattern(s): {:?}", kept.len(), kept);

        Ok(Self {
            matcher,
            patterns: kept,
        })
    }

    /// Filter built from [`DEFAULT_IGNORE_PATTERNS`].
    ///
    /// # Errors
    ///
    /// Only fails if the built-in patterns stop compiling.
    pub fn default_patterns() -> Result<Self, FilterError> {
        Self::new(DEFAULT_IGNORE_PATTERNS)
    }

    /// Filter that matches nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            matcher: GlobSet::empty(),
            patterns: Vec::new(),
        }
    }

    /// Whether an entry with this base name should be skipped.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        !name.is_empty() && self.matcher.is_match(name)
    }

    /// The source patterns, in the order given.
    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl Default for PathFilter {
    fn default() -> Self {
        Self::empty()
    }
}
