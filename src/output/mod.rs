//! Output formatters for duplicate scan results.
//!
//! This module renders a [`DuplicateScanResult`] as:
//! - JSON for automation and scripting ([`json`])
//! - A pretty-printed debug structure or an indented text block ([`text`])
//!
//! Every format lists groups in sorted key order with member paths in
//! group order.
//!
//! # Example
//!
//! ```no_run
//! use dupscan::duplicates::{scan_duplicates, KeyKind};
//! use dupscan::output::OutputFormat;
//! use std::path::Path;
//!
//! let result = scan_duplicates(Path::new("."), KeyKind::Name, &[".*"]).unwrap();
//! println!("{}", result.format(OutputFormat::Json).unwrap());
//! ```

pub mod json;
pub mod text;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::duplicates::DuplicateScanResult;

// Re-export main types
pub use json::JsonListing;

/// Rendering of a duplicate listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON object mapping key to paths
    #[default]
    Json,
    /// Pretty-printed debug structure
    Pretty,
    /// `key:` followed by indented paths and a blank line
    Custom,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Custom => "custom",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "pprint" => Ok(Self::Pretty),
            "custom" => Ok(Self::Custom),
            _ => Err(OutputError::InvalidFormat(s.to_string())),
        }
    }
}

/// Errors that can occur while rendering a listing.
#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    /// Unknown format name
    #[error("Invalid output format '{0}' (expected json, pretty or custom)")]
    InvalidFormat(String),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Render `result` in `format`. No trailing newline is added.
///
/// # Errors
///
/// Returns [`OutputError::Json`] if JSON serialization fails.
pub fn render(result: &DuplicateScanResult, format: OutputFormat) -> Result<String, OutputError> {
    match format {
        OutputFormat::Json => Ok(JsonListing::new(result).to_json_pretty()?),
        OutputFormat::Pretty => Ok(text::pretty(result)),
        OutputFormat::Custom => Ok(text::custom(result, text::DEFAULT_INDENT)),
    }
}
