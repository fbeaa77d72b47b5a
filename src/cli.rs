//! Command-line interface definitions for dupscan.
//!
//! This module defines all CLI arguments and options using the clap derive API.
//! The value enums here map onto the library types in [`crate::duplicates`],
//! [`crate::output`] and [`crate::cache`].
//!
//! # Example
//!
//! ```bash
//! # Count files sharing a name
//! dupscan ~/Downloads
//!
//! # Content duplicates, with reclaimable size and a JSON listing
//! dupscan -k content-hash -s -l ~/Downloads
//!
//! # Incremental scans with a cache, then replace copies with symlinks
//! dupscan -k content-hash -c ~/.dupscan.json --clean --links ~/Downloads
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::actions::{CleanConfig, RemovalMode};
use crate::cache::CacheFormat;
use crate::duplicates::KeyKind;
use crate::output::OutputFormat;

/// Find duplicate files in a directory tree.
///
/// Files are grouped by name, by name and size, or by content hash (BLAKE3).
/// Redundant copies can be removed or replaced with relative symlinks to a
/// single kept copy.
#[derive(Debug, Parser)]
#[command(name = "dupscan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Root directory to scan
    #[arg(value_name = "DATAROOT")]
    pub dataroot: PathBuf,

    /// Equivalence key used to decide which files are duplicates
    #[arg(short, long, value_enum, default_value = "name")]
    pub key: KeyArg,

    /// Report the space taken by redundant copies
    #[arg(short = 's', long)]
    pub compute_size: bool,

    /// List every duplicate group
    #[arg(short = 'l', long)]
    pub list_files: bool,

    /// Listing format; implies --list-files
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub format: Option<FormatArg>,

    /// Write the listing to a file instead of stdout; implies --list-files
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Remove redundant copies, keeping the first file of each group
    #[arg(long)]
    pub clean: bool,

    /// Replace removed copies with relative symlinks to the kept file
    #[arg(long, requires = "clean")]
    pub links: bool,

    /// Rename removed copies with a "_bak" suffix instead of deleting them
    #[arg(long, requires = "clean", conflicts_with = "trash")]
    pub backup: bool,

    /// Move removed copies to the system trash instead of deleting them
    #[arg(long, requires = "clean")]
    pub trash: bool,

    /// Scan cache file, loaded before and saved after the scan
    #[arg(short, long, value_name = "FILE")]
    pub cache: Option<PathBuf>,

    /// Cache serialization (default: from config, else json)
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub cache_format: Option<CacheFormatArg>,

    /// Ignore cached hashes and re-read every file
    #[arg(long)]
    pub rehash: bool,

    /// Drop cached entries under DATAROOT before scanning
    #[arg(long, requires = "cache")]
    pub clear_cache: bool,

    /// Glob patterns to ignore (can be specified multiple times)
    ///
    /// Replaces the configured patterns (default: ".*" and "cache*").
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Do not apply any ignore pattern unless given with --ignore
    #[arg(long)]
    pub no_default_ignores: bool,

    /// Read block size for hashing (e.g., 8KiB, 1MiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub block_size: Option<u64>,

    /// Number of I/O threads for hashing (default: 4)
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Print errors as JSON documents on stderr
    #[arg(long)]
    pub json_errors: bool,
}

impl Cli {
    /// Whether the duplicate listing should be produced.
    #[must_use]
    pub fn wants_listing(&self) -> bool {
        self.list_files || self.format.is_some() || self.output.is_some()
    }

    /// Listing format, defaulting to JSON.
    #[must_use]
    pub fn output_format(&self) -> OutputFormat {
        self.format.map(Into::into).unwrap_or_default()
    }

    /// Cleanup settings derived from the flags.
    #[must_use]
    pub fn clean_config(&self) -> CleanConfig {
        let mode = if self.backup {
            RemovalMode::Backup
        } else if self.trash {
            RemovalMode::Trash
        } else {
            RemovalMode::Delete
        };
        CleanConfig::default()
            .with_links(self.links)
            .with_mode(mode)
    }
}

/// Key function choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeyArg {
    /// Same base name
    Name,
    /// Same base name and size
    #[value(alias = "name_and_size")]
    NameAndSize,
    /// Same content
    #[value(alias = "content_hash", alias = "hash")]
    ContentHash,
}

impl From<KeyArg> for KeyKind {
    fn from(arg: KeyArg) -> Self {
        match arg {
            KeyArg::Name => KeyKind::Name,
            KeyArg::NameAndSize => KeyKind::NameAndSize,
            KeyArg::ContentHash => KeyKind::ContentHash,
        }
    }
}

/// Listing format choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// JSON object of key to paths
    Json,
    /// Pretty-printed structure
    #[value(alias = "pprint")]
    Pretty,
    /// Indented text blocks
    Custom,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Pretty => OutputFormat::Pretty,
            FormatArg::Custom => OutputFormat::Custom,
        }
    }
}

/// Cache serialization choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheFormatArg {
    /// JSON text
    Json,
    /// Compact binary (bincode)
    Binary,
}

impl From<CacheFormatArg> for CacheFormat {
    fn from(arg: CacheFormatArg) -> Self {
        match arg {
            CacheFormatArg::Json => CacheFormat::Json,
            CacheFormatArg::Binary => CacheFormat::Binary,
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use dupscan::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("8KiB").unwrap(), 8192);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    // Find where the number ends and the suffix begins
    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
