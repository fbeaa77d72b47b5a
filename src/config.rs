//! User configuration file.
//!
//! Settings that apply to every scan live in `config.json` under the
//! platform config directory (e.g. `~/.config/dupscan/config.json`).
//! Every field is optional; command-line flags override them.
//!
//! ```json
//! {
//!   "ignore_patterns": [".*", "node_modules"],
//!   "io_threads": 8,
//!   "cache_format": "binary"
//! }
//! ```

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cache::CacheFormat;

/// Persistent defaults for scans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Replaces the built-in ignore patterns when set.
    pub ignore_patterns: Option<Vec<String>>,
    /// Hashing read block size in bytes.
    pub block_size: Option<usize>,
    /// Number of hashing threads.
    pub io_threads: Option<usize>,
    /// Cache format when the cache file extension does not decide it.
    pub cache_format: Option<CacheFormat>,
}

impl Config {
    /// Load from the default path, falling back to defaults on any error.
    pub fn load() -> Self {
        match Self::config_path().and_then(|path| Self::load_from(&path)) {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        }
    }

    /// Load from `path`; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Fails when the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Default platform-specific configuration path.
    ///
    /// # Errors
    ///
    /// Fails when no home directory can be determined.
    pub fn config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "dupscan")
            .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;
        Ok(project_dirs.config_dir().join("config.json"))
    }
}
