//! dupscan - duplicate file finder with an incremental scan cache.
//!
//! dupscan walks a directory tree, groups files by a key function (base
//! name, name and size, or content hash) and reports every group with more
//! than one member. Scan results can be kept in a cache file so that
//! unchanged files are not hashed again, and redundant copies can be
//! replaced by relative symlinks, deleted, or renamed aside.
//!
//! # Library use
//!
//! ```rust,no_run
//! use dupscan::duplicates::{DuplicateFinder, KeyKind};
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let result = finder.find_duplicates(Path::new("/data"), KeyKind::ContentHash)?;
//! println!("{} duplicate files", result.duplicate_count());
//! # Ok::<(), dupscan::duplicates::FinderError>(())
//! ```

pub mod actions;
pub mod cache;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use bytesize::ByteSize;

use crate::actions::clean_duplicates;
use crate::cache::{CacheFormat, ScanStore, StoreConfig, StoreError};
use crate::cli::Cli;
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, FinderConfig, KeyKind};
use crate::error::ExitCode;
use crate::progress::Progress;
use crate::scanner::path_utils::absolute;
use crate::scanner::DEFAULT_IGNORE_PATTERNS;

/// Run the command line application with the user's config file.
///
/// # Errors
///
/// Returns an error for fatal failures: a missing root, a malformed ignore
/// pattern, an unwritable output file, or an interrupted scan. A cache that
/// cannot be saved only downgrades the exit code to partial success.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    run_with_config(cli, Config::load())
}

/// Run the command line application with an explicit configuration.
///
/// # Errors
///
/// Same as [`run_app`].
pub fn run_with_config(cli: Cli, config: Config) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let handler = signal::install_handler()?;
    let root = absolute(&cli.dataroot)
        .with_context(|| format!("resolving {}", cli.dataroot.display()))?;
    let kind: KeyKind = cli.key.into();

    let mut store_config = StoreConfig::default()
        .with_force_rehash(cli.rehash)
        .with_block_size(
            cli.block_size
                .map(|b| usize::try_from(b).unwrap_or(usize::MAX))
                .or(config.block_size),
        )
        .with_shutdown_flag(handler.get_flag());
    if let Some(threads) = cli.io_threads.or(config.io_threads) {
        store_config = store_config.with_io_threads(threads);
    }
    if !cli.quiet && !cli.no_progress {
        store_config = store_config.with_progress_callback(Arc::new(Progress::new(false)));
    }

    let finder = DuplicateFinder::new(
        FinderConfig::default()
            .with_ignore_patterns(ignore_patterns(&cli, &config))
            .with_store_config(store_config),
    );

    let cache = cli
        .cache
        .as_ref()
        .map(|path| (path.clone(), cache_format(&cli, &config, path)));
    let mut store = match &cache {
        Some((path, format)) => open_cache(path, *format),
        None => ScanStore::default(),
    };
    if cli.clear_cache {
        let removed = store.clean(Some(&root));
        log::info!("Cleared {} cached entries under {}", removed, root.display());
    }

    let scan = finder.find_duplicates_in_store(&mut store, &root, kind);
    // Interrupted scans still persist the entries that were finished.
    let cache_saved = cache
        .as_ref()
        .map_or(true, |(path, format)| save_cache(&store, path, *format));
    let (mut result, summary) = scan?;

    let mut exit = if summary.has_errors() {
        log::warn!(
            "{} paths could not be read and {} files could not be hashed",
            summary.walk_errors,
            summary.hash_failures
        );
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    };
    if !cache_saved {
        exit = ExitCode::PartialSuccess;
    }

    log::info!("{} duplicate files found", result.duplicate_count());
    if cli.compute_size {
        log::info!(
            "Size of duplicate files: {}",
            ByteSize::b(result.duplicate_size())
        );
    }

    if cli.wants_listing() && result.duplicate_count() > 0 {
        let mut listing = result.format(cli.output_format())?;
        if !listing.ends_with('\n') {
            listing.push('\n');
        }
        write_listing(cli.output.as_deref(), &listing)?;
    }

    if cli.clean {
        let report = clean_duplicates(&mut result, &cli.clean_config())?;
        if !report.all_succeeded() {
            exit = ExitCode::PartialSuccess;
        }

        if let Some((path, format)) = &cache {
            if report.removed_count() > 0 {
                let removed: HashSet<PathBuf> =
                    report.removed.iter().map(|f| f.path.clone()).collect();
                for path in &removed {
                    store.forget(path);
                }
                if !save_cache(&store, path, *format) {
                    exit = ExitCode::PartialSuccess;
                }
            }
        }
    }

    Ok(exit)
}

/// Ignore patterns: config file replaces the defaults, `-i` replaces both.
fn ignore_patterns(cli: &Cli, config: &Config) -> Vec<String> {
    if cli.no_default_ignores {
        return cli.ignore_patterns.clone();
    }
    if !cli.ignore_patterns.is_empty() {
        return cli.ignore_patterns.clone();
    }
    config.ignore_patterns.clone().unwrap_or_else(|| {
        DEFAULT_IGNORE_PATTERNS
            .iter()
            .map(|p| (*p).to_string())
            .collect()
    })
}

fn cache_format(cli: &Cli, config: &Config, path: &Path) -> CacheFormat {
    cli.cache_format
        .map(Into::into)
        .or_else(|| CacheFormat::from_extension(path))
        .or(config.cache_format)
        .unwrap_or_default()
}

/// Load the cache, starting empty when it is missing or unreadable.
fn open_cache(path: &Path, format: CacheFormat) -> ScanStore {
    if !path.exists() {
        log::debug!("No cache at {}, starting empty", path.display());
        return ScanStore::default();
    }
    match ScanStore::load(path, format) {
        Ok(store) => {
            log::debug!("Loaded {} cached entries from {}", store.len(), path.display());
            store
        }
        Err(e @ StoreError::InvalidCache { .. }) => {
            log::warn!("{}; starting with an empty cache", e);
            ScanStore::default()
        }
        Err(e) => {
            log::warn!("Could not read cache: {}; starting with an empty cache", e);
            ScanStore::default()
        }
    }
}

/// Persist the store; a failure is reported and the run carries on.
fn save_cache(store: &ScanStore, path: &Path, format: CacheFormat) -> bool {
    match store.save(path, format) {
        Ok(0) => true,
        Ok(skipped) => {
            log::warn!("{} entries were left out of cache {}", skipped, path.display());
            true
        }
        Err(e) => {
            log::warn!("Could not save cache: {}", e);
            false
        }
    }
}

fn write_listing(output: Option<&Path>, listing: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, listing)
            .with_context(|| format!("writing listing to {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(listing.as_bytes())
                .and_then(|()| stdout.flush())
                .context("writing listing to stdout")
        }
    }
}
