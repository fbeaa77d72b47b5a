//! BLAKE3 file hasher with streaming support.
//!
//! # Overview
//!
//! [`Hasher`] reads a file in fixed-size blocks and feeds each block into an
//! incremental BLAKE3 hasher, so memory use is bounded by the block size no
//! matter how large the file is. The digest is returned as a lowercase hex
//! string, which is also the form stored in the scan cache.
//!
//! Collision resistance is not a security requirement here; a collision
//! would only produce a false duplicate.
//!
//! # Example
//!
//! ```no_run
//! use dupscan::scanner::Hasher;
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let digest = hasher.content_hash(Path::new("Cargo.toml")).unwrap();
//! assert_eq!(digest.len(), 64);
//! ```

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use super::HashError;

/// Block size used when the platform reports no preferred I/O size.
pub const DEFAULT_BLOCK_SIZE: usize = 8 * 1024;

/// Streaming content hasher.
#[derive(Debug, Default)]
pub struct Hasher {
    /// Fixed read size; `None` uses the file's preferred I/O block size.
    block_size: Option<usize>,
    /// Optional shutdown flag checked between blocks
    shutdown_flag: Option<Arc<AtomicBool>>,
    /// Number of files fully read by this hasher
    files_hashed: AtomicUsize,
}

impl Hasher {
    /// Create a hasher that reads in the platform's preferred block size.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed block size for every file.
    #[must_use]
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = Some(block_size.max(1));
        self
    }

    /// Set the shutdown flag; hashing stops at the next block boundary.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Number of files whose content this hasher has read to the end.
    #[must_use]
    pub fn files_hashed(&self) -> usize {
        self.files_hashed.load(Ordering::Relaxed)
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn block_size_for(&self, file: &File) -> usize {
        if let Some(size) = self.block_size {
            return size;
        }
        preferred_block_size(file).unwrap_or(DEFAULT_BLOCK_SIZE)
    }

    /// Compute the hex-encoded BLAKE3 digest of a file's content.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened, a read fails
    /// partway, or shutdown is requested mid-file.
    pub fn content_hash(&self, path: &Path) -> Result<String, HashError> {
        log::debug!("Computing content hash of {}", path.display());

        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let mut buffer = vec![0u8; self.block_size_for(&file)];
        let mut hasher = blake3::Hasher::new();

        loop {
            if self.is_shutdown_requested() {
                return Err(HashError::Interrupted(path.to_path_buf()));
            }
            match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => {
                    hasher.update(&buffer[..n]);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            }
        }

        self.files_hashed.fetch_add(1, Ordering::Relaxed);
        Ok(hasher.finalize().to_hex().to_string())
    }
}

#[cfg(unix)]
fn preferred_block_size(file: &File) -> Option<usize> {
    use std::os::unix::fs::MetadataExt;
    let blksize = file.metadata().ok()?.blksize();
    usize::try_from(blksize).ok().filter(|&b| b > 0)
}

#[cfg(not(unix))]
fn preferred_block_size(_file: &File) -> Option<usize> {
    None
}
