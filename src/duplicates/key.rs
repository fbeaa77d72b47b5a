//! Equivalence keys used to decide which files count as duplicates.
//!
//! Three interchangeable strategies are available, selected by [`KeyKind`]:
//!
//! | Kind | Key | Reads content |
//! |------|-----|---------------|
//! | [`KeyKind::Name`] | base name | no |
//! | [`KeyKind::NameAndSize`] | base name + size | no |
//! | [`KeyKind::ContentHash`] | BLAKE3 hex digest | yes |
//!
//! Every scan uses exactly one kind, and the kind travels with the result
//! so consumers know how to read its keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::scanner::{FileRecord, HashError, Hasher};

/// Which key function produced a scan result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    /// Files with the same base name
    #[default]
    Name,
    /// Files with the same base name and size
    NameAndSize,
    /// Files with identical content
    ContentHash,
}

impl KeyKind {
    /// Stable identifier used in logs and serialized output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::NameAndSize => "name_and_size",
            Self::ContentHash => "content_hash",
        }
    }

    /// Whether building this key needs the file content hash.
    #[must_use]
    pub fn requires_hash(self) -> bool {
        matches!(self, Self::ContentHash)
    }

    /// Derive a key from a record and an already computed content hash.
    ///
    /// Returns `None` for [`KeyKind::ContentHash`] when no hash is known;
    /// such a file cannot take part in content grouping.
    #[must_use]
    pub fn key_from_parts(self, record: &FileRecord, hash: Option<&str>) -> Option<EquivalenceKey> {
        match self {
            Self::Name => Some(name_key(record)),
            Self::NameAndSize => Some(name_and_size_key(record)),
            Self::ContentHash => hash.map(|h| EquivalenceKey::ContentHash(h.to_string())),
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognised key kind name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown key kind '{0}' (expected name, name_and_size or content_hash)")]
pub struct UnknownKeyKind(pub String);

impl FromStr for KeyKind {
    type Err = UnknownKeyKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "name" => Ok(Self::Name),
            "name_and_size" => Ok(Self::NameAndSize),
            "content_hash" | "hash" | "content" => Ok(Self::ContentHash),
            _ => Err(UnknownKeyKind(s.to_string())),
        }
    }
}

/// Value shared by all members of one duplicate group.
///
/// Keys of different kinds are never mixed within one result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EquivalenceKey {
    /// Base name
    Name(String),
    /// Base name and size in bytes
    NameAndSize(String, u64),
    /// Hex-encoded content digest
    ContentHash(String),
}

impl EquivalenceKey {
    /// Kind of key function that produces this key.
    #[must_use]
    pub fn kind(&self) -> KeyKind {
        match self {
            Self::Name(_) => KeyKind::Name,
            Self::NameAndSize(..) => KeyKind::NameAndSize,
            Self::ContentHash(_) => KeyKind::ContentHash,
        }
    }
}

impl fmt::Display for EquivalenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::NameAndSize(name, size) => write!(f, "{} ({} bytes)", name, size),
            Self::ContentHash(hash) => f.write_str(hash),
        }
    }
}

/// Key by base name.
#[must_use]
pub fn name_key(record: &FileRecord) -> EquivalenceKey {
    EquivalenceKey::Name(record.name.clone())
}

/// Key by base name and size.
#[must_use]
pub fn name_and_size_key(record: &FileRecord) -> EquivalenceKey {
    EquivalenceKey::NameAndSize(record.name.clone(), record.stat.size)
}

/// Key by content digest; reads the whole file.
///
/// # Errors
///
/// Returns [`HashError`] if the file cannot be opened or read.
pub fn content_key(record: &FileRecord, hasher: &Hasher) -> Result<EquivalenceKey, HashError> {
    hasher
        .content_hash(&record.path)
        .map(EquivalenceKey::ContentHash)
}
