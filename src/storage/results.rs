//! Storage result types
//!
//! Defines result structures returned by storage operations.

use std::fmt;
use std::fs::Metadata;

/// One directory entry or stat result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    /// Modification time in seconds since the Unix epoch
    pub modified: u64,
}

impl EntryInfo {
    pub fn from_metadata(name: String, metadata: &Metadata) -> Self {
        let modified = metadata
            .modified()
            .ok()
            .and_then(|time| time.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|dur| dur.as_secs())
            .unwrap_or(0);

        Self {
            name,
            is_dir: metadata.is_dir(),
            size: if metadata.is_dir() { 0 } else { metadata.len() },
            modified,
        }
    }
}

/// Listing line format: "name|size|timestamp", directories end with '/'
impl fmt::Display for EntryInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slash = if self.is_dir { "/" } else { "" };
        write!(f, "{}{}|{}|{}", self.name, slash, self.size, self.modified)
    }
}
