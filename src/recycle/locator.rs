//! Recycle blob locator
//!
//! Finds the blob behind a recycle record. Current blobs are named
//! `{hash}_{name}` and found with a single probe; older blobs carry a
//! `{username}_{directory}_{name}_{timestamp}` name and are found by scanning
//! the recycle directory, picking the candidate whose modification time is
//! closest to the recorded deletion time. Never modifies anything.

use chrono::{DateTime, Utc};
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::recycle::record::RecycleRecord;

/// Outcome of a lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    Found(PathBuf),
    NotFound,
}

#[derive(Debug, Clone)]
pub struct RecycleLocator {
    recycle_dir: PathBuf,
}

impl RecycleLocator {
    pub fn new(recycle_dir: PathBuf) -> Self {
        Self { recycle_dir }
    }

    pub fn recycle_dir(&self) -> &Path {
        &self.recycle_dir
    }

    /// Where a blob for `record` is stored under the current naming.
    pub fn primary_path(&self, record: &RecycleRecord) -> PathBuf {
        self.recycle_dir.join(record.blob_name())
    }

    pub fn locate(&self, record: &RecycleRecord) -> io::Result<Located> {
        let primary = self.primary_path(record);
        if primary.is_file() {
            return Ok(Located::Found(primary));
        }
        self.locate_legacy(record)
    }

    fn locate_legacy(&self, record: &RecycleRecord) -> io::Result<Located> {
        let entries = match fs::read_dir(&self.recycle_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Located::NotFound),
            Err(e) => return Err(e),
        };

        let prefix = record.legacy_prefix();
        let mut best: Option<(u64, PathBuf)> = None;

        for entry in entries {
            let entry = entry?;
            if !entry.file_name().to_string_lossy().starts_with(&prefix) {
                continue;
            }
            let metadata = match entry.metadata() {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };

            let distance = metadata
                .modified()
                .map(|mtime| distance_millis(DateTime::<Utc>::from(mtime), record.deleted_at))
                .unwrap_or(u64::MAX);

            // Strict comparison: the first candidate scanned wins exact ties.
            if best.as_ref().is_none_or(|(d, _)| distance < *d) {
                best = Some((distance, entry.path()));
            }
        }

        match best {
            Some((distance, path)) => {
                debug!(
                    "Located legacy blob {} for {} ({} ms from deletion)",
                    path.display(),
                    record.content_hash,
                    distance
                );
                Ok(Located::Found(path))
            }
            None => Ok(Located::NotFound),
        }
    }
}

fn distance_millis(a: DateTime<Utc>, b: DateTime<Utc>) -> u64 {
    a.signed_duration_since(b).num_milliseconds().unsigned_abs()
}
