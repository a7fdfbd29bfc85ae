//! Recycle records
//!
//! One record per soft-deleted file. The content hash is fixed when the record
//! is created and names the blob on disk; it is never recomputed from file
//! contents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::storage::validation::{normalize_virtual_path, split_virtual_path};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecycleRecord {
    pub content_hash: String,
    pub owner_id: String,
    pub owner_username: String,
    /// Parent directory of the deleted file, e.g. `/docs` or `/`
    pub original_directory: String,
    pub original_name: String,
    /// Path of the deleted file relative to the owner's storage root
    pub original_relative_path: String,
    pub size_bytes: u64,
    pub deleted_at: DateTime<Utc>,
}

impl RecycleRecord {
    pub fn new(
        owner_id: &str,
        owner_username: &str,
        original_relative_path: &str,
        size_bytes: u64,
        deleted_at: DateTime<Utc>,
    ) -> Self {
        let original_relative_path = normalize_virtual_path(original_relative_path);
        let (original_directory, original_name) = split_virtual_path(&original_relative_path);
        let content_hash = content_hash(
            owner_id,
            &original_relative_path,
            deleted_at,
            &Uuid::new_v4(),
        );

        Self {
            content_hash,
            owner_id: owner_id.to_string(),
            owner_username: owner_username.to_string(),
            original_directory,
            original_name,
            original_relative_path,
            size_bytes,
            deleted_at,
        }
    }

    /// Current on-disk name: `{hash}_{name}`
    pub fn blob_name(&self) -> String {
        format!("{}_{}", self.content_hash, self.original_name)
    }

    /// Name prefix of blobs written before hash naming:
    /// `{username}_{directory}_{name}_`, directory separators flattened to `_`.
    pub fn legacy_prefix(&self) -> String {
        let directory = self
            .original_directory
            .trim_start_matches('/')
            .replace('/', "_");
        format!(
            "{}_{}_{}_",
            self.owner_username, directory, self.original_name
        )
    }
}

/// SHA-256 over the owner, the path, the deletion time and a fresh nonce.
///
/// The nonce keeps two deletions of the same path at the same instant apart;
/// the recycle directory is shared by every tenant.
pub fn content_hash(
    owner_id: &str,
    relative_path: &str,
    deleted_at: DateTime<Utc>,
    nonce: &Uuid,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(owner_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(relative_path.as_bytes());
    hasher.update([0u8]);
    hasher.update(deleted_at.timestamp_nanos_opt().unwrap_or_default().to_be_bytes());
    hasher.update(nonce.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_fields() {
        let record = RecycleRecord::new("1001", "alice", "docs/2024/report.pdf", 42, Utc::now());
        assert_eq!(record.original_relative_path, "/docs/2024/report.pdf");
        assert_eq!(record.original_directory, "/docs/2024");
        assert_eq!(record.original_name, "report.pdf");
        assert_eq!(record.content_hash.len(), 64);
        assert_eq!(
            record.blob_name(),
            format!("{}_report.pdf", record.content_hash)
        );
        assert_eq!(record.legacy_prefix(), "alice_docs_2024_report.pdf_");
    }

    #[test]
    fn test_root_directory_legacy_prefix() {
        let record = RecycleRecord::new("1001", "alice", "/a.txt", 1, Utc::now());
        assert_eq!(record.original_directory, "/");
        assert_eq!(record.legacy_prefix(), "alice__a.txt_");
    }

    #[test]
    fn test_same_path_same_instant_gets_distinct_hashes() {
        let now = Utc::now();
        let a = RecycleRecord::new("1001", "alice", "/a.txt", 1, now);
        let b = RecycleRecord::new("1001", "alice", "/a.txt", 1, now);
        assert_ne!(a.content_hash, b.content_hash);
    }

    #[test]
    fn test_content_hash_is_deterministic_for_fixed_inputs() {
        let now = Utc::now();
        let nonce = Uuid::new_v4();
        assert_eq!(
            content_hash("1", "/a", now, &nonce),
            content_hash("1", "/a", now, &nonce)
        );
        assert_ne!(
            content_hash("1", "/a", now, &nonce),
            content_hash("2", "/a", now, &nonce)
        );
    }
}
