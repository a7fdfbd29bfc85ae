//! Recycle record store
//!
//! In-memory repository keyed by content hash. Ownership is not part of the
//! key; callers check it after lookup.

use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::recycle::record::RecycleRecord;

#[derive(Debug, Default)]
pub struct RecycleStore {
    records: RwLock<HashMap<String, RecycleRecord>>,
}

impl RecycleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: RecycleRecord) {
        self.records
            .write()
            .await
            .insert(record.content_hash.clone(), record);
    }

    pub async fn get(&self, content_hash: &str) -> Option<RecycleRecord> {
        self.records.read().await.get(content_hash).cloned()
    }

    pub async fn remove(&self, content_hash: &str) -> Option<RecycleRecord> {
        self.records.write().await.remove(content_hash)
    }

    /// A user's records, newest deletion first
    pub async fn list_by_owner(&self, owner_id: &str) -> Vec<RecycleRecord> {
        let mut records: Vec<RecycleRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.deleted_at.cmp(&a.deleted_at));
        records
    }

    /// Records deleted at or before `cutoff`
    pub async fn list_deleted_before(
        &self,
        cutoff: chrono::DateTime<chrono::Utc>,
    ) -> Vec<RecycleRecord> {
        self.records
            .read()
            .await
            .values()
            .filter(|r| r.deleted_at <= cutoff)
            .cloned()
            .collect()
    }
}
