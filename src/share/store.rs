//! Share store
//!
//! In-memory share repository keyed by share id, with a lookup by public token.

use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::share::record::ShareRecord;

#[derive(Debug, Default)]
pub struct ShareStore {
    shares: RwLock<HashMap<String, ShareRecord>>,
}

impl ShareStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: ShareRecord) {
        self.shares.write().await.insert(record.id.clone(), record);
    }

    pub async fn get(&self, id: &str) -> Option<ShareRecord> {
        self.shares.read().await.get(id).cloned()
    }

    pub async fn find_by_token(&self, token: &str) -> Option<ShareRecord> {
        self.shares
            .read()
            .await
            .values()
            .find(|share| share.token() == Some(token))
            .cloned()
    }

    pub async fn remove(&self, id: &str) -> Option<ShareRecord> {
        self.shares.write().await.remove(id)
    }

    pub async fn list_by_owner(&self, owner_id: &str) -> Vec<ShareRecord> {
        let mut shares: Vec<ShareRecord> = self
            .shares
            .read()
            .await
            .values()
            .filter(|share| share.owner_id == owner_id)
            .cloned()
            .collect();
        shares.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        shares
    }

    pub async fn list_by_target(&self, target_id: &str) -> Vec<ShareRecord> {
        let mut shares: Vec<ShareRecord> = self
            .shares
            .read()
            .await
            .values()
            .filter(|share| share.target_id() == Some(target_id))
            .cloned()
            .collect();
        shares.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        shares
    }
}
