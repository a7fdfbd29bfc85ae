//! Share records
//!
//! Directed shares grant one other user access to a path; public shares are
//! reached through an unguessable token. Both are looked up by a stable key and
//! re-validated after lookup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scope::CapabilitySet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShareKind {
    Directed { target_id: String },
    Public { token: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareRecord {
    pub id: String,
    pub owner_id: String,
    pub owner_username: String,
    pub kind: ShareKind,
    /// Absolute, normalized path relative to the owner's storage root
    pub stored_path: String,
    pub is_directory: bool,
    /// Canonical comma-separated capability list
    pub permissions: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ShareRecord {
    pub fn new(
        owner_id: &str,
        owner_username: &str,
        kind: ShareKind,
        stored_path: String,
        is_directory: bool,
        permissions: CapabilitySet,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            owner_username: owner_username.to_string(),
            kind,
            stored_path,
            is_directory,
            permissions: permissions.to_string(),
            expires_at,
            created_at: Utc::now(),
        }
    }

    /// Fresh public-link token
    pub fn new_token() -> String {
        Uuid::new_v4().simple().to_string()
    }

    pub fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::from_actions(crate::scope::capability::split_list(&self.permissions))
    }

    /// Expiry is checked at read time; expired records are not deleted eagerly.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    pub fn target_id(&self) -> Option<&str> {
        match &self.kind {
            ShareKind::Directed { target_id } => Some(target_id),
            ShareKind::Public { .. } => None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        match &self.kind {
            ShareKind::Public { token } => Some(token),
            ShareKind::Directed { .. } => None,
        }
    }
}
