//! Share operations
//!
//! Creating, revoking and opening directed and public shares, plus the file
//! operations a share holder may run against a resolved share path.

use chrono::{DateTime, Utc};
use log::{debug, info};
use std::path::PathBuf;

use crate::auth::{Principal, credentials};
use crate::error::{RecycleError, ShareError, StorageError};
use crate::recycle::RecycleService;
use crate::scope::capability::split_list;
use crate::scope::{Action, AppScope, CapabilitySet};
use crate::share::record::{ShareKind, ShareRecord};
use crate::share::resolver::{ResolvedSharePath, resolve_share_path};
use crate::share::store::ShareStore;
use crate::storage::operations::{self as storage, user_root};
use crate::storage::validation::{normalize_virtual_path, virtual_to_real_path};
use crate::storage::EntryInfo;

/// A share that passed lookup, expiry, ownership and permission checks
#[derive(Debug, Clone)]
pub struct OpenedShare {
    pub record: ShareRecord,
    pub path: ResolvedSharePath,
}

impl OpenedShare {
    pub fn is_root(&self) -> bool {
        self.path.target == self.path.root
    }
}

pub struct ShareService {
    store: ShareStore,
    storage_root: PathBuf,
}

impl ShareService {
    pub fn new(storage_root: PathBuf) -> Self {
        Self {
            store: ShareStore::new(),
            storage_root,
        }
    }

    pub fn store(&self) -> &ShareStore {
        &self.store
    }

    /// Shares `path` of the caller's storage with another user.
    pub async fn create_directed(
        &self,
        owner: &Principal,
        scope: &AppScope,
        path: &str,
        target_username: &str,
        permissions: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ShareRecord, ShareError> {
        let target_id = credentials::user_id_for(target_username)
            .ok_or_else(|| ShareError::NotFound(format!("user {}", target_username)))?;
        if target_id == owner.user_id {
            return Err(ShareError::InvalidRequest(
                "cannot share with yourself".into(),
            ));
        }

        let kind = ShareKind::Directed {
            target_id: target_id.to_string(),
        };
        self.create(owner, scope, path, kind, permissions, expires_at)
            .await
    }

    /// Publishes `path` behind a fresh link token.
    pub async fn create_public(
        &self,
        owner: &Principal,
        scope: &AppScope,
        path: &str,
        permissions: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ShareRecord, ShareError> {
        let kind = ShareKind::Public {
            token: ShareRecord::new_token(),
        };
        self.create(owner, scope, path, kind, permissions, expires_at)
            .await
    }

    async fn create(
        &self,
        owner: &Principal,
        scope: &AppScope,
        path: &str,
        kind: ShareKind,
        permissions: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ShareRecord, ShareError> {
        let stored_path = normalize_virtual_path(path);
        scope.require(&stored_path, &[Action::Read])?;

        let capabilities = CapabilitySet::from_actions(split_list(permissions));
        if capabilities.is_empty() {
            return Err(ShareError::InvalidRequest(format!(
                "no known permissions in '{}'",
                permissions
            )));
        }
        require_grantable(scope, &stored_path, &capabilities)?;

        if expires_at.is_some_and(|at| at <= Utc::now()) {
            return Err(ShareError::InvalidRequest("expiry is in the past".into()));
        }

        let real = virtual_to_real_path(&user_root(&self.storage_root, &owner.username), &stored_path);
        if !real.exists() {
            return Err(StorageError::NotFound(stored_path).into());
        }

        let record = ShareRecord::new(
            &owner.user_id,
            &owner.username,
            kind,
            stored_path,
            real.is_dir(),
            capabilities,
            expires_at,
        );

        info!(
            "User {} shared {} as {} ({})",
            owner.username, record.stored_path, record.id, record.permissions
        );
        self.store.insert(record.clone()).await;
        Ok(record)
    }

    /// Deletes a share; only its owner may revoke it, and only within the
    /// caller's app scope.
    pub async fn revoke(
        &self,
        owner: &Principal,
        scope: &AppScope,
        share_id: &str,
    ) -> Result<ShareRecord, ShareError> {
        match self.store.get(share_id).await {
            Some(record) if record.owner_id == owner.user_id => {
                scope.require(&record.stored_path, &[Action::Read])?;
                self.store.remove(share_id).await;
                info!("User {} revoked share {}", owner.username, share_id);
                Ok(record)
            }
            _ => Err(ShareError::NotFound(share_id.to_string())),
        }
    }

    /// Shares the caller owns on paths visible to its app scope
    pub async fn list_outgoing(&self, owner: &Principal, scope: &AppScope) -> Vec<ShareRecord> {
        self.store
            .list_by_owner(&owner.user_id)
            .await
            .into_iter()
            .filter(|share| scope.authorize(&share.stored_path, &[Action::Read]))
            .collect()
    }

    /// Unexpired shares directed at the caller and visible to its app scope
    pub async fn list_incoming(&self, caller: &Principal, scope: &AppScope) -> Vec<ShareRecord> {
        let now = Utc::now();
        self.store
            .list_by_target(&caller.user_id)
            .await
            .into_iter()
            .filter(|share| !share.is_expired(now))
            .filter(|share| scope.authorize(&share.stored_path, &[Action::Read]))
            .collect()
    }

    /// Opens a directed share for the caller.
    ///
    /// Unknown, expired and foreign shares all report `NotFound`. The caller's
    /// app scope must also grant `required` on the target in the owner's tree.
    pub async fn open_directed(
        &self,
        caller: &Principal,
        scope: &AppScope,
        share_id: &str,
        relative: &str,
        required: &[Action],
    ) -> Result<OpenedShare, ShareError> {
        let record = self
            .store
            .get(share_id)
            .await
            .filter(|share| share.target_id() == Some(caller.user_id.as_str()))
            .ok_or_else(|| ShareError::NotFound(share_id.to_string()))?;
        let opened = self.open(record, relative, required)?;
        scope.require(&opened.path.virtual_target, required)?;
        Ok(opened)
    }

    /// Opens a public share by its link token.
    pub async fn open_public(
        &self,
        token: &str,
        relative: &str,
        required: &[Action],
    ) -> Result<OpenedShare, ShareError> {
        let record = self
            .store
            .find_by_token(token)
            .await
            .ok_or_else(|| ShareError::NotFound("public link".into()))?;
        self.open(record, relative, required)
    }

    fn open(
        &self,
        record: ShareRecord,
        relative: &str,
        required: &[Action],
    ) -> Result<OpenedShare, ShareError> {
        if record.is_expired(Utc::now()) {
            debug!("Share {} has expired", record.id);
            return Err(ShareError::NotFound(record.id));
        }

        if !record.capabilities().allows_any(required) {
            let names: Vec<&str> = required.iter().map(|a| a.as_str()).collect();
            return Err(ShareError::PermissionDenied(names.join("|")));
        }

        let owner_root = user_root(&self.storage_root, &record.owner_username);
        let path = resolve_share_path(&owner_root, &record, relative)?;
        Ok(OpenedShare { record, path })
    }
}

/// Rejects permissions the app scope could not exercise itself on `path`.
fn require_grantable(
    scope: &AppScope,
    path: &str,
    capabilities: &CapabilitySet,
) -> Result<(), ShareError> {
    if !scope.is_active() {
        return Ok(());
    }
    for action in Action::ALL {
        if action != Action::Write && capabilities.allows(action) {
            scope.require(path, &[action])?;
        }
    }
    Ok(())
}

/// Lists a shared directory, or stats a shared file
pub fn list(opened: &OpenedShare) -> Result<Vec<EntryInfo>, ShareError> {
    if opened.path.target.is_dir() {
        Ok(storage::list_directory(&opened.path.target)?)
    } else {
        Ok(vec![storage::stat(&opened.path.target)?])
    }
}

pub fn read(opened: &OpenedShare) -> Result<Vec<u8>, ShareError> {
    Ok(storage::read_file(&opened.path.target)?)
}

/// Writes a file inside the share.
///
/// Replacing needs `update`, creating needs `create`.
pub fn write(opened: &OpenedShare, data: &[u8]) -> Result<bool, ShareError> {
    if opened.record.is_directory && opened.is_root() {
        return Err(StorageError::InvalidPath(opened.path.virtual_target.clone()).into());
    }

    let required = if opened.path.target.exists() {
        Action::Update
    } else {
        Action::Create
    };
    if !opened.record.capabilities().allows(required) {
        return Err(ShareError::PermissionDenied(required.to_string()));
    }

    Ok(storage::write_file(&opened.path.target, data)?)
}

pub fn mkdir(opened: &OpenedShare) -> Result<(), ShareError> {
    Ok(storage::make_collection(&opened.path.target)?)
}

/// Moves a shared entry into the owner's recycle bin.
///
/// The root of a directory share cannot be removed through the share.
pub async fn remove(opened: &OpenedShare, recycle: &RecycleService) -> Result<usize, ShareError> {
    if opened.record.is_directory && opened.is_root() {
        return Err(StorageError::InvalidPath(opened.path.virtual_target.clone()).into());
    }

    let records = recycle
        .soft_delete_owned(
            &opened.record.owner_id,
            &opened.record.owner_username,
            &opened.path.virtual_target,
        )
        .await
        .map_err(|e| match e {
            RecycleError::NotFound(p) => ShareError::Storage(StorageError::NotFound(p)),
            RecycleError::AlreadyExists(p) => ShareError::Storage(StorageError::AlreadyExists(p)),
            RecycleError::InvalidPath(p) => ShareError::Storage(StorageError::InvalidPath(p)),
            RecycleError::Scope(e) => ShareError::Scope(e),
            RecycleError::IoError(e) => ShareError::Storage(StorageError::IoError(e)),
        })?;
    Ok(records.len())
}
