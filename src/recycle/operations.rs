//! Recycle bin operations
//!
//! Soft delete, listing, recovery, permanent delete, bulk clear and the
//! retention sweep. Every lookup is by content hash; ownership is checked on
//! the record afterwards and a foreign record looks exactly like a missing one.
//!
//! Two concurrent operations on the same record race on the filesystem: the
//! rename or remove that lands first wins and the other reports `NotFound`.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::auth::Principal;
use crate::error::RecycleError;
use crate::recycle::locator::{Located, RecycleLocator};
use crate::recycle::record::RecycleRecord;
use crate::recycle::store::RecycleStore;
use crate::scope::{Action, AppScope};
use crate::storage::operations::user_root;
use crate::storage::validation::{normalize_virtual_path, virtual_to_real_path};

/// Result of clearing a user's recycle bin
#[derive(Debug)]
pub struct ClearOutcome {
    pub cleared: usize,
    pub first_error: Option<RecycleError>,
}

pub struct RecycleService {
    store: RecycleStore,
    locator: RecycleLocator,
    storage_root: PathBuf,
}

fn map_not_found(err: io::Error, hash: &str) -> RecycleError {
    if err.kind() == io::ErrorKind::NotFound {
        RecycleError::NotFound(hash.to_string())
    } else {
        RecycleError::IoError(err)
    }
}

impl RecycleService {
    pub fn new(storage_root: PathBuf, recycle_dir: PathBuf) -> Self {
        Self {
            store: RecycleStore::new(),
            locator: RecycleLocator::new(recycle_dir),
            storage_root,
        }
    }

    pub fn store(&self) -> &RecycleStore {
        &self.store
    }

    pub fn locator(&self) -> &RecycleLocator {
        &self.locator
    }

    /// Moves the caller's file or directory tree into the recycle bin.
    pub async fn soft_delete(
        &self,
        principal: &Principal,
        scope: &AppScope,
        virtual_path: &str,
    ) -> Result<Vec<RecycleRecord>, RecycleError> {
        scope.require(virtual_path, &[Action::Delete])?;
        self.soft_delete_owned(&principal.user_id, &principal.username, virtual_path)
            .await
    }

    /// Soft delete on behalf of an owner, without an app scope check.
    ///
    /// Used when access was already established another way, e.g. through a
    /// share. Files inside a directory are recycled one by one and the emptied
    /// directories are removed.
    pub async fn soft_delete_owned(
        &self,
        owner_id: &str,
        owner_username: &str,
        virtual_path: &str,
    ) -> Result<Vec<RecycleRecord>, RecycleError> {
        let normalized = normalize_virtual_path(virtual_path);
        if normalized == "/" {
            return Err(RecycleError::InvalidPath(normalized));
        }

        let real = virtual_to_real_path(&user_root(&self.storage_root, owner_username), &normalized);
        let metadata = fs::symlink_metadata(&real).map_err(|e| map_not_found(e, &normalized))?;

        fs::create_dir_all(self.locator.recycle_dir())?;

        let mut records = Vec::new();
        if metadata.is_dir() {
            let mut files = Vec::new();
            collect_files(&real, &normalized, &mut files)?;
            for (file_real, file_virtual) in files {
                let record = self
                    .recycle_file(owner_id, owner_username, &file_real, &file_virtual)
                    .await?;
                records.push(record);
            }
            fs::remove_dir_all(&real)?;
            info!("Removed directory {} after recycling {} file(s)", normalized, records.len());
        } else {
            let record = self
                .recycle_file(owner_id, owner_username, &real, &normalized)
                .await?;
            records.push(record);
        }

        Ok(records)
    }

    async fn recycle_file(
        &self,
        owner_id: &str,
        owner_username: &str,
        real: &Path,
        virtual_path: &str,
    ) -> Result<RecycleRecord, RecycleError> {
        let size = fs::metadata(real)?.len();
        let record = RecycleRecord::new(owner_id, owner_username, virtual_path, size, Utc::now());
        let blob = self.locator.primary_path(&record);

        fs::rename(real, &blob).map_err(|e| map_not_found(e, virtual_path))?;
        info!(
            "User {} recycled {} as {}",
            owner_username, record.original_relative_path, record.content_hash
        );
        self.store.insert(record.clone()).await;
        Ok(record)
    }

    /// The caller's records visible to the current app scope, newest first.
    pub async fn list(&self, principal: &Principal, scope: &AppScope) -> Vec<RecycleRecord> {
        self.store
            .list_by_owner(&principal.user_id)
            .await
            .into_iter()
            .filter(|r| scope.authorize(&r.original_relative_path, &[Action::Read]))
            .collect()
    }

    async fn owned_record(
        &self,
        principal: &Principal,
        content_hash: &str,
    ) -> Result<RecycleRecord, RecycleError> {
        self.store
            .get(content_hash)
            .await
            .filter(|r| r.owner_id == principal.user_id)
            .ok_or_else(|| RecycleError::NotFound(content_hash.to_string()))
    }

    /// Moves a recycled file back to where it was deleted from.
    ///
    /// Refuses to overwrite a file that now occupies the original path.
    pub async fn recover(
        &self,
        principal: &Principal,
        scope: &AppScope,
        content_hash: &str,
    ) -> Result<RecycleRecord, RecycleError> {
        let record = self.owned_record(principal, content_hash).await?;
        scope.require(
            &record.original_relative_path,
            &[Action::Update, Action::Create],
        )?;

        let target = virtual_to_real_path(
            &user_root(&self.storage_root, &record.owner_username),
            &record.original_relative_path,
        );
        if fs::symlink_metadata(&target).is_ok() {
            return Err(RecycleError::AlreadyExists(
                record.original_relative_path.clone(),
            ));
        }

        let blob = match self.locator.locate(&record)? {
            Located::Found(path) => path,
            Located::NotFound => return Err(RecycleError::NotFound(content_hash.to_string())),
        };

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(&blob, &target).map_err(|e| map_not_found(e, content_hash))?;
        self.store.remove(content_hash).await;

        info!(
            "User {} recovered {} to {}",
            principal.username, content_hash, record.original_relative_path
        );
        Ok(record)
    }

    /// Permanently deletes one recycled file.
    pub async fn purge(
        &self,
        principal: &Principal,
        scope: &AppScope,
        content_hash: &str,
    ) -> Result<RecycleRecord, RecycleError> {
        let record = self.owned_record(principal, content_hash).await?;
        scope.require(&record.original_relative_path, &[Action::Delete])?;

        self.remove_blob(&record)?;
        self.store.remove(content_hash).await;
        info!("User {} purged {}", principal.username, content_hash);
        Ok(record)
    }

    /// Purges every record of the caller that the app scope may delete.
    ///
    /// Keeps going past failures; reports how many were cleared and the
    /// first error met.
    pub async fn clear(&self, principal: &Principal, scope: &AppScope) -> ClearOutcome {
        let mut outcome = ClearOutcome {
            cleared: 0,
            first_error: None,
        };

        for record in self.store.list_by_owner(&principal.user_id).await {
            if !scope.authorize(&record.original_relative_path, &[Action::Delete]) {
                debug!(
                    "Skipping {} outside the current app scope",
                    record.original_relative_path
                );
                continue;
            }
            match self.remove_blob(&record) {
                Ok(()) => {
                    self.store.remove(&record.content_hash).await;
                    outcome.cleared += 1;
                }
                Err(e) => {
                    warn!("Failed to clear {}: {}", record.content_hash, e);
                    outcome.first_error.get_or_insert(e);
                }
            }
        }

        info!(
            "User {} cleared {} recycled file(s)",
            principal.username, outcome.cleared
        );
        outcome
    }

    /// Purges records older than `retention`, returning how many were removed.
    pub async fn sweep_expired(&self, now: DateTime<Utc>, retention: chrono::Duration) -> usize {
        let mut swept = 0;
        for record in self.store.list_deleted_before(now - retention).await {
            match self.remove_blob(&record) {
                Ok(()) => {
                    self.store.remove(&record.content_hash).await;
                    swept += 1;
                }
                Err(e) => warn!("Retention sweep failed for {}: {}", record.content_hash, e),
            }
        }
        if swept > 0 {
            info!("Retention sweep purged {} recycled file(s)", swept);
        }
        swept
    }

    /// Removes the blob behind `record`; a blob that is already gone is fine.
    fn remove_blob(&self, record: &RecycleRecord) -> Result<(), RecycleError> {
        match self.locator.locate(record)? {
            Located::Found(path) => match fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            },
            Located::NotFound => {
                debug!("Blob for {} already gone", record.content_hash);
                Ok(())
            }
        }
    }
}

fn collect_files(
    real: &Path,
    virtual_path: &str,
    files: &mut Vec<(PathBuf, String)>,
) -> io::Result<()> {
    for entry in fs::read_dir(real)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        let child_virtual = format!("{}/{}", virtual_path.trim_end_matches('/'), name);
        if entry.file_type()?.is_dir() {
            collect_files(&entry.path(), &child_virtual, files)?;
        } else {
            files.push((entry.path(), child_virtual));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppScopeConfig;
    use crate::scope::resolve_scope;
    use chrono::Duration;

    struct Fixture {
        _dir: tempfile::TempDir,
        root: PathBuf,
        service: RecycleService,
        alice: Principal,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        fs::create_dir_all(root.join("alice/docs")).unwrap();
        fs::write(root.join("alice/docs/a.txt"), b"alpha").unwrap();
        fs::write(root.join("alice/docs/b.txt"), b"beta").unwrap();
        let service = RecycleService::new(root.clone(), root.join(".recycle"));
        Fixture {
            _dir: dir,
            root,
            service,
            alice: Principal::new("1001", "alice"),
        }
    }

    #[tokio::test]
    async fn test_soft_delete_then_recover() {
        let f = fixture();
        let scope = AppScope::inactive();

        let records = f
            .service
            .soft_delete(&f.alice, &scope, "/docs/a.txt")
            .await
            .unwrap();
        let record = &records[0];
        assert!(!f.root.join("alice/docs/a.txt").exists());
        assert!(f.root.join(".recycle").join(record.blob_name()).is_file());
        assert_eq!(record.size_bytes, 5);

        f.service
            .recover(&f.alice, &scope, &record.content_hash)
            .await
            .unwrap();
        assert_eq!(fs::read(f.root.join("alice/docs/a.txt")).unwrap(), b"alpha");
        assert!(f.service.store().get(&record.content_hash).await.is_none());
    }

    #[tokio::test]
    async fn test_recover_refuses_to_overwrite() {
        let f = fixture();
        let scope = AppScope::inactive();
        let record = f
            .service
            .soft_delete(&f.alice, &scope, "/docs/a.txt")
            .await
            .unwrap()
            .remove(0);
        fs::write(f.root.join("alice/docs/a.txt"), b"new").unwrap();

        let result = f.service.recover(&f.alice, &scope, &record.content_hash).await;
        assert!(matches!(result, Err(RecycleError::AlreadyExists(_))));
        assert!(f.service.store().get(&record.content_hash).await.is_some());
    }

    #[tokio::test]
    async fn test_recover_recreates_missing_directories() {
        let f = fixture();
        let scope = AppScope::inactive();
        let records = f
            .service
            .soft_delete(&f.alice, &scope, "/docs")
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert!(!f.root.join("alice/docs").exists());

        for record in &records {
            f.service
                .recover(&f.alice, &scope, &record.content_hash)
                .await
                .unwrap();
        }
        assert_eq!(fs::read(f.root.join("alice/docs/b.txt")).unwrap(), b"beta");
    }

    #[tokio::test]
    async fn test_foreign_records_are_not_found() {
        let f = fixture();
        let scope = AppScope::inactive();
        let record = f
            .service
            .soft_delete(&f.alice, &scope, "/docs/a.txt")
            .await
            .unwrap()
            .remove(0);
        let bob = Principal::new("1002", "bob");

        assert!(matches!(
            f.service.recover(&bob, &scope, &record.content_hash).await,
            Err(RecycleError::NotFound(_))
        ));
        assert!(matches!(
            f.service.purge(&bob, &scope, &record.content_hash).await,
            Err(RecycleError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_purge_tolerates_missing_blob() {
        let f = fixture();
        let scope = AppScope::inactive();
        let record = f
            .service
            .soft_delete(&f.alice, &scope, "/docs/a.txt")
            .await
            .unwrap()
            .remove(0);
        fs::remove_file(f.service.locator().primary_path(&record)).unwrap();

        f.service
            .purge(&f.alice, &scope, &record.content_hash)
            .await
            .unwrap();
        assert!(f.service.store().get(&record.content_hash).await.is_none());

        // Second purge of the same record loses the race.
        assert!(matches!(
            f.service.purge(&f.alice, &scope, &record.content_hash).await,
            Err(RecycleError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_recover_missing_blob_is_not_found() {
        let f = fixture();
        let scope = AppScope::inactive();
        let record = f
            .service
            .soft_delete(&f.alice, &scope, "/docs/a.txt")
            .await
            .unwrap()
            .remove(0);
        fs::remove_file(f.service.locator().primary_path(&record)).unwrap();

        assert!(matches!(
            f.service.recover(&f.alice, &scope, &record.content_hash).await,
            Err(RecycleError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_clear_skips_records_outside_app_scope() {
        let f = fixture();
        fs::create_dir_all(f.root.join("alice/apps/shop.example")).unwrap();
        fs::write(f.root.join("alice/apps/shop.example/cart.json"), b"{}").unwrap();

        let unscoped = AppScope::inactive();
        f.service
            .soft_delete(&f.alice, &unscoped, "/docs/a.txt")
            .await
            .unwrap();
        f.service
            .soft_delete(&f.alice, &unscoped, "/apps/shop.example/cart.json")
            .await
            .unwrap();

        let config = AppScopeConfig {
            required_resource_pattern: "app:*".into(),
            ..AppScopeConfig::default()
        };
        let principal = f.alice.clone().with_claim("shop.example", &["write"]);
        let scope = resolve_scope(&principal, &config).unwrap();

        assert_eq!(f.service.list(&principal, &scope).await.len(), 1);
        let outcome = f.service.clear(&principal, &scope).await;
        assert_eq!(outcome.cleared, 1);
        assert!(outcome.first_error.is_none());

        let remaining = f.service.list(&f.alice, &unscoped).await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].original_relative_path, "/docs/a.txt");
    }

    #[tokio::test]
    async fn test_recover_requires_update_or_create_in_scope() {
        let f = fixture();
        fs::create_dir_all(f.root.join("alice/apps/shop.example")).unwrap();
        fs::write(f.root.join("alice/apps/shop.example/cart.json"), b"{}").unwrap();
        let record = f
            .service
            .soft_delete(&f.alice, &AppScope::inactive(), "/apps/shop.example/cart.json")
            .await
            .unwrap()
            .remove(0);

        let config = AppScopeConfig {
            required_resource_pattern: "app:*".into(),
            ..AppScopeConfig::default()
        };
        let reader = f.alice.clone().with_claim("shop.example", &["read"]);
        let scope = resolve_scope(&reader, &config).unwrap();
        assert!(matches!(
            f.service.recover(&reader, &scope, &record.content_hash).await,
            Err(RecycleError::Scope(_))
        ));

        let creator = f.alice.clone().with_claim("shop.example", &["create"]);
        let scope = resolve_scope(&creator, &config).unwrap();
        f.service
            .recover(&creator, &scope, &record.content_hash)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_sweep_expired() {
        let f = fixture();
        let scope = AppScope::inactive();
        let record = f
            .service
            .soft_delete(&f.alice, &scope, "/docs/a.txt")
            .await
            .unwrap()
            .remove(0);

        assert_eq!(
            f.service.sweep_expired(Utc::now(), Duration::days(30)).await,
            0
        );
        let swept = f
            .service
            .sweep_expired(Utc::now() + Duration::days(31), Duration::days(30))
            .await;
        assert_eq!(swept, 1);
        assert!(!f.service.locator().primary_path(&record).exists());
    }

    #[tokio::test]
    async fn test_soft_delete_rejects_root_and_missing() {
        let f = fixture();
        let scope = AppScope::inactive();
        assert!(matches!(
            f.service.soft_delete(&f.alice, &scope, "/").await,
            Err(RecycleError::InvalidPath(_))
        ));
        assert!(matches!(
            f.service.soft_delete(&f.alice, &scope, "/nope.txt").await,
            Err(RecycleError::NotFound(_))
        ));
    }
}
