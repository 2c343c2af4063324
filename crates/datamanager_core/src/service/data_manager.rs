//! Catalog facade: finder factories, writes and loader diagnostics.
//!
//! # Invariants
//! - Every write runs in its own `IMMEDIATE` transaction.
//! - All finders and mapped objects of one `DataManager` share a single
//!   relationship loader.

use crate::db::Database;
use crate::finder::{BackupFinder, Backups, Finder, ManagedFileFinder, ManagedFiles};
use crate::mapper::CatalogMapper;
use crate::model::Id;
use crate::repo::backup_repo::SqliteBackupBackend;
use crate::repo::catalog_repo::{
    CatalogRepository, NewBackup, NewFingerprint, SqliteCatalogRepository,
};
use crate::repo::loader::RelationshipLoader;
use crate::repo::managed_file_repo::SqliteManagedFileBackend;
use crate::repo::{RepoError, RepoResult};
use log::info;
use std::path::Path;
use std::sync::Arc;

/// Counters describing the work done on behalf of this facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderStats {
    pub relation_loads: usize,
    pub commits: usize,
    pub rollbacks: usize,
}

/// Entry point to one catalog.
#[derive(Debug, Clone)]
pub struct DataManager {
    db: Database,
    mapper: Arc<CatalogMapper>,
    files: Arc<SqliteManagedFileBackend>,
    backups: Arc<SqliteBackupBackend>,
}

impl DataManager {
    pub fn new(db: Database) -> Self {
        let mapper = CatalogMapper::new(RelationshipLoader::new(db.clone()));
        Self {
            mapper: Arc::new(mapper),
            files: Arc::new(SqliteManagedFileBackend::new(db.clone())),
            backups: Arc::new(SqliteBackupBackend::new(db.clone())),
            db,
        }
    }

    /// Opens (and migrates) the catalog file at `path`.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    pub fn open_in_memory() -> RepoResult<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// An unconstrained finder over all managed files.
    pub fn find_managed_files(&self) -> ManagedFileFinder {
        Finder::<ManagedFiles>::new(self.files.clone(), self.mapper.clone())
    }

    /// An unconstrained finder over all backups.
    pub fn find_backups(&self) -> BackupFinder {
        Finder::<Backups>::new(self.backups.clone(), self.mapper.clone())
    }

    /// Registers a file together with its initial fingerprints.
    pub fn register_managed_file(
        &self,
        path: impl AsRef<Path>,
        fingerprints: &[NewFingerprint],
    ) -> RepoResult<Id> {
        let path = path.as_ref().to_string_lossy();
        let id = self.db.in_write_transaction("register_managed_file", |tx| {
            let repo = SqliteCatalogRepository::new(tx);
            let id = repo.insert_managed_file(&path)?;
            for fingerprint in fingerprints {
                repo.insert_fingerprint(id, fingerprint)?;
            }
            Ok::<_, RepoError>(id)
        })?;
        info!(
            "event=catalog_write module=service status=ok op=register_managed_file fingerprints={}",
            fingerprints.len()
        );
        Ok(id)
    }

    pub fn add_fingerprint(&self, file_id: Id, fingerprint: &NewFingerprint) -> RepoResult<Id> {
        self.db.in_write_transaction("add_fingerprint", |tx| {
            SqliteCatalogRepository::new(tx).insert_fingerprint(file_id, fingerprint)
        })
    }

    pub fn register_backup(&self, backup: &NewBackup) -> RepoResult<Id> {
        let id = self.db.in_write_transaction("register_backup", |tx| {
            SqliteCatalogRepository::new(tx).insert_backup(backup)
        })?;
        info!("event=catalog_write module=service status=ok op=register_backup");
        Ok(id)
    }

    /// Records that `file_id` is stored in `backup_id` under `path`.
    pub fn add_backup_file(
        &self,
        backup_id: Id,
        file_id: Id,
        path: impl AsRef<Path>,
    ) -> RepoResult<Id> {
        let path = path.as_ref().to_string_lossy();
        self.db.in_write_transaction("add_backup_file", |tx| {
            SqliteCatalogRepository::new(tx).insert_backup_file(backup_id, file_id, &path)
        })
    }

    /// Deletes a file, its fingerprints and its backup memberships.
    pub fn delete_managed_file(&self, id: Id) -> RepoResult<()> {
        self.db.in_write_transaction("delete_managed_file", |tx| {
            SqliteCatalogRepository::new(tx).delete_managed_file(id)
        })
    }

    /// Deletes a backup and its member rows.
    pub fn delete_backup(&self, id: Id) -> RepoResult<()> {
        self.db.in_write_transaction("delete_backup", |tx| {
            SqliteCatalogRepository::new(tx).delete_backup(id)
        })
    }

    pub fn loader_stats(&self) -> LoaderStats {
        LoaderStats {
            relation_loads: self.mapper.loader().load_count(),
            commits: self.db.commit_count(),
            rollbacks: self.db.rollback_count(),
        }
    }
}
