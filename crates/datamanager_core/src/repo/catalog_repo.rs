//! Catalog write contracts and SQLite implementation.
//!
//! # Responsibility
//! - Register files, fingerprints, backups and backup members.
//! - Delete files and backups together with their dependent rows.
//!
//! # Invariants
//! - Writes referencing a missing owner fail with `NotFound` before any
//!   SQL mutation.
//! - Ids are generated here; callers never choose them.

use super::backup_repo::backup_exists;
use super::managed_file_repo::file_exists;
use super::{RepoError, RepoResult};
use crate::model::Id;
use rusqlite::{params, Connection};
use uuid::Uuid;

/// Input for one fingerprint registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFingerprint {
    pub name: String,
    pub algorithm: String,
    pub fingerprint: String,
    /// Unix epoch milliseconds.
    pub timestamp_ms: i64,
}

impl NewFingerprint {
    pub fn new(
        name: impl Into<String>,
        algorithm: impl Into<String>,
        fingerprint: impl Into<String>,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            name: name.into(),
            algorithm: algorithm.into(),
            fingerprint: fingerprint.into(),
            timestamp_ms,
        }
    }
}

/// Input for one backup registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBackup {
    pub label: String,
    pub volume_id: Id,
    pub encrypted: bool,
    pub base_path: String,
    pub creation_ms: i64,
    pub registration_ms: i64,
    pub latest_check_ms: Option<i64>,
}

/// Repository interface for catalog writes.
pub trait CatalogRepository {
    fn insert_managed_file(&self, path: &str) -> RepoResult<Id>;
    fn insert_fingerprint(&self, file_id: Id, fingerprint: &NewFingerprint) -> RepoResult<Id>;
    fn insert_backup(&self, backup: &NewBackup) -> RepoResult<Id>;
    fn insert_backup_file(&self, backup_id: Id, file_id: Id, path: &str) -> RepoResult<Id>;
    fn delete_managed_file(&self, id: Id) -> RepoResult<()>;
    fn delete_backup(&self, id: Id) -> RepoResult<()>;
}

/// SQLite-backed catalog writer bound to one connection or transaction.
pub struct SqliteCatalogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn require_file(&self, id: Id) -> RepoResult<()> {
        if file_exists(self.conn, id)? {
            Ok(())
        } else {
            Err(RepoError::NotFound {
                entity: "managed_file",
                id,
            })
        }
    }
}

impl CatalogRepository for SqliteCatalogRepository<'_> {
    fn insert_managed_file(&self, path: &str) -> RepoResult<Id> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO files (id, path) VALUES (?1, ?2);",
            params![id.to_string(), path],
        )?;
        Ok(id)
    }

    fn insert_fingerprint(&self, file_id: Id, fingerprint: &NewFingerprint) -> RepoResult<Id> {
        self.require_file(file_id)?;

        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO fingerprints (
                id,
                name,
                algorithm,
                fingerprint,
                timestamp,
                file_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                id.to_string(),
                fingerprint.name.as_str(),
                fingerprint.algorithm.as_str(),
                fingerprint.fingerprint.as_str(),
                fingerprint.timestamp_ms,
                file_id.to_string(),
            ],
        )?;
        Ok(id)
    }

    fn insert_backup(&self, backup: &NewBackup) -> RepoResult<Id> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO backups (
                id,
                label,
                volume_id,
                encrypted,
                base_path,
                creation_date,
                registration_date,
                latest_check_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                id.to_string(),
                backup.label.as_str(),
                backup.volume_id.to_string(),
                i64::from(backup.encrypted),
                backup.base_path.as_str(),
                backup.creation_ms,
                backup.registration_ms,
                backup.latest_check_ms,
            ],
        )?;
        Ok(id)
    }

    fn insert_backup_file(&self, backup_id: Id, file_id: Id, path: &str) -> RepoResult<Id> {
        if !backup_exists(self.conn, backup_id)? {
            return Err(RepoError::NotFound {
                entity: "backup",
                id: backup_id,
            });
        }
        self.require_file(file_id)?;

        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO backup_files (id, backup_id, file_id, path) VALUES (?1, ?2, ?3, ?4);",
            params![id.to_string(), backup_id.to_string(), file_id.to_string(), path],
        )?;
        Ok(id)
    }

    fn delete_managed_file(&self, id: Id) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM files WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "managed_file",
                id,
            });
        }
        Ok(())
    }

    fn delete_backup(&self, id: Id) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM backups WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "backup", id });
        }
        Ok(())
    }
}
