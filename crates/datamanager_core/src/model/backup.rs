//! Backup and backup member domain objects.

use super::{Id, ManagedFile};
use crate::lazy::LazyValue;
use crate::repo::RepoResult;
use serde::Serialize;
use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

/// Scalar attributes of a backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupDetails {
    pub id: Id,
    pub label: String,
    pub volume_id: Id,
    pub encrypted: bool,
    /// Common prefix of the files stored in the backup.
    pub base_path: PathBuf,
    /// Unix epoch milliseconds.
    pub creation_ms: i64,
    /// Unix epoch milliseconds.
    pub registration_ms: i64,
    /// Unix epoch milliseconds; `None` when never checked.
    pub latest_check_ms: Option<i64>,
}

/// A backup volume and the files it holds.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Backup {
    #[serde(flatten)]
    details: BackupDetails,
    backup_files: LazyValue<Vec<BackupFile>>,
}

impl Backup {
    pub fn new(details: BackupDetails, backup_files: LazyValue<Vec<BackupFile>>) -> Self {
        Self {
            details,
            backup_files,
        }
    }

    pub fn details(&self) -> &BackupDetails {
        &self.details
    }

    pub fn id(&self) -> Id {
        self.details.id
    }

    pub fn label(&self) -> &str {
        &self.details.label
    }

    pub fn volume_id(&self) -> Id {
        self.details.volume_id
    }

    pub fn is_encrypted(&self) -> bool {
        self.details.encrypted
    }

    pub fn base_path(&self) -> &Path {
        &self.details.base_path
    }

    /// Returns the member files ordered by path, loading them on first use.
    pub fn backup_files(&self) -> RepoResult<&[BackupFile]> {
        self.backup_files.get().map(Vec::as_slice)
    }

    /// Gives access to the relation holder without forcing it.
    pub fn backup_files_value(&self) -> &LazyValue<Vec<BackupFile>> {
        &self.backup_files
    }
}

/// One file stored in a backup.
///
/// The owning backup is referenced weakly; it is a lookup aid only and is
/// excluded from equality, `Debug` and serialization.
#[derive(Serialize)]
pub struct BackupFile {
    id: Id,
    path: PathBuf,
    managed_file: ManagedFile,
    #[serde(skip)]
    backup: Weak<Backup>,
}

impl BackupFile {
    pub fn new(
        id: Id,
        path: impl Into<PathBuf>,
        managed_file: ManagedFile,
        backup: Weak<Backup>,
    ) -> Self {
        Self {
            id,
            path: path.into(),
            managed_file,
            backup,
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    /// Path of the copy inside the backup.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn managed_file(&self) -> &ManagedFile {
        &self.managed_file
    }

    /// Returns the owning backup while it is still alive.
    pub fn backup(&self) -> Option<Arc<Backup>> {
        self.backup.upgrade()
    }
}

impl Debug for BackupFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackupFile")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("managed_file", &self.managed_file)
            .finish()
    }
}

impl PartialEq for BackupFile {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.path == other.path && self.managed_file == other.managed_file
    }
}

impl Eq for BackupFile {}
