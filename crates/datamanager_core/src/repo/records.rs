//! Raw persisted records as read from the catalog.
//!
//! Records carry scalar columns only, plus an optional pre-fetched relation
//! when the query asked for one. Mapping into domain objects happens in
//! [`crate::mapper`].

use super::{RepoError, RepoResult};
use crate::model::Id;
use rusqlite::Row;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedFileRecord {
    pub id: Id,
    pub path: String,
    /// `Some` when the backend loaded the fingerprints with the row.
    pub fingerprints: Option<Vec<FingerprintRecord>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintRecord {
    pub id: Id,
    pub file_id: Id,
    pub name: String,
    pub algorithm: String,
    pub value: String,
    pub timestamp_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRecord {
    pub id: Id,
    pub label: String,
    pub volume_id: Id,
    pub encrypted: bool,
    pub base_path: String,
    pub creation_ms: i64,
    pub registration_ms: i64,
    pub latest_check_ms: Option<i64>,
    /// `Some` when the backend loaded the members with the row.
    pub backup_files: Option<Vec<BackupFileRecord>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupFileRecord {
    pub id: Id,
    pub backup_id: Id,
    pub path: String,
    pub managed_file: ManagedFileRecord,
}

pub(crate) const FILE_COLUMNS: &str = "files.id AS file_id, files.path AS file_path";

pub(crate) const FINGERPRINT_COLUMNS: &str = "fingerprints.id AS fingerprint_id,
    fingerprints.file_id AS fingerprint_file_id,
    fingerprints.name AS fingerprint_name,
    fingerprints.algorithm AS fingerprint_algorithm,
    fingerprints.fingerprint AS fingerprint_value,
    fingerprints.timestamp AS fingerprint_timestamp";

pub(crate) const BACKUP_COLUMNS: &str = "backups.id AS backup_id,
    backups.label AS backup_label,
    backups.volume_id AS backup_volume_id,
    backups.encrypted AS backup_encrypted,
    backups.base_path AS backup_base_path,
    backups.creation_date AS backup_creation_date,
    backups.registration_date AS backup_registration_date,
    backups.latest_check_date AS backup_latest_check_date";

pub(crate) const BACKUP_FILE_COLUMNS: &str = "backup_files.id AS member_id,
    backup_files.backup_id AS member_backup_id,
    backup_files.path AS member_path";

pub(crate) fn parse_file_row(row: &Row<'_>) -> RepoResult<ManagedFileRecord> {
    Ok(ManagedFileRecord {
        id: parse_id(row, "file_id", "files.id")?,
        path: row.get("file_path")?,
        fingerprints: None,
    })
}

pub(crate) fn parse_fingerprint_row(row: &Row<'_>) -> RepoResult<FingerprintRecord> {
    Ok(FingerprintRecord {
        id: parse_id(row, "fingerprint_id", "fingerprints.id")?,
        file_id: parse_id(row, "fingerprint_file_id", "fingerprints.file_id")?,
        name: row.get("fingerprint_name")?,
        algorithm: row.get("fingerprint_algorithm")?,
        value: row.get("fingerprint_value")?,
        timestamp_ms: row.get("fingerprint_timestamp")?,
    })
}

pub(crate) fn parse_backup_row(row: &Row<'_>) -> RepoResult<BackupRecord> {
    let encrypted = match row.get::<_, i64>("backup_encrypted")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid encrypted value `{other}` in backups.encrypted"
            )));
        }
    };

    Ok(BackupRecord {
        id: parse_id(row, "backup_id", "backups.id")?,
        label: row.get("backup_label")?,
        volume_id: parse_id(row, "backup_volume_id", "backups.volume_id")?,
        encrypted,
        base_path: row.get("backup_base_path")?,
        creation_ms: row.get("backup_creation_date")?,
        registration_ms: row.get("backup_registration_date")?,
        latest_check_ms: row.get("backup_latest_check_date")?,
        backup_files: None,
    })
}

/// Parses a member row joined with its managed file.
pub(crate) fn parse_backup_file_row(row: &Row<'_>) -> RepoResult<BackupFileRecord> {
    Ok(BackupFileRecord {
        id: parse_id(row, "member_id", "backup_files.id")?,
        backup_id: parse_id(row, "member_backup_id", "backup_files.backup_id")?,
        path: row.get("member_path")?,
        managed_file: parse_file_row(row)?,
    })
}

fn parse_id(row: &Row<'_>, alias: &str, column: &str) -> RepoResult<Id> {
    let text: String = row.get(alias)?;
    Uuid::parse_str(&text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{text}` in {column}")))
}
