//! SQLite query backend for backups.
//!
//! # Responsibility
//! - Execute backup finder queries inside one transaction per call.
//! - Check backup existence and read member files.
//!
//! # Invariants
//! - A backup holding the filtered file several times is returned once.
//! - Members are ordered by path ascending, then id.

use super::records::{
    parse_backup_file_row, parse_backup_row, BackupFileRecord, BackupRecord, BACKUP_COLUMNS,
    BACKUP_FILE_COLUMNS, FILE_COLUMNS,
};
use super::sql::{compile_count, compile_select, Conditions};
use super::RepoResult;
use crate::db::Database;
use crate::finder::{Backups, FinderQuery, QueryBackend};
use crate::model::Id;
use rusqlite::{params_from_iter, Connection, OptionalExtension};

const FILE_ID_FILTER: &str = "EXISTS (
    SELECT 1 FROM backup_files
    WHERE backup_files.backup_id = backups.id AND backup_files.file_id = ?
)";

/// Runs backup finders against a catalog database.
#[derive(Debug, Clone)]
pub struct SqliteBackupBackend {
    db: Database,
}

impl SqliteBackupBackend {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl QueryBackend<Backups> for SqliteBackupBackend {
    fn execute(&self, query: &FinderQuery<Backups>) -> RepoResult<Vec<BackupRecord>> {
        self.db.in_transaction("backup_query", |tx| {
            let mut records = select_backups(tx, query)?;
            if query.prefetch {
                for record in &mut records {
                    record.backup_files = Some(members_of(tx, record.id)?);
                }
            }
            Ok(records)
        })
    }

    fn count(&self, query: &FinderQuery<Backups>) -> RepoResult<u64> {
        self.db.in_transaction("backup_count", |tx| {
            let (sql, bind_values) = compile_count("backups", conditions(query));
            let count = tx.query_row(&sql, params_from_iter(bind_values), |row| {
                row.get::<_, i64>(0)
            })?;
            Ok(u64::try_from(count).unwrap_or_default())
        })
    }
}

fn conditions(query: &FinderQuery<Backups>) -> Conditions {
    let filters = &query.filters;
    let mut conditions = Conditions::default();
    if let Some(label) = &filters.label {
        conditions.push("backups.label = ?", label.as_str());
    }
    if let Some(volume_id) = &filters.volume_id {
        conditions.push("backups.volume_id = ?", volume_id.as_str());
    }
    if let Some(file_id) = &filters.file_id {
        conditions.push(FILE_ID_FILTER, file_id.as_str());
    }
    conditions
}

fn select_backups(conn: &Connection, query: &FinderQuery<Backups>) -> RepoResult<Vec<BackupRecord>> {
    let (sql, bind_values) = compile_select(
        &format!("SELECT {BACKUP_COLUMNS} FROM backups"),
        "backups.id",
        conditions(query),
        &query.sorts,
        query.window,
    );

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(parse_backup_row(row)?);
    }
    Ok(records)
}

pub fn backup_exists(conn: &Connection, id: Id) -> RepoResult<bool> {
    let found = conn
        .query_row("SELECT 1 FROM backups WHERE id = ?1;", [id.to_string()], |_| {
            Ok(())
        })
        .optional()?;
    Ok(found.is_some())
}

/// Reads the members of one backup together with their managed files.
pub fn members_of(conn: &Connection, backup_id: Id) -> RepoResult<Vec<BackupFileRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BACKUP_FILE_COLUMNS}, {FILE_COLUMNS}
         FROM backup_files
         JOIN files ON files.id = backup_files.file_id
         WHERE backup_files.backup_id = ?1
         ORDER BY backup_files.path ASC, backup_files.id ASC;"
    ))?;
    let mut rows = stmt.query([backup_id.to_string()])?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(parse_backup_file_row(row)?);
    }
    Ok(records)
}
