//! SQLite query backend for managed files.
//!
//! # Responsibility
//! - Execute managed-file finder queries inside one transaction per call.
//! - Check file existence and read fingerprint histories.
//!
//! # Invariants
//! - A file matching several fingerprints is still returned once.
//! - Fingerprints are ordered by timestamp ascending, then id.

use super::records::{
    parse_file_row, parse_fingerprint_row, FingerprintRecord, ManagedFileRecord, FILE_COLUMNS,
    FINGERPRINT_COLUMNS,
};
use super::sql::{compile_count, compile_select, Conditions};
use super::RepoResult;
use crate::db::Database;
use crate::finder::{FinderQuery, ManagedFiles, QueryBackend};
use crate::model::Id;
use rusqlite::{params_from_iter, Connection, OptionalExtension};

const FINGERPRINT_FILTER: &str = "EXISTS (
    SELECT 1 FROM fingerprints
    WHERE fingerprints.file_id = files.id AND fingerprints.fingerprint = ?
)";

/// Runs managed-file finders against a catalog database.
#[derive(Debug, Clone)]
pub struct SqliteManagedFileBackend {
    db: Database,
}

impl SqliteManagedFileBackend {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl QueryBackend<ManagedFiles> for SqliteManagedFileBackend {
    fn execute(&self, query: &FinderQuery<ManagedFiles>) -> RepoResult<Vec<ManagedFileRecord>> {
        self.db.in_transaction("managed_file_query", |tx| {
            let mut records = select_files(tx, query)?;
            if query.prefetch {
                for record in &mut records {
                    record.fingerprints = Some(fingerprints_of(tx, record.id)?);
                }
            }
            Ok(records)
        })
    }

    fn count(&self, query: &FinderQuery<ManagedFiles>) -> RepoResult<u64> {
        self.db.in_transaction("managed_file_count", |tx| {
            let (sql, bind_values) = compile_count("files", conditions(query));
            let count = tx.query_row(&sql, params_from_iter(bind_values), |row| {
                row.get::<_, i64>(0)
            })?;
            Ok(u64::try_from(count).unwrap_or_default())
        })
    }
}

fn conditions(query: &FinderQuery<ManagedFiles>) -> Conditions {
    let mut conditions = Conditions::default();
    if let Some(fingerprint) = &query.filters.fingerprint {
        conditions.push(FINGERPRINT_FILTER, fingerprint.as_str());
    }
    conditions
}

fn select_files(
    conn: &Connection,
    query: &FinderQuery<ManagedFiles>,
) -> RepoResult<Vec<ManagedFileRecord>> {
    let (sql, bind_values) = compile_select(
        &format!("SELECT {FILE_COLUMNS} FROM files"),
        "files.id",
        conditions(query),
        &query.sorts,
        query.window,
    );

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(parse_file_row(row)?);
    }
    Ok(records)
}

/// Reports whether a managed file with `id` exists.
pub fn file_exists(conn: &Connection, id: Id) -> RepoResult<bool> {
    let found = conn
        .query_row("SELECT 1 FROM files WHERE id = ?1;", [id.to_string()], |_| {
            Ok(())
        })
        .optional()?;
    Ok(found.is_some())
}

/// Reads the fingerprint history of one file, oldest first.
pub fn fingerprints_of(conn: &Connection, file_id: Id) -> RepoResult<Vec<FingerprintRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {FINGERPRINT_COLUMNS}
         FROM fingerprints
         WHERE fingerprints.file_id = ?1
         ORDER BY fingerprints.timestamp ASC, fingerprints.id ASC;"
    ))?;
    let mut rows = stmt.query([file_id.to_string()])?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(parse_fingerprint_row(row)?);
    }
    Ok(records)
}
