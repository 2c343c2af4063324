//! Repository layer: raw records, SQLite query backends and relation loading.
//!
//! # Responsibility
//! - Isolate SQL details from finders, mappers and use-case services.
//! - Translate finder specs into SQLite queries.
//! - Load one-to-many relations in their own transaction.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `Unknown*Key`) in
//!   addition to DB transport errors.
//! - Read paths reject undecodable persisted rows instead of masking them.

use crate::db::DbError;
use crate::model::Id;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod backup_repo;
pub mod catalog_repo;
pub mod loader;
pub mod managed_file_repo;
pub mod records;
mod sql;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error surfaced by finders, relation loading, lazy values and writes.
#[derive(Debug)]
pub enum RepoError {
    /// A sort key the finder kind does not declare.
    UnknownSortKey { kind: &'static str, key: String },
    /// A filter name the finder kind does not declare.
    UnknownFilterKey { kind: &'static str, key: String },
    /// The addressed record does not exist (anymore).
    NotFound { entity: &'static str, id: Id },
    /// Opaque storage failure; never retried by the core.
    Db(DbError),
    /// A persisted row cannot be decoded.
    InvalidData(String),
    /// A caller-level option combination is not allowed.
    InvalidOptions(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownSortKey { kind, key } => {
                write!(f, "unknown sort key `{key}` for {kind}")
            }
            Self::UnknownFilterKey { kind, key } => {
                write!(f, "unknown filter `{key}` for {kind}")
            }
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::InvalidOptions(message) => write!(f, "{message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
