//! Fetches one-to-many relations in fresh, independent transactions.
//!
//! # Responsibility
//! - Re-read the owner row and its children on a new connection, so a
//!   relation can be forced long after the query that produced the owner
//!   has committed.
//! - Materialize the full child list before the transaction ends.
//!
//! # Invariants
//! - Every `load` opens exactly one transaction of its own.
//! - A vanished owner yields `NotFound`, never an empty list.

use super::backup_repo::{backup_exists, members_of};
use super::managed_file_repo::{file_exists, fingerprints_of};
use super::records::{BackupFileRecord, FingerprintRecord};
use super::{RepoError, RepoResult};
use crate::db::Database;
use crate::model::Id;
use log::{debug, error};
use rusqlite::Connection;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// One owner-to-children association the loader can fetch.
pub trait Relation {
    /// Relation name used in log events and transaction scopes.
    const NAME: &'static str;
    /// Owner entity name used in `NotFound` errors.
    const OWNER: &'static str;
    type Child;

    fn owner_exists(conn: &Connection, owner_id: Id) -> RepoResult<bool>;

    fn children(conn: &Connection, owner_id: Id) -> RepoResult<Vec<Self::Child>>;
}

/// A managed file's fingerprints, oldest first.
pub enum FileFingerprints {}

impl Relation for FileFingerprints {
    const NAME: &'static str = "file_fingerprints";
    const OWNER: &'static str = "managed_file";
    type Child = FingerprintRecord;

    fn owner_exists(conn: &Connection, owner_id: Id) -> RepoResult<bool> {
        file_exists(conn, owner_id)
    }

    fn children(conn: &Connection, owner_id: Id) -> RepoResult<Vec<FingerprintRecord>> {
        fingerprints_of(conn, owner_id)
    }
}

/// A backup's member files, ordered by path.
pub enum BackupMembers {}

impl Relation for BackupMembers {
    const NAME: &'static str = "backup_members";
    const OWNER: &'static str = "backup";
    type Child = BackupFileRecord;

    fn owner_exists(conn: &Connection, owner_id: Id) -> RepoResult<bool> {
        backup_exists(conn, owner_id)
    }

    fn children(conn: &Connection, owner_id: Id) -> RepoResult<Vec<BackupFileRecord>> {
        members_of(conn, owner_id)
    }
}

/// Loads relations for mapped domain objects; cheap to clone.
#[derive(Debug, Clone)]
pub struct RelationshipLoader {
    db: Database,
    loads: Arc<AtomicUsize>,
}

impl RelationshipLoader {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            loads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fetches the children of `owner_id` in a new transaction.
    ///
    /// # Errors
    /// - `NotFound` when the owner no longer exists.
    /// - `Db` on storage failures.
    pub fn load<R: Relation>(&self, owner_id: Id) -> RepoResult<Vec<R::Child>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let started_at = Instant::now();

        let loaded = self.db.in_transaction(R::NAME, |tx| {
            if !R::owner_exists(tx, owner_id)? {
                return Err(RepoError::NotFound {
                    entity: R::OWNER,
                    id: owner_id,
                });
            }
            R::children(tx, owner_id)
        });

        match &loaded {
            Ok(children) => debug!(
                "event=relation_fetch module=repo status=ok relation={} count={} duration_ms={}",
                R::NAME,
                children.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=relation_fetch module=repo status=error relation={} duration_ms={} error={err}",
                R::NAME,
                started_at.elapsed().as_millis()
            ),
        }
        loaded
    }

    /// Number of `load` calls made through this loader and its clones.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}
