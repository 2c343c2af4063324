//! Catalog database handle.
//!
//! # Responsibility
//! - Open file or in-memory catalogs and apply migrations once.
//! - Hand out freshly configured connections per unit of work.
//! - Wrap units of work in independent, counted transactions.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON` and a busy timeout.
//! - Write units take the write lock up front, so contention waits on the
//!   busy timeout instead of failing when a read lock would be upgraded.
//! - In-memory catalogs stay alive as long as any `Database` clone exists.

use super::migrations::apply_migrations;
use super::tx::TxCounters;
use super::{DbError, DbResult};
use log::{debug, error, info, warn};
use rusqlite::{Connection, OpenFlags, Transaction, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use uuid::Uuid;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Cloneable, thread-safe handle to one catalog database.
#[derive(Clone)]
pub struct Database {
    inner: Arc<Inner>,
}

struct Inner {
    target: Target,
    counters: TxCounters,
    // Keeps a `memdb` database alive between units of work.
    _anchor: Option<Mutex<Connection>>,
}

#[derive(Debug, Clone)]
enum Target {
    File(PathBuf),
    Memory(String),
}

impl Target {
    fn mode(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory(_) => "memory",
        }
    }

    fn open(&self) -> rusqlite::Result<Connection> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        match self {
            Self::File(path) => Connection::open_with_flags(path, flags),
            Self::Memory(uri) => Connection::open_with_flags(uri, flags),
        }
    }
}

impl Database {
    /// Opens a catalog file and applies all pending migrations.
    ///
    /// # Side effects
    /// - Creates the file when missing.
    /// - Emits `db_open` logging events with duration and status.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let target = Target::File(path.as_ref().to_path_buf());
        let bootstrap = open_and_bootstrap(&target)?;
        drop(bootstrap);
        Ok(Self::with_target(target, None))
    }

    /// Opens a private in-memory catalog and applies all pending migrations.
    ///
    /// Every connection handed out by the returned handle observes the same
    /// data, so relation fetches in fresh transactions see committed rows.
    /// The catalog lives in the `memdb` VFS rather than a shared cache, so
    /// lock conflicts surface as `SQLITE_BUSY` and honor the busy timeout.
    pub fn open_in_memory() -> DbResult<Self> {
        let target = Target::Memory(format!("file:/datamanager-{}?vfs=memdb", Uuid::new_v4()));
        let anchor = open_and_bootstrap(&target)?;
        Ok(Self::with_target(target, Some(Mutex::new(anchor))))
    }

    fn with_target(target: Target, anchor: Option<Mutex<Connection>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                target,
                counters: TxCounters::default(),
                _anchor: anchor,
            }),
        }
    }

    /// Opens a new configured connection to this catalog.
    pub fn connect(&self) -> DbResult<Connection> {
        let conn = self.inner.target.open()?;
        configure_connection(&conn)?;
        Ok(conn)
    }

    /// Runs read-only `work` inside a new deferred transaction on a new
    /// connection.
    ///
    /// Commits when `work` returns `Ok`, rolls back otherwise. The
    /// transaction is independent of any transaction the caller may hold.
    pub fn in_transaction<T, E, F>(&self, scope: &str, work: F) -> Result<T, E>
    where
        E: From<DbError>,
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
    {
        self.run_transaction(scope, TransactionBehavior::Deferred, work)
    }

    /// Runs `work` inside a new `IMMEDIATE` transaction on a new connection.
    ///
    /// The write lock is acquired at `BEGIN`, where a busy writer is retried
    /// until the busy timeout elapses. Use this for every unit that writes.
    pub fn in_write_transaction<T, E, F>(&self, scope: &str, work: F) -> Result<T, E>
    where
        E: From<DbError>,
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
    {
        self.run_transaction(scope, TransactionBehavior::Immediate, work)
    }

    fn run_transaction<T, E, F>(
        &self,
        scope: &str,
        behavior: TransactionBehavior,
        work: F,
    ) -> Result<T, E>
    where
        E: From<DbError>,
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
    {
        let started_at = Instant::now();
        let mut conn = self.connect()?;
        let tx = conn
            .transaction_with_behavior(behavior)
            .map_err(DbError::from)?;
        debug!(
            "event=tx_begin module=db status=start scope={scope} behavior={}",
            behavior_label(behavior)
        );

        match work(&tx) {
            Ok(value) => match tx.commit() {
                Ok(()) => {
                    self.inner.counters.record_commit();
                    debug!(
                        "event=tx_commit module=db status=ok scope={scope} duration_ms={}",
                        started_at.elapsed().as_millis()
                    );
                    Ok(value)
                }
                Err(err) => {
                    self.inner.counters.record_rollback();
                    error!(
                        "event=tx_commit module=db status=error scope={scope} error_code=commit_failed error={err}"
                    );
                    Err(DbError::from(err).into())
                }
            },
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    error!(
                        "event=tx_rollback module=db status=error scope={scope} error={rollback_err}"
                    );
                }
                self.inner.counters.record_rollback();
                warn!(
                    "event=tx_rollback module=db status=ok scope={scope} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }

    /// Transaction bookkeeping shared by all clones of this handle.
    pub fn counters(&self) -> &TxCounters {
        &self.inner.counters
    }

    pub fn commit_count(&self) -> usize {
        self.inner.counters.commit_count()
    }

    pub fn rollback_count(&self) -> usize {
        self.inner.counters.rollback_count()
    }

    pub fn reset_counters(&self) {
        self.inner.counters.reset();
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("target", &self.inner.target)
            .finish_non_exhaustive()
    }
}

fn open_and_bootstrap(target: &Target) -> DbResult<Connection> {
    let started_at = Instant::now();
    let mode = target.mode();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match target.open() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={err}",
                started_at.elapsed().as_millis()
            );
            return Err(err.into());
        }
    };

    let bootstrapped = configure_connection(&conn).and_then(|()| apply_migrations(&mut conn));
    match bootstrapped {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={err}",
                started_at.elapsed().as_millis()
            );
            Err(err)
        }
    }
}

fn behavior_label(behavior: TransactionBehavior) -> &'static str {
    match behavior {
        TransactionBehavior::Immediate => "immediate",
        TransactionBehavior::Exclusive => "exclusive",
        _ => "deferred",
    }
}

fn configure_connection(conn: &Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(())
}
