//! Core of the data manager: a catalog of managed files, their fingerprints
//! and the backups holding them.
//!
//! Callers build immutable [`Finder`]s, run them, and read one-to-many
//! relations through [`LazyValue`]s that load on first access in a fresh
//! transaction.

pub mod config;
pub mod db;
pub mod finder;
pub mod lazy;
pub mod logging;
pub mod mapper;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{CatalogConfig, ConfigError, ConfigOverrides};
pub use db::{Database, DbError};
pub use finder::{
    BackupFinder, BackupSort, Finder, FinderStream, ManagedFileFinder, ManagedFileSort,
    SortDirection,
};
pub use lazy::LazyValue;
pub use logging::{default_log_level, init_logging, logging_status, LogSettings};
pub use model::{Backup, BackupDetails, BackupFile, Fingerprint, Id, ManagedFile};
pub use repo::catalog_repo::{NewBackup, NewFingerprint};
pub use repo::{RepoError, RepoResult};
pub use service::data_manager::{DataManager, LoaderStats};
pub use service::listing::{ListBackupsOptions, ListFilesOptions, ListingController, Presentation};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
