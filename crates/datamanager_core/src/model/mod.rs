//! Catalog domain model: managed files, fingerprints and backups.
//!
//! # Responsibility
//! - Define the value objects handed to presentation and test code.
//! - Expose one-to-many relations as lazily computed values.
//!
//! # Invariants
//! - Every domain object is identified by a process-wide unique `Id`.
//! - Reading a relation never requires the caller to manage a transaction.
//! - `Debug` and equality never force an unrealized relation.

pub mod backup;
pub mod fingerprint;
pub mod managed_file;

pub use backup::{Backup, BackupDetails, BackupFile};
pub use fingerprint::Fingerprint;
pub use managed_file::ManagedFile;

/// Stable identifier shared by all catalog records.
pub type Id = uuid::Uuid;
