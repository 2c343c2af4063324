//! Turns raw catalog records into domain objects.
//!
//! # Responsibility
//! - Copy scalar columns into domain values.
//! - Wire every one-to-many field to a `LazyValue`: already realized when
//!   the record carries the relation, otherwise backed by the
//!   [`RelationshipLoader`].
//!
//! # Invariants
//! - Mapping never touches the database.
//! - Producers capture only the owner id and a loader handle.

use crate::finder::DomainMapper;
use crate::lazy::LazyValue;
use crate::model::{Backup, BackupDetails, BackupFile, Fingerprint, ManagedFile};
use crate::repo::loader::{BackupMembers, FileFingerprints, RelationshipLoader};
use crate::repo::records::{BackupFileRecord, BackupRecord, FingerprintRecord, ManagedFileRecord};
use std::sync::{Arc, Weak};

/// Maps catalog records, deferring relations to a shared loader.
#[derive(Debug, Clone)]
pub struct CatalogMapper {
    loader: RelationshipLoader,
}

impl CatalogMapper {
    pub fn new(loader: RelationshipLoader) -> Self {
        Self { loader }
    }

    pub fn loader(&self) -> &RelationshipLoader {
        &self.loader
    }

    pub fn fingerprint(record: FingerprintRecord) -> Fingerprint {
        Fingerprint {
            id: record.id,
            name: record.name,
            algorithm: record.algorithm,
            fingerprint: record.value,
            timestamp_ms: record.timestamp_ms,
        }
    }

    pub fn managed_file(&self, record: ManagedFileRecord) -> ManagedFile {
        let fingerprints = match record.fingerprints {
            Some(resident) => LazyValue::ready(map_fingerprints(resident)),
            None => {
                let loader = self.loader.clone();
                let file_id = record.id;
                LazyValue::new(move || {
                    loader
                        .load::<FileFingerprints>(file_id)
                        .map(map_fingerprints)
                })
            }
        };
        ManagedFile::new(record.id, record.path, fingerprints)
    }

    /// Maps a backup; members hold a weak link back to the returned value.
    pub fn backup(&self, record: BackupRecord) -> Arc<Backup> {
        let details = BackupDetails {
            id: record.id,
            label: record.label,
            volume_id: record.volume_id,
            encrypted: record.encrypted,
            base_path: record.base_path.into(),
            creation_ms: record.creation_ms,
            registration_ms: record.registration_ms,
            latest_check_ms: record.latest_check_ms,
        };

        match record.backup_files {
            Some(resident) => Arc::new_cyclic(|owner: &Weak<Backup>| {
                let members = self.backup_files(resident, owner);
                Backup::new(details, LazyValue::ready(members))
            }),
            None => Arc::new_cyclic(|owner: &Weak<Backup>| {
                let mapper = self.clone();
                let owner = owner.clone();
                let backup_id = details.id;
                let members = LazyValue::new(move || {
                    mapper
                        .loader
                        .load::<BackupMembers>(backup_id)
                        .map(|records| mapper.backup_files(records, &owner))
                });
                Backup::new(details, members)
            }),
        }
    }

    /// Maps member records of the backup behind `owner`.
    pub fn backup_files(
        &self,
        records: Vec<BackupFileRecord>,
        owner: &Weak<Backup>,
    ) -> Vec<BackupFile> {
        records
            .into_iter()
            .map(|record| {
                BackupFile::new(
                    record.id,
                    record.path,
                    self.managed_file(record.managed_file),
                    owner.clone(),
                )
            })
            .collect()
    }
}

fn map_fingerprints(records: Vec<FingerprintRecord>) -> Vec<Fingerprint> {
    records.into_iter().map(CatalogMapper::fingerprint).collect()
}

impl DomainMapper<ManagedFileRecord> for CatalogMapper {
    type Model = ManagedFile;

    fn to_model(&self, raw: ManagedFileRecord) -> ManagedFile {
        self.managed_file(raw)
    }
}

impl DomainMapper<BackupRecord> for CatalogMapper {
    type Model = Arc<Backup>;

    fn to_model(&self, raw: BackupRecord) -> Arc<Backup> {
        self.backup(raw)
    }
}
