//! Finder kind for backups.

use super::chain::Finder;
use super::query::FinderKind;
use super::spec::{FilterSet, FilterSpec, SortCriterion};
use crate::model::{Backup, Id};
use crate::repo::records::BackupRecord;
use std::sync::Arc;

/// Marker for the backup finder kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backups;

impl FinderKind for Backups {
    const NAME: &'static str = "backup";
    type Sort = BackupSort;
    type Filters = BackupFilters;
    type Raw = BackupRecord;
    // Shared so member files can point back at their backup.
    type Model = Arc<Backup>;
}

pub type BackupFinder = Finder<Backups>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupSort {
    Label,
    VolumeId,
    CreationDate,
    RegistrationDate,
}

impl SortCriterion for BackupSort {
    const ALL: &'static [Self] = &[
        Self::Label,
        Self::VolumeId,
        Self::CreationDate,
        Self::RegistrationDate,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::Label => "label",
            Self::VolumeId => "volume_id",
            Self::CreationDate => "creation_date",
            Self::RegistrationDate => "registration_date",
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Label => "backups.label",
            Self::VolumeId => "backups.volume_id",
            Self::CreationDate => "backups.creation_date",
            Self::RegistrationDate => "backups.registration_date",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupFilters {
    pub label: Option<String>,
    pub volume_id: Option<String>,
    /// Only backups containing the managed file with this id.
    pub file_id: Option<String>,
}

const LABEL: &str = "label";
const VOLUME_ID: &str = "volume_id";
const FILE_ID: &str = "file_id";

impl FilterSet for BackupFilters {
    const NAMES: &'static [&'static str] = &[LABEL, VOLUME_ID, FILE_ID];

    fn set(&mut self, name: &str, value: Option<String>) -> bool {
        let slot = match name {
            LABEL => &mut self.label,
            VOLUME_ID => &mut self.volume_id,
            FILE_ID => &mut self.file_id,
            _ => return false,
        };
        *slot = value;
        true
    }

    fn active(&self) -> Vec<FilterSpec> {
        [
            (LABEL, &self.label),
            (VOLUME_ID, &self.volume_id),
            (FILE_ID, &self.file_id),
        ]
        .into_iter()
        .filter_map(|(name, value)| {
            value.as_ref().map(|value| FilterSpec {
                name,
                value: value.clone(),
            })
        })
        .collect()
    }
}

impl Finder<Backups> {
    pub fn with_label(&self, label: Option<&str>) -> Self {
        self.with_filters(|filters| filters.label = label.map(str::to_string))
    }

    pub fn with_volume_id(&self, volume_id: Option<Id>) -> Self {
        self.with_filters(|filters| filters.volume_id = volume_id.map(|id| id.to_string()))
    }

    /// Restricts results to backups holding the managed file `file_id`.
    pub fn with_file_id(&self, file_id: Option<Id>) -> Self {
        self.with_filters(|filters| filters.file_id = file_id.map(|id| id.to_string()))
    }
}
