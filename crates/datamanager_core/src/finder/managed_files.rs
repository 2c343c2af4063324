//! Finder kind for managed files.

use super::chain::Finder;
use super::query::FinderKind;
use super::spec::{FilterSet, FilterSpec, SortCriterion};
use crate::model::ManagedFile;
use crate::repo::records::ManagedFileRecord;

/// Marker for the managed-file finder kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagedFiles;

impl FinderKind for ManagedFiles {
    const NAME: &'static str = "managed_file";
    type Sort = ManagedFileSort;
    type Filters = ManagedFileFilters;
    type Raw = ManagedFileRecord;
    type Model = ManagedFile;
}

pub type ManagedFileFinder = Finder<ManagedFiles>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagedFileSort {
    Path,
    Id,
}

impl SortCriterion for ManagedFileSort {
    const ALL: &'static [Self] = &[Self::Path, Self::Id];

    fn name(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Id => "id",
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Path => "files.path",
            Self::Id => "files.id",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagedFileFilters {
    /// Only files owning a fingerprint with this value.
    pub fingerprint: Option<String>,
}

const FINGERPRINT: &str = "fingerprint";

impl FilterSet for ManagedFileFilters {
    const NAMES: &'static [&'static str] = &[FINGERPRINT];

    fn set(&mut self, name: &str, value: Option<String>) -> bool {
        match name {
            FINGERPRINT => self.fingerprint = value,
            _ => return false,
        }
        true
    }

    fn active(&self) -> Vec<FilterSpec> {
        self.fingerprint
            .iter()
            .map(|value| FilterSpec {
                name: FINGERPRINT,
                value: value.clone(),
            })
            .collect()
    }
}

impl Finder<ManagedFiles> {
    /// Restricts results to files owning `fingerprint`; `None` clears.
    pub fn with_fingerprint(&self, fingerprint: Option<&str>) -> Self {
        self.with_filters(|filters| filters.fingerprint = fingerprint.map(str::to_string))
    }
}
