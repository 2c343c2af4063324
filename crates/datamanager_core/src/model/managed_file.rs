//! Managed file domain object.

use super::{Fingerprint, Id};
use crate::lazy::LazyValue;
use crate::repo::RepoResult;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A file tracked by the catalog, with its fingerprint history.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct ManagedFile {
    id: Id,
    path: PathBuf,
    fingerprints: LazyValue<Vec<Fingerprint>>,
}

impl ManagedFile {
    pub fn new(
        id: Id,
        path: impl Into<PathBuf>,
        fingerprints: LazyValue<Vec<Fingerprint>>,
    ) -> Self {
        Self {
            id,
            path: path.into(),
            fingerprints,
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the fingerprints ordered by timestamp, loading them on first use.
    ///
    /// # Errors
    /// - `NotFound` when the file was deleted before the first access.
    /// - `Db` on storage failures; a later call retries.
    pub fn fingerprints(&self) -> RepoResult<&[Fingerprint]> {
        self.fingerprints.get().map(Vec::as_slice)
    }

    /// Gives access to the relation holder without forcing it.
    pub fn fingerprints_value(&self) -> &LazyValue<Vec<Fingerprint>> {
        &self.fingerprints
    }
}

#[cfg(test)]
mod tests {
    use super::ManagedFile;
    use crate::lazy::LazyValue;
    use crate::model::{Fingerprint, Id};

    fn fingerprint(value: &str) -> Fingerprint {
        Fingerprint {
            id: Id::nil(),
            name: "1".to_string(),
            algorithm: "md5".to_string(),
            fingerprint: value.to_string(),
            timestamp_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn debug_renders_placeholder_until_forced() {
        let file = ManagedFile::new(
            Id::nil(),
            "/foo/bar/1",
            LazyValue::new(|| Ok(vec![fingerprint("1:f1")])),
        );

        let before = format!("{file:?}");
        assert!(before.contains("path: \"/foo/bar/1\""));
        assert!(before.contains("LazyValue(<not yet computed>)"));
        assert!(!file.fingerprints_value().is_initialized());

        assert_eq!(file.fingerprints().unwrap().len(), 1);
        let after = format!("{file:?}");
        assert!(after.contains("fingerprint: \"1:f1\""));
    }

    #[test]
    fn serializes_unrealized_fingerprints_as_null() {
        let file = ManagedFile::new(
            Id::nil(),
            "/foo/bar/1",
            LazyValue::new(|| Ok(vec![fingerprint("1:f1")])),
        );

        let json = serde_json::to_value(&file).unwrap();
        assert!(json["fingerprints"].is_null());

        file.fingerprints().unwrap();
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["fingerprints"][0]["fingerprint"], "1:f1");
    }
}
