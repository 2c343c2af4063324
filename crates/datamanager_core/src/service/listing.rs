//! Listing use-cases driving a terminal-style presentation.
//!
//! # Responsibility
//! - Validate listing options before any query runs.
//! - Stream files sorted by path and apply post-query filters.
//! - Render fingerprints, backups and backup members as text lines.
//!
//! # Invariants
//! - `max` is never combined with a post-query filter, since the cap would
//!   apply before filtering.
//! - Every failure is reported through `Presentation::notify_error` and also
//!   returned to the caller.

use super::data_manager::DataManager;
use crate::finder::{BackupSort, ManagedFileSort, SortDirection};
use crate::model::{Backup, BackupFile, Fingerprint, Id};
use crate::repo::{RepoError, RepoResult};
use log::{info, warn};
use regex::Regex;

/// Sink for rendered listing lines.
pub trait Presentation {
    fn output(&mut self, line: &str);

    fn notify_error(&mut self, message: &str);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilesOptions {
    pub render_fingerprints: bool,
    pub max: Option<u32>,
    /// Whole-path pattern.
    pub regex: Option<String>,
    pub fingerprint: Option<String>,
    /// Keep only files no longer present on disk.
    pub missing_only: bool,
}

impl ListFilesOptions {
    pub fn with_fingerprints(mut self, enabled: bool) -> Self {
        self.render_fingerprints = enabled;
        self
    }

    pub fn with_max(mut self, max: u32) -> Self {
        self.max = Some(max);
        self
    }

    pub fn with_regex(mut self, regex: impl Into<String>) -> Self {
        self.regex = Some(regex.into());
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    pub fn missing_only(mut self, enabled: bool) -> Self {
        self.missing_only = enabled;
        self
    }

    fn validate(&self) -> RepoResult<Option<Regex>> {
        if self.max.is_some() && (self.regex.is_some() || self.missing_only) {
            return Err(RepoError::InvalidOptions(
                "max cannot be used with regex or missing".to_string(),
            ));
        }
        self.regex
            .as_deref()
            .map(|pattern| {
                Regex::new(&format!("^(?:{pattern})$")).map_err(|err| {
                    RepoError::InvalidOptions(format!("invalid regex `{pattern}`: {err}"))
                })
            })
            .transpose()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListBackupsOptions {
    pub label: Option<String>,
    pub volume_id: Option<Id>,
    pub file_id: Option<Id>,
    pub render_files: bool,
}

impl ListBackupsOptions {
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_volume_id(mut self, volume_id: Id) -> Self {
        self.volume_id = Some(volume_id);
        self
    }

    pub fn with_file_id(mut self, file_id: Id) -> Self {
        self.file_id = Some(file_id);
        self
    }

    pub fn with_files(mut self, enabled: bool) -> Self {
        self.render_files = enabled;
        self
    }
}

/// Runs listings against one catalog and renders them to `P`.
pub struct ListingController<P: Presentation> {
    manager: DataManager,
    presentation: P,
}

impl<P: Presentation> ListingController<P> {
    pub fn new(manager: DataManager, presentation: P) -> Self {
        Self {
            manager,
            presentation,
        }
    }

    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    pub fn into_presentation(self) -> P {
        self.presentation
    }

    /// Lists managed files; returns how many were rendered.
    ///
    /// # Errors
    /// - `InvalidOptions` for a bad option combination or regex.
    /// - Any finder or relation error while streaming.
    pub fn list_files(&mut self, options: &ListFilesOptions) -> RepoResult<usize> {
        let listed = self.render_files(options);
        self.report("list_files", listed)
    }

    /// Lists backups sorted by label; returns how many were rendered.
    pub fn list_backups(&mut self, options: &ListBackupsOptions) -> RepoResult<usize> {
        let listed = self.render_backups(options);
        self.report("list_backups", listed)
    }

    fn report(&mut self, op: &str, listed: RepoResult<usize>) -> RepoResult<usize> {
        match &listed {
            Ok(count) => info!("event=listing module=service status=ok op={op} count={count}"),
            Err(err) => {
                warn!("event=listing module=service status=error op={op} error={err}");
                self.presentation.notify_error(&err.to_string());
            }
        }
        listed
    }

    fn render_files(&mut self, options: &ListFilesOptions) -> RepoResult<usize> {
        let pattern = options.validate()?;
        let finder = self
            .manager
            .find_managed_files()
            .sort(ManagedFileSort::Path, SortDirection::Ascending)
            .with_fingerprint(options.fingerprint.as_deref())
            .limit(options.max);

        let mut listed = 0;
        for file in finder.stream() {
            let file = file?;
            let path = file.path().to_string_lossy();
            if pattern.as_ref().is_some_and(|pattern| !pattern.is_match(&path)) {
                continue;
            }
            if options.missing_only && file.path().exists() {
                continue;
            }

            listed += 1;
            self.presentation.output(&format!("{listed:05}) {path}"));
            if options.render_fingerprints {
                for fingerprint in file.fingerprints()? {
                    self.presentation
                        .output(&format!("    {}", render_fingerprint(fingerprint)));
                }
            }
        }
        Ok(listed)
    }

    fn render_backups(&mut self, options: &ListBackupsOptions) -> RepoResult<usize> {
        let backups = self
            .manager
            .find_backups()
            .sort(BackupSort::Label, SortDirection::Ascending)
            .with_label(options.label.as_deref())
            .with_volume_id(options.volume_id)
            .with_file_id(options.file_id)
            .results()?;

        for backup in &backups {
            self.presentation.output(&render_backup(backup));
            if options.render_files {
                for member in backup.backup_files()? {
                    self.presentation
                        .output(&format!("    {}", render_backup_file(member)));
                }
            }
        }
        Ok(backups.len())
    }
}

/// `<timestamp_ms> <algorithm>:<fingerprint>`
pub fn render_fingerprint(fingerprint: &Fingerprint) -> String {
    format!(
        "{} {}:{}",
        fingerprint.timestamp_ms, fingerprint.algorithm, fingerprint.fingerprint
    )
}

/// Multi-line, labeled summary of one backup.
pub fn render_backup(backup: &Backup) -> String {
    let details = backup.details();
    let checked = details
        .latest_check_ms
        .map_or_else(|| "never".to_string(), |ms| ms.to_string());
    format!(
        "label:       {}\n\
         volume id:   {}\n\
         encrypted:   {}\n\
         created:     {}\n\
         registered:  {}\n\
         checked:     {}\n\
         base path:   {}",
        details.label,
        details.volume_id,
        details.encrypted,
        details.creation_ms,
        details.registration_ms,
        checked,
        details.base_path.display()
    )
}

/// The managed path, followed by the stored path when they differ.
pub fn render_backup_file(member: &BackupFile) -> String {
    let original = member.managed_file().path();
    if original == member.path() {
        original.display().to_string()
    } else {
        format!("{} as {}", original.display(), member.path().display())
    }
}
