//! Catalog configuration resolved from explicit values, environment and
//! defaults, in that order of precedence.

use crate::logging::{default_log_level, normalize_level, normalize_log_dir, LogSettings};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_ENV: &str = "DATAMANAGER_DB";
pub const LOG_LEVEL_ENV: &str = "DATAMANAGER_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "DATAMANAGER_LOG_DIR";

const APP_FOLDER: &str = ".datamanager";
const DB_FILE: &str = "fingerprints.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No database path was given and `$HOME` is unset.
    NoHomeDir,
    InvalidLogLevel(String),
    InvalidLogDir(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoHomeDir => write!(
                f,
                "cannot locate the default catalog: HOME is not set and no database path was given"
            ),
            Self::InvalidLogLevel(message) | Self::InvalidLogDir(message) => {
                write!(f, "{message}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Values given explicitly, e.g. on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub db_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    /// Logging stays off when `None`.
    pub log_dir: Option<PathBuf>,
}

impl CatalogConfig {
    /// Resolves against the process environment.
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    /// Resolves against an arbitrary variable lookup.
    pub fn resolve_with(
        overrides: ConfigOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let env_non_empty = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        let db_path = match overrides.db_path.or_else(|| env_non_empty(DB_ENV).map(PathBuf::from)) {
            Some(path) => path,
            None => {
                let home = env_non_empty("HOME").ok_or(ConfigError::NoHomeDir)?;
                PathBuf::from(home).join(APP_FOLDER).join("db").join(DB_FILE)
            }
        };

        let log_level = match overrides.log_level.or_else(|| env_non_empty(LOG_LEVEL_ENV)) {
            Some(level) => normalize_level(&level).map_err(ConfigError::InvalidLogLevel)?,
            None => default_log_level(),
        };

        let log_dir = match overrides
            .log_dir
            .or_else(|| env_non_empty(LOG_DIR_ENV).map(PathBuf::from))
        {
            Some(dir) => Some(normalize_log_dir(&dir).map_err(ConfigError::InvalidLogDir)?),
            None => None,
        };

        Ok(Self {
            db_path,
            log_level,
            log_dir,
        })
    }

    /// Logger settings, when a log directory is configured.
    pub fn log_settings(&self) -> Option<LogSettings> {
        let dir = self.log_dir.as_ref()?;
        LogSettings::new(self.log_level, dir).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::{CatalogConfig, ConfigError, ConfigOverrides};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_to_catalog_under_home() {
        let config =
            CatalogConfig::resolve_with(ConfigOverrides::default(), env(&[("HOME", "/home/ann")]))
                .unwrap();
        assert_eq!(
            config.db_path,
            PathBuf::from("/home/ann/.datamanager/db/fingerprints.db")
        );
        assert_eq!(config.log_dir, None);
        assert!(config.log_settings().is_none());
    }

    #[test]
    fn explicit_values_win_over_environment() {
        let overrides = ConfigOverrides {
            db_path: Some("/explicit.db".into()),
            log_level: Some("ERROR".to_string()),
            log_dir: None,
        };
        let config = CatalogConfig::resolve_with(
            overrides,
            env(&[
                ("DATAMANAGER_DB", "/env.db"),
                ("DATAMANAGER_LOG_LEVEL", "trace"),
                ("DATAMANAGER_LOG_DIR", "/var/log/dm"),
            ]),
        )
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/explicit.db"));
        assert_eq!(config.log_level, "error");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/dm")));
        assert_eq!(config.log_settings().unwrap().level(), "error");
    }

    #[test]
    fn invalid_values_are_reported() {
        let missing_home = CatalogConfig::resolve_with(ConfigOverrides::default(), env(&[]));
        assert_eq!(missing_home, Err(ConfigError::NoHomeDir));

        let relative_dir = CatalogConfig::resolve_with(
            ConfigOverrides::default(),
            env(&[("HOME", "/h"), ("DATAMANAGER_LOG_DIR", "logs")]),
        );
        assert!(matches!(relative_dir, Err(ConfigError::InvalidLogDir(_))));

        let bad_level = CatalogConfig::resolve_with(
            ConfigOverrides::default(),
            env(&[("HOME", "/h"), ("DATAMANAGER_LOG_LEVEL", "chatty")]),
        );
        assert!(matches!(bad_level, Err(ConfigError::InvalidLogLevel(_))));
    }
}
