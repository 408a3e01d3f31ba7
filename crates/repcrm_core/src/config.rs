//! Runtime configuration shared by the FFI and CLI entry points.
//!
//! # Responsibility
//! - Read `CrmConfig` from a TOML file.
//! - Layer `REPCRM_*` environment overrides on top.
//!
//! # Invariants
//! - A missing config file yields defaults, not an error.
//! - Resolution order: explicit path, then `REPCRM_CONFIG`.
//! - Environment overrides always win over file values.

use crate::logging::{default_log_level, normalize_level};
use crate::model::UserId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "REPCRM_CONFIG";
pub const DB_PATH_ENV: &str = "REPCRM_DB_PATH";
pub const USER_ID_ENV: &str = "REPCRM_USER_ID";
pub const LOG_LEVEL_ENV: &str = "REPCRM_LOG_LEVEL";

const DEFAULT_DB_FILE_NAME: &str = "repcrm.sqlite3";

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    InvalidUserId(String),
    InvalidLogLevel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid config `{}`: {source}", path.display())
            }
            Self::InvalidUserId(value) => write!(f, "invalid user id `{value}`"),
            Self::InvalidLogLevel(value) => write!(f, "unsupported log level `{value}`"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::InvalidUserId(_) | Self::InvalidLogLevel(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrmConfig {
    /// SQLite file; defaults to `repcrm.sqlite3` in the working directory.
    pub db_path: Option<PathBuf>,
    pub log_level: Option<String>,
    /// Absolute directory for rolling logs; file logging is off when unset.
    pub log_dir: Option<PathBuf>,
    /// Signed-in broker; writes that need an owner fail without it.
    pub user_id: Option<UserId>,
    /// Origin used to build public media URLs.
    pub storage_base_url: Option<String>,
}

impl CrmConfig {
    /// Loads from `explicit` or `REPCRM_CONFIG`, then applies env overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses one TOML file; a missing file yields defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies overrides read through `lookup` (normally the process env).
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(db_path) = lookup(DB_PATH_ENV).filter(|value| !value.trim().is_empty()) {
            self.db_path = Some(PathBuf::from(db_path.trim()));
        }
        if let Some(user_id) = lookup(USER_ID_ENV).filter(|value| !value.trim().is_empty()) {
            let parsed = uuid::Uuid::parse_str(user_id.trim())
                .map_err(|_| ConfigError::InvalidUserId(user_id.clone()))?;
            self.user_id = Some(parsed);
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV).filter(|value| !value.trim().is_empty()) {
            self.log_level = Some(level.trim().to_string());
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(level) = self.log_level.as_deref() {
            normalize_level(level).map_err(|_| ConfigError::InvalidLogLevel(level.to_string()))?;
        }
        Ok(())
    }

    pub fn resolved_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE_NAME))
    }

    pub fn resolved_log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(default_log_level())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CrmConfig, DB_PATH_ENV, LOG_LEVEL_ENV, USER_ID_ENV};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CrmConfig::from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, CrmConfig::default());
        assert_eq!(config.resolved_db_path(), PathBuf::from("repcrm.sqlite3"));
    }

    #[test]
    fn file_values_are_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repcrm.toml");
        std::fs::write(
            &path,
            r#"
db_path = "/var/lib/repcrm/crm.sqlite3"
log_level = "warn"
user_id = "6f1c1c36-6a63-4d43-9a0f-3b2d6a3c2f10"
storage_base_url = "https://crm.example.com"
"#,
        )
        .unwrap();

        let config = CrmConfig::from_file(&path).unwrap();
        assert_eq!(
            config.resolved_db_path(),
            PathBuf::from("/var/lib/repcrm/crm.sqlite3")
        );
        assert_eq!(config.resolved_log_level(), "warn");
        assert!(config.user_id.is_some());
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn malformed_toml_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "db_path = [").unwrap();

        let err = CrmConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn env_overrides_win_over_file() {
        let mut config = CrmConfig {
            db_path: Some(PathBuf::from("/from/file.sqlite3")),
            log_level: Some("info".to_string()),
            ..CrmConfig::default()
        };
        config
            .apply_overrides(env(&[
                (DB_PATH_ENV, "/from/env.sqlite3"),
                (LOG_LEVEL_ENV, "debug"),
                (USER_ID_ENV, "6f1c1c36-6a63-4d43-9a0f-3b2d6a3c2f10"),
            ]))
            .unwrap();

        assert_eq!(config.resolved_db_path(), PathBuf::from("/from/env.sqlite3"));
        assert_eq!(config.resolved_log_level(), "debug");
        assert!(config.user_id.is_some());
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        let mut config = CrmConfig::default();
        let err = config
            .apply_overrides(env(&[(USER_ID_ENV, "not-a-uuid")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUserId(_)));

        config.log_level = Some("loud".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }
}
