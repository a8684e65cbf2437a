//! Application settings.
//!
//! Read from an optional TOML file, then overridden by `STUDYFLOW_DB` and
//! `STUDYFLOW_USER` from the environment. Every setting has a default, so a
//! missing file is not an error.

use crate::error::ConfigError;
use crate::models::{KeyMap, UserId};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "studyflow.toml";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: PathBuf,
    /// Account whose cards the desktop app reviews.
    pub user_id: UserId,
    pub keys: KeyMap,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("db.sqlite3"),
            user_id: 1,
            keys: KeyMap::default(),
        }
    }
}

impl AppConfig {
    /// Loads `path` if it exists and applies environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_file(path)?.with_overrides(|key| std::env::var(key).ok())
    }

    /// Reads `path` alone, falling back to defaults when it does not exist.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        log::info!("Loading config from {}", path.display());
        Ok(toml::from_str(&fs::read_to_string(path)?)?)
    }

    /// Applies overrides looked up by environment variable name.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(path) = lookup("STUDYFLOW_DB") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(value) = lookup("STUDYFLOW_USER") {
            self.user_id = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                key: "STUDYFLOW_USER",
                value,
            })?;
        }
        Ok(self)
    }
}
