//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Local config file, looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "clinic.yaml";

/// Database file name inside the platform data directory
const DEFAULT_DATABASE_FILE: &str = "clinic.db";

/// clinic configuration with layered hierarchy
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file
    pub database: Option<PathBuf>,

    /// Default output format
    pub default_format: Option<String>,

    /// Log filter directive (e.g., "clinic=debug")
    pub log: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/clinic/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 3. Local config (./clinic.yaml)
        if let Some(local) = Self::read_file(Path::new(LOCAL_CONFIG_FILE)) {
            config.merge(local);
        }

        // 4. Environment variables
        if let Ok(database) = std::env::var("CLINIC_DATABASE") {
            if !database.is_empty() {
                config.database = Some(PathBuf::from(database));
            }
        }
        if let Ok(log) = std::env::var("CLINIC_LOG") {
            if !log.is_empty() {
                config.log = Some(log);
            }
        }

        config
    }

    /// Parse a config file, ignoring missing or malformed files
    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config");
                None
            }
        }
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "clinic")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.log.is_some() {
            self.log = other.log;
        }
    }

    /// Configured database, falling back to the platform data directory
    /// and finally to the working directory
    pub fn database_path(&self) -> PathBuf {
        if let Some(ref path) = self.database {
            return path.clone();
        }
        directories::ProjectDirs::from("", "", "clinic")
            .map(|dirs| dirs.data_dir().join(DEFAULT_DATABASE_FILE))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_FILE))
    }
}
