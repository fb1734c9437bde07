//! Shared utilities for CLI commands

use std::path::PathBuf;

use miette::Result;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::database::Database;
use crate::core::registry::ControllerRegistry;
use crate::entities;

/// Database path: `--database`/`CLINIC_DATABASE`, then config, then the default
pub fn database_path(global: &GlobalOpts) -> PathBuf {
    global
        .database
        .clone()
        .unwrap_or_else(|| global.config.database_path())
}

/// Open the database, make sure every table exists and register all controllers
pub fn open_registry(global: &GlobalOpts) -> Result<ControllerRegistry> {
    let path = database_path(global);
    let db = Database::open(&path)?;
    entities::ensure_schema(&db)?;

    let mut registry = ControllerRegistry::new(db);
    entities::register_all(&mut registry);
    Ok(registry)
}

/// The requested format, or the configured default when `--format auto`
pub fn resolve_format(global: &GlobalOpts) -> OutputFormat {
    if global.format != OutputFormat::Auto {
        return global.format;
    }
    global
        .config
        .default_format
        .as_deref()
        .and_then(OutputFormat::from_config)
        .unwrap_or(OutputFormat::Auto)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;

    fn global(format: OutputFormat, database: Option<&str>, config: Config) -> GlobalOpts {
        GlobalOpts {
            format,
            quiet: false,
            verbose: false,
            database: database.map(PathBuf::from),
            config,
        }
    }

    #[test]
    fn test_resolve_format_uses_loaded_config() {
        let config = Config {
            default_format: Some("csv".to_string()),
            ..Config::default()
        };
        assert_eq!(
            resolve_format(&global(OutputFormat::Auto, None, config.clone())),
            OutputFormat::Csv
        );
        assert_eq!(
            resolve_format(&global(OutputFormat::Json, None, config)),
            OutputFormat::Json
        );
        assert_eq!(
            resolve_format(&global(OutputFormat::Auto, None, Config::default())),
            OutputFormat::Auto
        );
    }

    #[test]
    fn test_database_path_prefers_flag_over_config() {
        let config = Config {
            database: Some(PathBuf::from("configured.db")),
            ..Config::default()
        };
        assert_eq!(
            database_path(&global(OutputFormat::Auto, Some("flag.db"), config.clone())),
            PathBuf::from("flag.db")
        );
        assert_eq!(
            database_path(&global(OutputFormat::Auto, None, config)),
            PathBuf::from("configured.db")
        );
    }
}
