//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs, entity::EntityCommands, init::InitArgs,
};
use crate::core::Config;

#[derive(Parser)]
#[command(name = "clinic")]
#[command(author, version, about = "Clinic records manager")]
#[command(long_about = "Manage patients, doctors, drugs and medical records in a local SQLite database.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Database file (default: from config, then the platform data directory)
    #[arg(long, global = true, env = "CLINIC_DATABASE")]
    pub database: Option<PathBuf>,

    /// Layered configuration, loaded once in `main`
    #[arg(skip)]
    pub config: Config,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database and its tables
    Init(InitArgs),

    /// Patient records
    #[command(subcommand)]
    Patient(EntityCommands),

    /// Doctor records
    #[command(subcommand)]
    Doctor(EntityCommands),

    /// Quantity units (mg, ml, tablet, ...)
    #[command(subcommand)]
    Unit(EntityCommands),

    /// Drugs
    #[command(subcommand)]
    Drug(EntityCommands),

    /// Prescriptions issued by doctors
    #[command(subcommand)]
    Prescription(EntityCommands),

    /// Medical records (check-ups)
    #[command(subcommand)]
    Record(EntityCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (tsv for tables)
    #[default]
    Auto,
    /// YAML format
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}

impl OutputFormat {
    /// Parse a configured default (`default_format` in config)
    pub fn from_config(value: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(value, true).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_output_format_from_config() {
        assert_eq!(OutputFormat::from_config("CSV"), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::from_config("md"), Some(OutputFormat::Md));
        assert_eq!(OutputFormat::from_config("xml"), None);
    }
}
