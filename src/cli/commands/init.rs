//! `clinic init` command - create the database and its tables

use console::style;
use miette::Result;

use crate::cli::commands::utils::database_path;
use crate::cli::GlobalOpts;
use crate::core::database::Database;
use crate::core::entity::Entity;
use crate::entities::{self, Doctor, Drug, MedicalRecord, Patient, PrescriptionHeader, QtyUnit};

#[derive(clap::Args, Debug)]
pub struct InitArgs {}

const TABLES: &[&str] = &[
    Patient::TABLE,
    Doctor::TABLE,
    QtyUnit::TABLE,
    Drug::TABLE,
    PrescriptionHeader::TABLE,
    MedicalRecord::TABLE,
];

pub fn run(_args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let path = database_path(global);
    let existed = path.exists();

    let db = Database::open(&path)?;
    entities::ensure_schema(&db)?;

    if global.quiet {
        return Ok(());
    }

    let verb = if existed { "Checked" } else { "Initialized" };
    println!(
        "{} {} clinic database at {}",
        style("✓").green(),
        verb,
        style(path.display()).cyan()
    );
    println!();
    println!("Tables:");
    for table in TABLES {
        println!("  {}", table);
    }
    println!();
    println!("Next steps:");
    println!(
        "  {} Add a patient",
        style("clinic patient new --set name=\"Jane Doe\"").yellow()
    );
    println!("  {} List patients", style("clinic patient list").yellow());
    Ok(())
}
