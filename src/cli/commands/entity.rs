//! `clinic <entity>` commands - list, show, create, edit and delete records
//!
//! Every entity shares these commands. They drive the entity's controller
//! the way an interactive screen would: open a form, fill it, submit or
//! cancel.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::commands::utils::{open_registry, resolve_format};
use crate::cli::form::FormPrompter;
use crate::cli::helpers::{count_noun, parse_assignment};
use crate::cli::table::TableFormatter;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::controller::CrudController;
use crate::core::entity::Entity;
use crate::core::error::CrudError;
use crate::core::identity::RecordId;
use crate::core::registry::ControllerRegistry;
use crate::form::{Form, SubmitOutcome};

#[derive(Subcommand, Debug)]
pub enum EntityCommands {
    /// List records
    List(ListArgs),

    /// Show one record's form values
    Show(ShowArgs),

    /// Create a record
    New(NewArgs),

    /// Edit a record
    Edit(EditArgs),

    /// Delete a record
    Delete(DeleteArgs),

    /// Show the form's fields and their keys for --set
    Fields,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Show only the count
    #[arg(long)]
    pub count: bool,

    /// Limit the number of rows
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Record id (e.g., 3 or #3)
    pub id: RecordId,
}

#[derive(clap::Args, Debug)]
pub struct FieldValues {
    /// Field assignment as key=value (repeatable, e.g. --set name="Jane Doe")
    #[arg(long = "set", short = 's', value_name = "KEY=VALUE", value_parser = parse_assignment)]
    pub assignments: Vec<(String, String)>,

    /// Fill the form interactively
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    #[command(flatten)]
    pub values: FieldValues,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Record id (e.g., 3 or #3)
    pub id: RecordId,

    #[command(flatten)]
    pub values: FieldValues,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Record id (e.g., 3 or #3)
    pub id: RecordId,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// One field as shown by `show` and `fields`
#[derive(Debug, Serialize)]
struct FieldRow {
    key: String,
    label: String,
    kind: String,
    required: bool,
    value: String,
}

pub fn run<E: Entity>(cmd: EntityCommands, global: &GlobalOpts) -> Result<()> {
    let registry = open_registry(global)?;
    let controller = registry.get::<E>()?;
    let mut controller = controller.borrow_mut();

    match cmd {
        EntityCommands::List(args) => run_list(&mut controller, args, global),
        EntityCommands::Show(args) => run_show(&mut controller, &registry, args, global),
        EntityCommands::New(args) => {
            controller.create(&registry)?;
            run_submit(&mut controller, args.values, global)
        }
        EntityCommands::Edit(args) => {
            controller.select(args.id, &registry)?;
            run_submit(&mut controller, args.values, global)
        }
        EntityCommands::Delete(args) => run_delete(&mut controller, args, global),
        EntityCommands::Fields => run_fields(&mut controller, &registry, global),
    }
}

fn run_list<E: Entity>(
    controller: &mut CrudController<E>,
    args: ListArgs,
    global: &GlobalOpts,
) -> Result<()> {
    controller.refresh()?;

    if args.count {
        println!("{}", controller.items().len());
        return Ok(());
    }

    let headers = controller.headers();
    let mut rows = controller.rows();
    if let Some(limit) = args.limit {
        rows.truncate(limit);
    }

    let format = resolve_format(global);
    let output = TableFormatter::new(&headers, E::NAME)
        .with_summary(!global.quiet)
        .render(&rows, format)?;
    print!("{}", output);
    Ok(())
}

fn field_rows<E: Entity>(controller: &CrudController<E>) -> Result<Vec<FieldRow>> {
    let form = open_form(controller)?;
    form.fields()
        .iter()
        .map(|f| -> Result<FieldRow> {
            Ok(FieldRow {
                key: f.key().to_string(),
                label: f.label().to_string(),
                kind: f.kind().to_string(),
                required: f.is_required(),
                value: f.display_value()?,
            })
        })
        .collect()
}

fn run_show<E: Entity>(
    controller: &mut CrudController<E>,
    registry: &ControllerRegistry,
    args: ShowArgs,
    global: &GlobalOpts,
) -> Result<()> {
    controller.select(args.id, registry)?;
    let rows = field_rows(controller);
    controller.cancel();
    let rows = rows?;

    match resolve_format(global) {
        OutputFormat::Json => {
            let values: Vec<(&str, &str)> = rows
                .iter()
                .map(|r| (r.key.as_str(), r.value.as_str()))
                .collect();
            println!("{}", serde_json::to_string_pretty(&ordered(&values)).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            let values: Vec<(&str, &str)> = rows
                .iter()
                .map(|r| (r.key.as_str(), r.value.as_str()))
                .collect();
            print!("{}", serde_yml::to_string(&ordered(&values)).into_diagnostic()?);
        }
        _ => {
            let width = rows.iter().map(|r| r.label.len()).max().unwrap_or(0);
            println!(
                "{} {}",
                style(E::NAME).bold(),
                style(format!("#{}", args.id)).cyan()
            );
            for row in &rows {
                let value = if row.value.is_empty() {
                    style("-".to_string()).dim()
                } else {
                    style(row.value.clone())
                };
                println!("  {:<width$}  {}", row.label, value, width = width);
            }
        }
    }
    Ok(())
}

fn run_fields<E: Entity>(
    controller: &mut CrudController<E>,
    registry: &ControllerRegistry,
    global: &GlobalOpts,
) -> Result<()> {
    controller.create(registry)?;
    let rows = field_rows(controller);
    controller.cancel();
    let rows = rows?;

    match resolve_format(global) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&rows).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&rows).into_diagnostic()?);
        }
        _ => {
            for row in &rows {
                let marker = if row.required { "*" } else { "" };
                println!(
                    "{:<16} {:<6} {}{}",
                    style(&row.key).cyan(),
                    row.kind,
                    row.label,
                    style(marker).red()
                );
            }
        }
    }
    Ok(())
}

/// Apply assignments and/or prompts to the open form, then submit.
/// The form is cancelled if anything fails.
fn run_submit<E: Entity>(
    controller: &mut CrudController<E>,
    values: FieldValues,
    global: &GlobalOpts,
) -> Result<()> {
    let result = fill_and_submit(controller, &values);
    if result.is_err() {
        controller.cancel();
    }
    let outcome = result?;

    if !global.quiet {
        let verb = match outcome {
            SubmitOutcome::Inserted(_) => "Created",
            SubmitOutcome::Updated(_) => "Updated",
        };
        println!(
            "{} {} {} {}",
            style("✓").green(),
            verb,
            E::NAME,
            style(format!("#{}", outcome.id())).cyan()
        );
    } else if matches!(outcome, SubmitOutcome::Inserted(_)) {
        println!("{}", outcome.id());
    }
    Ok(())
}

fn open_form<E: Entity>(controller: &CrudController<E>) -> Result<&Form<E>> {
    let form = controller
        .form()
        .ok_or_else(|| CrudError::invalid_state(format!("no {} form is open", E::NAME)))?;
    Ok(form)
}

fn fill_and_submit<E: Entity>(
    controller: &mut CrudController<E>,
    values: &FieldValues,
) -> Result<SubmitOutcome> {
    {
        let form = open_form(controller)?;
        for (key, value) in &values.assignments {
            form.set(key, value)?;
        }
    }

    if !values.interactive {
        return Ok(controller.submit()?);
    }

    let prompter = FormPrompter::new();
    loop {
        prompter.fill(open_form(controller)?)?;
        match controller.submit() {
            Ok(outcome) => return Ok(outcome),
            Err(CrudError::Validation(errors)) => {
                eprintln!("{} {}", style("✗").red(), errors);
                eprintln!();
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn run_delete<E: Entity>(
    controller: &mut CrudController<E>,
    args: DeleteArgs,
    global: &GlobalOpts,
) -> Result<()> {
    // Fail with NotFound before asking for confirmation
    controller.repository().find_by_id(args.id)?;

    if !args.yes {
        print!("Delete {} #{}? [y/N] ", E::NAME, args.id);
        std::io::Write::flush(&mut std::io::stdout()).into_diagnostic()?;
        let mut input = String::new();
        std::io::stdin().read_line(&mut input).into_diagnostic()?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    controller.ensure_loaded()?;
    controller.delete(args.id)?;

    if !global.quiet {
        println!(
            "{} Deleted {} {} ({} left)",
            style("✓").green(),
            E::NAME,
            style(format!("#{}", args.id)).cyan(),
            count_noun(controller.items().len(), E::NAME)
        );
    }
    Ok(())
}

/// Serialize key/value pairs as a map, keeping their order
fn ordered<'a>(pairs: &'a [(&'a str, &'a str)]) -> OrderedPairs<'a> {
    OrderedPairs(pairs)
}

struct OrderedPairs<'a>(&'a [(&'a str, &'a str)]);

impl Serialize for OrderedPairs<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
