//! Interactive form prompts
//!
//! Walks a [`Form`] field by field with dialoguer. Text and date fields are
//! line inputs pre-filled with the current value and committed on Enter;
//! pick fields are selection lists of display labels.

use console::style;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use miette::{IntoDiagnostic, Result};

use crate::core::entity::Entity;
use crate::core::error::CrudError;
use crate::form::{FieldBinding, FieldKind, Form, FormField, DATE_TIME_FORMAT};

const NONE_LABEL: &str = "(none)";

pub struct FormPrompter {
    theme: ColorfulTheme,
}

impl Default for FormPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl FormPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }

    /// Prompt for every field in order
    pub fn fill<E: Entity>(&self, form: &Form<E>) -> Result<()> {
        let action = if form.is_new() { "New" } else { "Edit" };
        println!(
            "{} {}",
            style(format!("{} {}", action, E::NAME)).bold().cyan(),
            style("(Enter commits each field)").dim()
        );
        println!();

        for field in form.fields() {
            self.prompt_field(field)?;
        }
        Ok(())
    }

    fn prompt_field(&self, field: &FormField) -> Result<()> {
        match field.kind() {
            FieldKind::Pick => self.prompt_pick(field),
            FieldKind::Text | FieldKind::Date => loop {
                let value: String = Input::with_theme(&self.theme)
                    .with_prompt(self.format_prompt(field))
                    .with_initial_text(field.display_value()?)
                    .allow_empty(true)
                    .interact_text()
                    .into_diagnostic()?;

                match field.input(&value) {
                    Ok(()) => return Ok(()),
                    Err(CrudError::Validation(errors)) => {
                        eprintln!("{} {}", style("✗").red(), errors);
                    }
                    Err(e) => return Err(e.into()),
                }
            },
        }
    }

    fn prompt_pick(&self, field: &FormField) -> Result<()> {
        let options = field.options()?;
        if options.is_empty() {
            eprintln!(
                "{} No rows to choose from for {}",
                style("!").yellow(),
                style(field.label()).yellow()
            );
            return Ok(());
        }

        let current = match field.binding() {
            FieldBinding::Pick { property, .. } => property.get(),
            _ => None,
        };

        let offset = usize::from(!field.is_required());
        let mut items: Vec<String> = Vec::with_capacity(options.len() + offset);
        if offset == 1 {
            items.push(NONE_LABEL.to_string());
        }
        items.extend(options.iter().map(|o| format!("{} (#{})", o.label, o.id)));

        let default = current
            .and_then(|id| options.iter().position(|o| o.id == id))
            .map_or(0, |i| i + offset);

        let selection = Select::with_theme(&self.theme)
            .with_prompt(self.format_prompt(field))
            .items(&items)
            .default(default)
            .interact()
            .into_diagnostic()?;

        let picked = selection
            .checked_sub(offset)
            .and_then(|i| options.get(i))
            .map(|o| o.id);
        field.pick(picked)?;
        Ok(())
    }

    /// Format the prompt for a field
    fn format_prompt(&self, field: &FormField) -> String {
        let mut prompt = field.label().to_string();
        if field.kind() == FieldKind::Date {
            prompt.push_str(&format!(" [{}]", DATE_TIME_FORMAT));
        }
        if field.is_required() {
            prompt.push_str(" *");
        }
        prompt
    }
}
