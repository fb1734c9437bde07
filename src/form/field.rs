//! Form fields bound to entity properties

use std::fmt;
use std::rc::Rc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::core::error::{CrudError, Result, ValidationErrors};
use crate::core::identity::RecordId;
use crate::core::property::{Property, PropertyRef};
use crate::form::pick::{PickOption, PickSource};

/// Display and primary input format for date-time fields
pub const DATE_TIME_FORMAT: &str = "yyyy-MM-dd HH:mm";

const DATE_TIME_PATTERN: &str = "%Y-%m-%d %H:%M";

const ACCEPTED_DATE_TIME_PATTERNS: &[&str] = &[
    DATE_TIME_PATTERN,
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Parse user input as a date-time. A bare date means midnight.
pub fn parse_date_time(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    ACCEPTED_DATE_TIME_PATTERNS
        .iter()
        .find_map(|p| NaiveDateTime::parse_from_str(input, p).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

pub fn format_date_time(value: &NaiveDateTime) -> String {
    value.format(DATE_TIME_PATTERN).to_string()
}

/// Kind of input a field collects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Date,
    Pick,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text => write!(f, "text"),
            FieldKind::Date => write!(f, "date"),
            FieldKind::Pick => write!(f, "pick"),
        }
    }
}

/// The property a field reads and writes
pub enum FieldBinding {
    Text(Property<String>),
    Date(Property<Option<NaiveDateTime>>),
    Pick {
        property: Property<Option<RecordId>>,
        source: Rc<dyn PickSource>,
    },
}

/// One labelled, editable field
pub struct FormField {
    label: String,
    key: String,
    binding: FieldBinding,
    required: bool,
}

impl FormField {
    pub fn new(label: &str, binding: FieldBinding) -> Self {
        let label = label.trim().trim_end_matches(':').trim_end().to_string();
        let key = slugify(&label);
        Self {
            label,
            key,
            binding,
            required: false,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Slug of the label, e.g. `check-up-date`
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> FieldKind {
        match self.binding {
            FieldBinding::Text(_) => FieldKind::Text,
            FieldBinding::Date(_) => FieldKind::Date,
            FieldBinding::Pick { .. } => FieldKind::Pick,
        }
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub(crate) fn set_required(&mut self, required: bool) {
        self.required = required;
    }

    pub fn binding(&self) -> &FieldBinding {
        &self.binding
    }

    pub fn property(&self) -> PropertyRef {
        match &self.binding {
            FieldBinding::Text(p) => PropertyRef::from(p),
            FieldBinding::Date(p) => PropertyRef::from(p),
            FieldBinding::Pick { property, .. } => PropertyRef::from(property),
        }
    }

    /// Whether the bound property currently holds no value
    pub fn is_empty(&self) -> bool {
        match &self.binding {
            FieldBinding::Text(p) => p.with(|s| s.trim().is_empty()),
            FieldBinding::Date(p) => p.with(Option::is_none),
            FieldBinding::Pick { property, .. } => property.with(Option::is_none),
        }
    }

    /// Text shown for the current value; pick fields show the related row's label
    pub fn display_value(&self) -> Result<String> {
        match &self.binding {
            FieldBinding::Text(p) => Ok(p.get()),
            FieldBinding::Date(p) => Ok(p.get().map(|d| format_date_time(&d)).unwrap_or_default()),
            FieldBinding::Pick { property, source } => match property.get() {
                None => Ok(String::new()),
                Some(id) => Ok(source
                    .label_for(id)?
                    .unwrap_or_else(|| format!("#{}", id))),
            },
        }
    }

    /// Parse `input` and write it to the bound property.
    /// Invalid input leaves the property untouched.
    pub fn input(&self, input: &str) -> Result<()> {
        match &self.binding {
            FieldBinding::Text(p) => {
                p.set(input.to_string());
                Ok(())
            }
            FieldBinding::Date(p) => {
                if input.trim().is_empty() {
                    p.set(None);
                    return Ok(());
                }
                let parsed = parse_date_time(input).ok_or_else(|| {
                    self.invalid(format!(
                        "'{}' is not a date; expected {}",
                        input.trim(),
                        DATE_TIME_FORMAT
                    ))
                })?;
                p.set(Some(parsed));
                Ok(())
            }
            FieldBinding::Pick { property, source } => {
                if input.trim().is_empty() {
                    property.set(None);
                    return Ok(());
                }
                let id = self.resolve_pick(input.trim(), source.as_ref())?;
                property.set(Some(id));
                Ok(())
            }
        }
    }

    /// Select a related row by id, or clear the selection
    pub fn pick(&self, id: Option<RecordId>) -> Result<()> {
        match &self.binding {
            FieldBinding::Pick { property, source } => {
                if let Some(id) = id {
                    if source.label_for(id)?.is_none() {
                        return Err(self.invalid(format!(
                            "no {} with id {}",
                            source.entity_name(),
                            id
                        )));
                    }
                }
                property.set(id);
                Ok(())
            }
            _ => Err(CrudError::invalid_state(format!(
                "'{}' is a {} field, not a pick field",
                self.label,
                self.kind()
            ))),
        }
    }

    /// Candidate rows for a pick field; empty for other kinds
    pub fn options(&self) -> Result<Vec<PickOption>> {
        match &self.binding {
            FieldBinding::Pick { source, .. } => source.options(),
            _ => Ok(Vec::new()),
        }
    }

    pub fn validate(&self, errors: &mut ValidationErrors) {
        if self.required && self.is_empty() {
            errors.add(self.label.clone(), "is required");
        }
    }

    fn resolve_pick(&self, input: &str, source: &dyn PickSource) -> Result<RecordId> {
        let options = source.options()?;

        if let Ok(id) = input.parse::<RecordId>() {
            if options.iter().any(|o| o.id == id) {
                return Ok(id);
            }
            return Err(self.invalid(format!("no {} with id {}", source.entity_name(), id)));
        }

        let matches: Vec<&PickOption> = options
            .iter()
            .filter(|o| o.label.eq_ignore_ascii_case(input))
            .collect();
        match matches.as_slice() {
            [only] => Ok(only.id),
            [] => Err(self.invalid(format!("no {} named '{}'", source.entity_name(), input))),
            _ => Err(self.invalid(format!(
                "'{}' matches {} {} rows; use an id",
                input,
                matches.len(),
                source.entity_name()
            ))),
        }
    }

    fn invalid(&self, message: String) -> CrudError {
        let mut errors = ValidationErrors::new();
        errors.add(self.label.clone(), message);
        CrudError::Validation(errors)
    }
}

impl fmt::Debug for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormField")
            .field("label", &self.label)
            .field("kind", &self.kind())
            .field("required", &self.required)
            .finish()
    }
}

fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    for c in label.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}
