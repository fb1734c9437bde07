//! Error taxonomy shared by the repository, forms, controllers and registry

use miette::Diagnostic;
use std::fmt;
use thiserror::Error;

use crate::core::identity::RecordId;

/// Result alias used throughout the engine
pub type Result<T> = std::result::Result<T, CrudError>;

/// Errors raised by CRUD operations
#[derive(Debug, Error, Diagnostic)]
pub enum CrudError {
    /// One or more form fields failed validation; nothing was persisted
    #[error("Validation failed: {0}")]
    #[diagnostic(
        code(clinic::validation),
        help("Correct the listed fields and submit again")
    )]
    Validation(ValidationErrors),

    #[error("{entity} #{id} not found")]
    #[diagnostic(
        code(clinic::not_found),
        help("Use the list command to see existing records")
    )]
    NotFound { entity: &'static str, id: RecordId },

    /// Storage failure, including constraint and referential-integrity violations
    #[error("Failed to persist {entity}: {source}")]
    #[diagnostic(code(clinic::persistence))]
    Persistence {
        entity: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Invalid state: {0}")]
    #[diagnostic(code(clinic::invalid_state))]
    InvalidState(String),

    #[error("No controller registered for {0}")]
    #[diagnostic(
        code(clinic::unregistered),
        help("Register a factory for this entity before resolving it")
    )]
    Unregistered(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CrudError {
    pub fn persistence(entity: &'static str, source: rusqlite::Error) -> Self {
        CrudError::Persistence { entity, source }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        CrudError::InvalidState(message.into())
    }

    /// Whether this is a storage constraint failure (NOT NULL, FOREIGN KEY, ...)
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            CrudError::Persistence { source, .. } => matches!(
                source.sqlite_error_code(),
                Some(rusqlite::ErrorCode::ConstraintViolation)
            ),
            _ => false,
        }
    }
}

impl From<ValidationErrors> for CrudError {
    fn from(errors: ValidationErrors) -> Self {
        CrudError::Validation(errors)
    }
}

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Field errors collected in form order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn count(&self) -> usize {
        self.errors.len()
    }

    /// Messages recorded against one field
    pub fn for_field(&self, field: &str) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// `Ok(())` when empty, otherwise the collected errors
    pub fn into_result(self) -> Result<()> {
        if self.has_errors() {
            Err(CrudError::Validation(self))
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}
