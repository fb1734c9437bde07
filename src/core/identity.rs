//! Record identity: surrogate numeric ids assigned by storage

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::core::error::{CrudError, Result};

/// A persisted row id. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    /// Returns `None` for zero or negative values
    pub fn new(value: i64) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors when parsing record ids from user input
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdParseError {
    #[error("empty id")]
    Empty,

    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("ids must be positive, got {0}")]
    NotPositive(i64),
}

impl FromStr for RecordId {
    type Err = IdParseError;

    /// Accepts `3` or `#3`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if digits.is_empty() {
            return Err(IdParseError::Empty);
        }
        let value: i64 = digits
            .parse()
            .map_err(|_| IdParseError::NotANumber(trimmed.to_string()))?;
        RecordId::new(value).ok_or(IdParseError::NotPositive(value))
    }
}

impl ToSql for RecordId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for RecordId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = i64::column_result(value)?;
        RecordId::new(raw).ok_or(FromSqlError::OutOfRange(raw))
    }
}

/// Write-once identity slot carried by every entity
#[derive(Debug, Default)]
pub struct Identity(Cell<Option<RecordId>>);

impl Identity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<RecordId> {
        self.0.get()
    }

    /// True until storage has assigned an id
    pub fn is_new(&self) -> bool {
        self.0.get().is_none()
    }

    /// Assign the storage id. Fails if one is already set.
    pub fn assign(&self, id: RecordId) -> Result<()> {
        match self.0.get() {
            Some(existing) => Err(CrudError::invalid_state(format!(
                "id already assigned ({}), cannot reassign to {}",
                existing, id
            ))),
            None => {
                self.0.set(Some(id));
                Ok(())
            }
        }
    }

    /// Used when hydrating from storage or copying an entity; ignored once set.
    pub(crate) fn restore(&self, id: Option<RecordId>) {
        if self.0.get().is_none() {
            self.0.set(id);
        }
    }
}
