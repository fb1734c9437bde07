//! Table schema: the list view's columns for one entity type

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

use crate::core::entity::Entity;
use crate::core::identity::RecordId;

/// Display format for date-time cells
pub const CELL_DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    /// The row's own id
    Id(RecordId),
    Text(String),
    DateTime(NaiveDateTime),
    /// Id of a related row
    Reference(RecordId),
    /// Empty/placeholder
    Empty,
}

impl CellValue {
    pub fn id_of<E: Entity>(entity: &E) -> Self {
        entity.id().map_or(CellValue::Empty, CellValue::Id)
    }

    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    pub fn date_time(value: Option<NaiveDateTime>) -> Self {
        value.map_or(CellValue::Empty, CellValue::DateTime)
    }

    pub fn reference(value: Option<RecordId>) -> Self {
        value.map_or(CellValue::Empty, CellValue::Reference)
    }

    /// Unstyled text, used for machine-readable output
    pub fn raw(&self) -> String {
        match self {
            CellValue::Id(id) | CellValue::Reference(id) => id.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::DateTime(dt) => dt.format(CELL_DATE_TIME_FORMAT).to_string(),
            CellValue::Empty => String::new(),
        }
    }

    /// Width of the displayed text (excluding ANSI styling)
    pub fn display_width(&self) -> usize {
        match self {
            CellValue::Empty => 1,
            other => other.raw().chars().count(),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Id(id) | CellValue::Reference(id) => serializer.serialize_i64(id.get()),
            CellValue::Empty => serializer.serialize_none(),
            other => serializer.serialize_str(&other.raw()),
        }
    }
}

type Extractor<E> = Box<dyn Fn(&E) -> CellValue>;

/// Ordered `(header, entity -> cell)` pairs
pub struct TableSchema<E> {
    columns: Vec<(&'static str, Extractor<E>)>,
}

impl<E: Entity> TableSchema<E> {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    pub fn column(mut self, header: &'static str, extract: impl Fn(&E) -> CellValue + 'static) -> Self {
        self.columns.push((header, Box::new(extract)));
        self
    }

    pub fn headers(&self) -> Vec<&'static str> {
        self.columns.iter().map(|(h, _)| *h).collect()
    }

    pub fn row(&self, entity: &E) -> Vec<CellValue> {
        self.columns.iter().map(|(_, f)| f(entity)).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<E: Entity> Default for TableSchema<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_raw_values() {
        let when = NaiveDate::from_ymd_opt(2023, 11, 2)
            .unwrap()
            .and_hms_opt(8, 5, 59)
            .unwrap();
        let id = RecordId::new(12).unwrap();

        assert_eq!(CellValue::Id(id).raw(), "12");
        assert_eq!(CellValue::Reference(id).raw(), "12");
        assert_eq!(CellValue::DateTime(when).raw(), "2023-11-02 08:05");
        assert_eq!(CellValue::text("fever").raw(), "fever");
        assert_eq!(CellValue::Empty.raw(), "");
    }

    #[test]
    fn test_optional_constructors() {
        assert_eq!(CellValue::date_time(None), CellValue::Empty);
        assert_eq!(CellValue::reference(None), CellValue::Empty);
        assert_eq!(
            CellValue::reference(RecordId::new(3)),
            CellValue::Reference(RecordId::new(3).unwrap())
        );
    }

    #[test]
    fn test_display_width_counts_chars() {
        assert_eq!(CellValue::text("Zoë").display_width(), 3);
        assert_eq!(CellValue::Empty.display_width(), 1);
    }
}
