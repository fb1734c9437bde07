//! Entity trait - common interface for all persisted record types
//!
//! An entity declares its persisted fields once, in a static table of
//! [`FieldDef`]s. Repositories derive column lists from it, forms bind to
//! the properties it exposes, and detached copies are built from it.

use crate::core::error::{CrudError, Result};
use crate::core::identity::{Identity, RecordId};
use crate::core::property::{PropertyKind, PropertyRef, Value};

/// Descriptor of one persisted field
pub struct FieldDef<E> {
    pub column: &'static str,
    pub kind: PropertyKind,
    /// Referenced table, for foreign keys
    pub references: Option<&'static str>,
    pub property: fn(&E) -> PropertyRef,
}

impl<E> FieldDef<E> {
    pub const fn text(column: &'static str, property: fn(&E) -> PropertyRef) -> Self {
        Self {
            column,
            kind: PropertyKind::Text,
            references: None,
            property,
        }
    }

    pub const fn date_time(column: &'static str, property: fn(&E) -> PropertyRef) -> Self {
        Self {
            column,
            kind: PropertyKind::DateTime,
            references: None,
            property,
        }
    }

    pub const fn foreign_key(
        column: &'static str,
        references: &'static str,
        property: fn(&E) -> PropertyRef,
    ) -> Self {
        Self {
            column,
            kind: PropertyKind::ForeignKey,
            references: Some(references),
            property,
        }
    }

    /// Resolve this field's property on an entity
    pub fn bind(&self, entity: &E) -> PropertyRef {
        (self.property)(entity)
    }
}

/// Common trait for all clinic entities
pub trait Entity: Default + 'static {
    /// Human-readable type name (e.g., "Patient")
    const NAME: &'static str;

    /// Backing table
    const TABLE: &'static str;

    /// Persisted fields, in column order. The `id` column is implicit.
    const FIELDS: &'static [FieldDef<Self>];

    fn identity(&self) -> &Identity;

    fn id(&self) -> Option<RecordId> {
        self.identity().get()
    }

    fn is_new(&self) -> bool {
        self.identity().is_new()
    }

    fn field(&self, column: &str) -> Option<PropertyRef> {
        Self::FIELDS
            .iter()
            .find(|f| f.column == column)
            .map(|f| f.bind(self))
    }

    /// Current values of every declared field, in column order
    fn values(&self) -> Vec<Value> {
        Self::FIELDS.iter().map(|f| f.bind(self).value()).collect()
    }

    /// A copy with the same id and values but independent properties
    fn detach(&self) -> Result<Self> {
        let copy = Self::default();
        copy.identity().restore(self.id());
        for field in Self::FIELDS {
            field.bind(&copy).copy_from(&field.bind(self))?;
        }
        Ok(copy)
    }
}

/// Check that every declared kind matches the property its accessor returns
pub fn check_fields<E: Entity>() -> Result<()> {
    let sample = E::default();
    for field in E::FIELDS {
        let bound = field.bind(&sample).kind();
        if bound != field.kind {
            return Err(CrudError::invalid_state(format!(
                "{}.{} is declared {} but bound to a {} property",
                E::TABLE,
                field.column,
                field.kind,
                bound
            )));
        }
    }
    Ok(())
}
