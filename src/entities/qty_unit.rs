//! Quantity unit (mg, ml, tablet, ...) used by drugs

use crate::controller::{CellValue, CrudController, TableSchema};
use crate::core::entity::{Entity, FieldDef};
use crate::core::error::Result;
use crate::core::identity::Identity;
use crate::core::property::{Property, PropertyRef};
use crate::core::registry::ControllerRegistry;
use crate::core::repository::Repository;

#[derive(Debug, Default)]
pub struct QtyUnit {
    identity: Identity,
    pub name: Property<String>,
}

impl Entity for QtyUnit {
    const NAME: &'static str = "Qty Unit";
    const TABLE: &'static str = "qty_unit";
    const FIELDS: &'static [FieldDef<Self>] =
        &[FieldDef::text("name", |u: &QtyUnit| PropertyRef::from(&u.name))];

    fn identity(&self) -> &Identity {
        &self.identity
    }
}

impl QtyUnit {
    pub fn display_name(&self) -> String {
        self.name.get()
    }

    pub fn controller(registry: &ControllerRegistry) -> Result<CrudController<Self>> {
        let table = TableSchema::<Self>::new()
            .column("Id", CellValue::id_of)
            .column("Name", |u: &QtyUnit| CellValue::text(u.name.get()));

        Ok(CrudController::new(
            Repository::new(registry.database()),
            table,
            |form, unit: &QtyUnit, _| Ok(form.text("Name: ", &unit.name).required().submit("Submit")),
        ))
    }
}
