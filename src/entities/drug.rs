//! Drug entity, measured in a quantity unit

use crate::controller::{CellValue, CrudController, TableSchema};
use crate::core::entity::{Entity, FieldDef};
use crate::core::error::Result;
use crate::core::identity::{Identity, RecordId};
use crate::core::property::{Property, PropertyRef};
use crate::core::registry::ControllerRegistry;
use crate::core::repository::Repository;
use crate::entities::QtyUnit;

#[derive(Debug, Default)]
pub struct Drug {
    identity: Identity,
    pub name: Property<String>,
    pub qty_unit_id: Property<Option<RecordId>>,
    pub description: Property<String>,
}

impl Entity for Drug {
    const NAME: &'static str = "Drug";
    const TABLE: &'static str = "drug";
    const FIELDS: &'static [FieldDef<Self>] = &[
        FieldDef::text("name", |d: &Drug| PropertyRef::from(&d.name)),
        FieldDef::foreign_key("qty_unit_id", QtyUnit::TABLE, |d: &Drug| {
            PropertyRef::from(&d.qty_unit_id)
        }),
        FieldDef::text("description", |d: &Drug| PropertyRef::from(&d.description)),
    ];

    fn identity(&self) -> &Identity {
        &self.identity
    }
}

impl Drug {
    pub fn display_name(&self) -> String {
        self.name.get()
    }

    pub fn controller(registry: &ControllerRegistry) -> Result<CrudController<Self>> {
        let table = TableSchema::<Self>::new()
            .column("Id", CellValue::id_of)
            .column("Name", |d: &Drug| CellValue::text(d.name.get()))
            .column("Unit Id", |d: &Drug| CellValue::reference(d.qty_unit_id.get()))
            .column("Description", |d: &Drug| CellValue::text(d.description.get()));

        Ok(CrudController::new(
            Repository::new(registry.database()),
            table,
            |form, drug: &Drug, registry| {
                Ok(form
                    .text("Name: ", &drug.name)
                    .required()
                    .pick(
                        "Unit: ",
                        &drug.qty_unit_id,
                        registry.get::<QtyUnit>()?,
                        QtyUnit::display_name,
                    )
                    .text("Description: ", &drug.description)
                    .submit("Submit"))
            },
        ))
    }
}
