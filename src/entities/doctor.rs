//! Doctor entity

use crate::controller::{CellValue, CrudController, TableSchema};
use crate::core::entity::{Entity, FieldDef};
use crate::core::error::Result;
use crate::core::identity::Identity;
use crate::core::property::{Property, PropertyRef};
use crate::core::registry::ControllerRegistry;
use crate::core::repository::Repository;

#[derive(Debug, Default)]
pub struct Doctor {
    identity: Identity,
    pub name: Property<String>,
    pub specialization: Property<String>,
    pub phone: Property<String>,
}

impl Entity for Doctor {
    const NAME: &'static str = "Doctor";
    const TABLE: &'static str = "doctor";
    const FIELDS: &'static [FieldDef<Self>] = &[
        FieldDef::text("name", |d: &Doctor| PropertyRef::from(&d.name)),
        FieldDef::text("specialization", |d: &Doctor| {
            PropertyRef::from(&d.specialization)
        }),
        FieldDef::text("phone", |d: &Doctor| PropertyRef::from(&d.phone)),
    ];

    fn identity(&self) -> &Identity {
        &self.identity
    }
}

impl Doctor {
    pub fn display_name(&self) -> String {
        self.name.get()
    }

    pub fn controller(registry: &ControllerRegistry) -> Result<CrudController<Self>> {
        let table = TableSchema::<Self>::new()
            .column("Id", CellValue::id_of)
            .column("Name", |d: &Doctor| CellValue::text(d.name.get()))
            .column("Specialization", |d: &Doctor| {
                CellValue::text(d.specialization.get())
            })
            .column("Phone", |d: &Doctor| CellValue::text(d.phone.get()));

        Ok(CrudController::new(
            Repository::new(registry.database()),
            table,
            |form, doctor: &Doctor, _| {
                Ok(form
                    .text("Name: ", &doctor.name)
                    .required()
                    .text("Specialization: ", &doctor.specialization)
                    .text("Phone: ", &doctor.phone)
                    .submit("Submit"))
            },
        ))
    }
}
