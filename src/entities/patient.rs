//! Patient entity

use chrono::NaiveDateTime;

use crate::controller::{CellValue, CrudController, TableSchema};
use crate::core::entity::{Entity, FieldDef};
use crate::core::error::Result;
use crate::core::identity::Identity;
use crate::core::property::{Property, PropertyRef};
use crate::core::registry::ControllerRegistry;
use crate::core::repository::Repository;

#[derive(Debug, Default)]
pub struct Patient {
    identity: Identity,
    pub name: Property<String>,
    pub birth_date: Property<Option<NaiveDateTime>>,
    pub phone: Property<String>,
    pub address: Property<String>,
}

impl Entity for Patient {
    const NAME: &'static str = "Patient";
    const TABLE: &'static str = "patient";
    const FIELDS: &'static [FieldDef<Self>] = &[
        FieldDef::text("name", |p: &Patient| PropertyRef::from(&p.name)),
        FieldDef::date_time("birth_date", |p: &Patient| PropertyRef::from(&p.birth_date)),
        FieldDef::text("phone", |p: &Patient| PropertyRef::from(&p.phone)),
        FieldDef::text("address", |p: &Patient| PropertyRef::from(&p.address)),
    ];

    fn identity(&self) -> &Identity {
        &self.identity
    }
}

impl Patient {
    /// Label shown in pick fields
    pub fn display_name(&self) -> String {
        self.name.get()
    }

    pub fn controller(registry: &ControllerRegistry) -> Result<CrudController<Self>> {
        let table = TableSchema::<Self>::new()
            .column("Id", CellValue::id_of)
            .column("Name", |p: &Patient| CellValue::text(p.name.get()))
            .column("Birth Date", |p: &Patient| CellValue::date_time(p.birth_date.get()))
            .column("Phone", |p: &Patient| CellValue::text(p.phone.get()))
            .column("Address", |p: &Patient| CellValue::text(p.address.get()));

        Ok(CrudController::new(
            Repository::new(registry.database()),
            table,
            |form, patient: &Patient, _| {
                Ok(form
                    .text("Name: ", &patient.name)
                    .required()
                    .date_time("Birth Date: ", &patient.birth_date)
                    .text("Phone: ", &patient.phone)
                    .text("Address: ", &patient.address)
                    .submit("Submit"))
            },
        ))
    }
}
