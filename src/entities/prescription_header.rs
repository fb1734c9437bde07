//! Prescription header: a named prescription a doctor issues

use chrono::NaiveDateTime;

use crate::controller::{CellValue, CrudController, TableSchema};
use crate::core::entity::{Entity, FieldDef};
use crate::core::error::Result;
use crate::core::identity::{Identity, RecordId};
use crate::core::property::{Property, PropertyRef};
use crate::core::registry::ControllerRegistry;
use crate::core::repository::Repository;
use crate::entities::Doctor;

#[derive(Debug, Default)]
pub struct PrescriptionHeader {
    identity: Identity,
    pub name: Property<String>,
    pub doctor_id: Property<Option<RecordId>>,
    pub issued_at: Property<Option<NaiveDateTime>>,
    pub note: Property<String>,
}

impl Entity for PrescriptionHeader {
    const NAME: &'static str = "Prescription";
    const TABLE: &'static str = "prescription_header";
    const FIELDS: &'static [FieldDef<Self>] = &[
        FieldDef::text("name", |p: &PrescriptionHeader| PropertyRef::from(&p.name)),
        FieldDef::foreign_key("doctor_id", Doctor::TABLE, |p: &PrescriptionHeader| {
            PropertyRef::from(&p.doctor_id)
        }),
        FieldDef::date_time("issued_at", |p: &PrescriptionHeader| {
            PropertyRef::from(&p.issued_at)
        }),
        FieldDef::text("note", |p: &PrescriptionHeader| PropertyRef::from(&p.note)),
    ];

    fn identity(&self) -> &Identity {
        &self.identity
    }
}

impl PrescriptionHeader {
    pub fn display_name(&self) -> String {
        self.name.get()
    }

    pub fn controller(registry: &ControllerRegistry) -> Result<CrudController<Self>> {
        let table = TableSchema::<Self>::new()
            .column("Id", CellValue::id_of)
            .column("Name", |p: &PrescriptionHeader| CellValue::text(p.name.get()))
            .column("Doctor Id", |p: &PrescriptionHeader| {
                CellValue::reference(p.doctor_id.get())
            })
            .column("Issued At", |p: &PrescriptionHeader| {
                CellValue::date_time(p.issued_at.get())
            })
            .column("Note", |p: &PrescriptionHeader| CellValue::text(p.note.get()));

        Ok(CrudController::new(
            Repository::new(registry.database()),
            table,
            |form, header: &PrescriptionHeader, registry| {
                Ok(form
                    .text("Name: ", &header.name)
                    .required()
                    .pick(
                        "Doctor: ",
                        &header.doctor_id,
                        registry.get::<Doctor>()?,
                        Doctor::display_name,
                    )
                    .date_time("Issued At: ", &header.issued_at)
                    .text("Note: ", &header.note)
                    .submit("Submit"))
            },
        ))
    }
}
