//! Medical record: one check-up of a patient by a doctor, optionally
//! with the prescription written at that visit

use chrono::NaiveDateTime;

use crate::controller::{CellValue, CrudController, TableSchema};
use crate::core::entity::{Entity, FieldDef};
use crate::core::error::Result;
use crate::core::identity::{Identity, RecordId};
use crate::core::property::{Property, PropertyRef};
use crate::core::registry::ControllerRegistry;
use crate::core::repository::Repository;
use crate::entities::{Doctor, Patient, PrescriptionHeader};
use crate::form::field::format_date_time;

#[derive(Debug, Default)]
pub struct MedicalRecord {
    identity: Identity,
    pub patient_id: Property<Option<RecordId>>,
    pub doctor_id: Property<Option<RecordId>>,
    pub prescription_header_id: Property<Option<RecordId>>,
    pub check_up_date: Property<Option<NaiveDateTime>>,
    pub symptom: Property<String>,
    pub treatment: Property<String>,
}

impl Entity for MedicalRecord {
    const NAME: &'static str = "Medical Record";
    const TABLE: &'static str = "medical_record";
    const FIELDS: &'static [FieldDef<Self>] = &[
        FieldDef::foreign_key("patient_id", Patient::TABLE, |r: &MedicalRecord| {
            PropertyRef::from(&r.patient_id)
        }),
        FieldDef::foreign_key("doctor_id", Doctor::TABLE, |r: &MedicalRecord| {
            PropertyRef::from(&r.doctor_id)
        }),
        FieldDef::foreign_key(
            "prescription_header_id",
            PrescriptionHeader::TABLE,
            |r: &MedicalRecord| PropertyRef::from(&r.prescription_header_id),
        ),
        FieldDef::date_time("check_up_date", |r: &MedicalRecord| {
            PropertyRef::from(&r.check_up_date)
        }),
        FieldDef::text("symptom", |r: &MedicalRecord| PropertyRef::from(&r.symptom)),
        FieldDef::text("treatment", |r: &MedicalRecord| PropertyRef::from(&r.treatment)),
    ];

    fn identity(&self) -> &Identity {
        &self.identity
    }
}

impl MedicalRecord {
    /// `#id date`, or just the date for unsaved records
    pub fn display_name(&self) -> String {
        let date = self
            .check_up_date
            .get()
            .map(|d| format_date_time(&d))
            .unwrap_or_default();
        match self.id() {
            Some(id) => format!("#{} {}", id, date).trim_end().to_string(),
            None => date,
        }
    }

    pub fn controller(registry: &ControllerRegistry) -> Result<CrudController<Self>> {
        let table = TableSchema::<Self>::new()
            .column("Id", CellValue::id_of)
            .column("Patient Id", |r: &MedicalRecord| {
                CellValue::reference(r.patient_id.get())
            })
            .column("Doctor Id", |r: &MedicalRecord| {
                CellValue::reference(r.doctor_id.get())
            })
            .column("Prescription Id", |r: &MedicalRecord| {
                CellValue::reference(r.prescription_header_id.get())
            })
            .column("Check Up Date", |r: &MedicalRecord| {
                CellValue::date_time(r.check_up_date.get())
            })
            .column("Symptom", |r: &MedicalRecord| CellValue::text(r.symptom.get()))
            .column("Treatment", |r: &MedicalRecord| {
                CellValue::text(r.treatment.get())
            });

        Ok(CrudController::new(
            Repository::new(registry.database()),
            table,
            |form, record: &MedicalRecord, registry| {
                Ok(form
                    .pick(
                        "Patient: ",
                        &record.patient_id,
                        registry.get::<Patient>()?,
                        Patient::display_name,
                    )
                    .required()
                    .pick(
                        "Doctor: ",
                        &record.doctor_id,
                        registry.get::<Doctor>()?,
                        Doctor::display_name,
                    )
                    .pick(
                        "Prescription: ",
                        &record.prescription_header_id,
                        registry.get::<PrescriptionHeader>()?,
                        PrescriptionHeader::display_name,
                    )
                    .date_time("Check Up Date: ", &record.check_up_date)
                    .required()
                    .text("Symptom: ", &record.symptom)
                    .required()
                    .text("Treatment: ", &record.treatment)
                    .submit("Submit"))
            },
        ))
    }
}
