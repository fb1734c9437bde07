//! Entity type definitions
//!
//! The clinic keeps the following records:
//!
//! - [`Patient`] - people seen at the clinic
//! - [`Doctor`] - practitioners and their specialization
//! - [`QtyUnit`] - units drugs are measured in
//! - [`Drug`] - drugs, each measured in a [`QtyUnit`]
//! - [`PrescriptionHeader`] - a prescription issued by a [`Doctor`]
//! - [`MedicalRecord`] - a check-up of a [`Patient`] by a [`Doctor`]

pub mod doctor;
pub mod drug;
pub mod medical_record;
pub mod patient;
pub mod prescription_header;
pub mod qty_unit;

pub use doctor::Doctor;
pub use drug::Drug;
pub use medical_record::MedicalRecord;
pub use patient::Patient;
pub use prescription_header::PrescriptionHeader;
pub use qty_unit::QtyUnit;

use crate::core::database::Database;
use crate::core::error::Result;
use crate::core::registry::ControllerRegistry;

/// Create every clinic table, referenced tables first
pub fn ensure_schema(db: &Database) -> Result<()> {
    db.ensure_table::<Patient>()?;
    db.ensure_table::<Doctor>()?;
    db.ensure_table::<QtyUnit>()?;
    db.ensure_table::<Drug>()?;
    db.ensure_table::<PrescriptionHeader>()?;
    db.ensure_table::<MedicalRecord>()?;
    Ok(())
}

/// Register a controller factory for every clinic entity
pub fn register_all(registry: &mut ControllerRegistry) {
    registry.register(Patient::controller);
    registry.register(Doctor::controller);
    registry.register(QtyUnit::controller);
    registry.register(Drug::controller);
    registry.register(PrescriptionHeader::controller);
    registry.register(MedicalRecord::controller);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_schema_creates_tables() {
        let db = Database::open_in_memory().unwrap();
        ensure_schema(&db).unwrap();
        for table in [
            "patient",
            "doctor",
            "qty_unit",
            "drug",
            "prescription_header",
            "medical_record",
        ] {
            assert!(db.table_exists(table).unwrap(), "missing table {table}");
        }
    }

    #[test]
    fn test_register_all() {
        let db = Database::open_in_memory().unwrap();
        let mut registry = ControllerRegistry::new(db);
        register_all(&mut registry);
        assert_eq!(registry.len(), 6);
        assert!(registry.is_registered::<MedicalRecord>());
    }
}
