//! Generic CRUD controller
//!
//! One controller drives one entity type through two states:
//!
//! - **List**: the loaded rows, in storage order. Rows can be deleted.
//! - **Editing**: a form bound to a new entity or a detached copy of a
//!   listed one. Submit persists and patches the list; cancel discards.
//!
//! The table and form layouts are injected at construction.

pub mod table;

pub use table::{CellValue, TableSchema};

use std::rc::Rc;

use crate::core::entity::Entity;
use crate::core::error::{CrudError, Result};
use crate::core::identity::RecordId;
use crate::core::registry::ControllerRegistry;
use crate::core::repository::Repository;
use crate::form::{Form, FormBuilder, SubmitOutcome};

/// Declares the form for an entity: receives the builder, the bound entity
/// and the registry (for resolving pick sources).
pub type FormSchema<E> = Box<dyn Fn(FormBuilder<E>, &E, &ControllerRegistry) -> Result<Form<E>>>;

/// Observable controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    List,
    /// `id` is `None` while creating a new entity
    Editing { id: Option<RecordId> },
}

enum Mode<E: Entity> {
    List,
    Editing(Form<E>),
}

pub struct CrudController<E: Entity> {
    repository: Repository<E>,
    table: TableSchema<E>,
    form_schema: FormSchema<E>,
    items: Vec<Rc<E>>,
    loaded: bool,
    mode: Mode<E>,
}

impl<E: Entity> CrudController<E> {
    pub fn new(
        repository: Repository<E>,
        table: TableSchema<E>,
        form_schema: impl Fn(FormBuilder<E>, &E, &ControllerRegistry) -> Result<Form<E>> + 'static,
    ) -> Self {
        Self {
            repository,
            table,
            form_schema: Box::new(form_schema),
            items: Vec::new(),
            loaded: false,
            mode: Mode::List,
        }
    }

    pub fn repository(&self) -> &Repository<E> {
        &self.repository
    }

    pub fn table(&self) -> &TableSchema<E> {
        &self.table
    }

    pub fn state(&self) -> ControllerState {
        match &self.mode {
            Mode::List => ControllerState::List,
            Mode::Editing(form) => ControllerState::Editing {
                id: form.target().id(),
            },
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, Mode::Editing(_))
    }

    fn require_list(&self, operation: &str) -> Result<()> {
        if self.is_editing() {
            return Err(CrudError::invalid_state(format!(
                "cannot {} {} while a form is open",
                operation,
                E::NAME
            )));
        }
        Ok(())
    }

    // ---- List ----

    /// Reload every row, replacing the in-memory list
    pub fn refresh(&mut self) -> Result<()> {
        let rows = self.repository.find_all()?;
        self.items = rows.into_iter().map(Rc::new).collect();
        self.loaded = true;
        tracing::debug!(entity = E::NAME, count = self.items.len(), "list refreshed");
        Ok(())
    }

    /// Load the list on first use
    pub fn ensure_loaded(&mut self) -> Result<()> {
        if !self.loaded {
            self.refresh()?;
        }
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn items(&self) -> &[Rc<E>] {
        &self.items
    }

    pub fn find(&self, id: RecordId) -> Option<&Rc<E>> {
        self.items.iter().find(|e| e.id() == Some(id))
    }

    pub fn position(&self, id: RecordId) -> Option<usize> {
        self.items.iter().position(|e| e.id() == Some(id))
    }

    pub fn headers(&self) -> Vec<&'static str> {
        self.table.headers()
    }

    pub fn rows(&self) -> Vec<Vec<CellValue>> {
        self.items.iter().map(|e| self.table.row(e)).collect()
    }

    /// Delete a row from storage and then from the list.
    /// On failure the list is left as it was.
    pub fn delete(&mut self, id: RecordId) -> Result<()> {
        self.require_list("delete")?;
        self.repository.delete(id)?;
        self.items.retain(|e| e.id() != Some(id));
        Ok(())
    }

    // ---- Editing ----

    fn open(&mut self, entity: E, registry: &ControllerRegistry) -> Result<&Form<E>> {
        let entity = Rc::new(entity);
        let builder = FormBuilder::new(Rc::clone(&entity), self.repository.clone());
        let form = (self.form_schema)(builder, &entity, registry)?;
        self.mode = Mode::Editing(form);
        match &self.mode {
            Mode::Editing(form) => Ok(form),
            Mode::List => Err(CrudError::invalid_state("form was not opened")),
        }
    }

    /// Open a form for a new entity
    pub fn create(&mut self, registry: &ControllerRegistry) -> Result<&Form<E>> {
        self.require_list("create")?;
        tracing::debug!(entity = E::NAME, "editing new entity");
        self.open(E::default(), registry)
    }

    /// Open a form on a copy of a listed entity
    pub fn select(&mut self, id: RecordId, registry: &ControllerRegistry) -> Result<&Form<E>> {
        self.require_list("select")?;
        self.ensure_loaded()?;
        let copy = self
            .find(id)
            .ok_or(CrudError::NotFound {
                entity: E::NAME,
                id,
            })?
            .detach()?;
        tracing::debug!(entity = E::NAME, %id, "editing entity");
        self.open(copy, registry)
    }

    pub fn form(&self) -> Option<&Form<E>> {
        match &self.mode {
            Mode::Editing(form) => Some(form),
            Mode::List => None,
        }
    }

    /// Persist the open form. On success the list is patched and the
    /// controller returns to List; on failure it stays in Editing.
    pub fn submit(&mut self) -> Result<SubmitOutcome> {
        let Mode::Editing(form) = &self.mode else {
            return Err(CrudError::invalid_state(format!(
                "no {} form is open to submit",
                E::NAME
            )));
        };
        let outcome = form.submit()?;
        let entity = Rc::clone(form.target());

        self.mode = Mode::List;
        match outcome {
            SubmitOutcome::Updated(id) => match self.position(id) {
                Some(index) => self.items[index] = entity,
                None if self.loaded => self.items.push(entity),
                None => {}
            },
            SubmitOutcome::Inserted(_) => {
                if self.loaded {
                    self.items.push(entity);
                }
            }
        }
        Ok(outcome)
    }

    /// Close the form without saving. Returns false if no form was open.
    pub fn cancel(&mut self) -> bool {
        match std::mem::replace(&mut self.mode, Mode::List) {
            Mode::Editing(_) => {
                tracing::debug!(entity = E::NAME, "edit cancelled");
                true
            }
            Mode::List => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::database::Database;
    use crate::entities::{self, Drug, MedicalRecord, Patient, QtyUnit};
    use chrono::NaiveDate;

    fn registry() -> ControllerRegistry {
        let db = Database::open_in_memory().unwrap();
        entities::ensure_schema(&db).unwrap();
        let mut registry = ControllerRegistry::new(db);
        entities::register_all(&mut registry);
        registry
    }

    fn add_patient(registry: &ControllerRegistry, name: &str) -> RecordId {
        let patients = registry.get::<Patient>().unwrap();
        let mut patients = patients.borrow_mut();
        let form = patients.create(registry).unwrap();
        form.set("name", name).unwrap();
        patients.submit().unwrap().id()
    }

    #[test]
    fn test_starts_in_list_state() {
        let registry = registry();
        let patients = registry.get::<Patient>().unwrap();
        let patients = patients.borrow();
        assert_eq!(patients.state(), ControllerState::List);
        assert!(!patients.is_loaded());
        assert!(patients.form().is_none());
    }

    #[test]
    fn test_create_submit_appends() {
        let registry = registry();
        let patients = registry.get::<Patient>().unwrap();
        patients.borrow_mut().refresh().unwrap();

        let id = add_patient(&registry, "Ada Lovelace");

        let patients = patients.borrow();
        assert_eq!(patients.state(), ControllerState::List);
        assert_eq!(patients.items().len(), 1);
        assert_eq!(patients.items()[0].id(), Some(id));
        assert_eq!(patients.items()[0].name.get(), "Ada Lovelace");
    }

    #[test]
    fn test_select_edit_submit_replaces_entry() {
        let registry = registry();
        let a = add_patient(&registry, "Ann");
        let b = add_patient(&registry, "Bob");

        let patients = registry.get::<Patient>().unwrap();
        let mut patients = patients.borrow_mut();
        patients.refresh().unwrap();

        let form = patients.select(a, &registry).unwrap();
        form.set("phone", "555-0100").unwrap();
        assert_eq!(
            patients.state(),
            ControllerState::Editing { id: Some(a) }
        );
        assert_eq!(patients.submit().unwrap(), SubmitOutcome::Updated(a));

        let ids: Vec<_> = patients.items().iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec![Some(a), Some(b)]);
        assert_eq!(patients.find(a).unwrap().phone.get(), "555-0100");
        assert_eq!(
            patients.repository().find_by_id(a).unwrap().phone.get(),
            "555-0100"
        );
    }

    #[test]
    fn test_cancel_discards_edits() {
        let registry = registry();
        let id = add_patient(&registry, "Cleo");

        let patients = registry.get::<Patient>().unwrap();
        let mut patients = patients.borrow_mut();
        patients.refresh().unwrap();

        let form = patients.select(id, &registry).unwrap();
        form.set("name", "Changed").unwrap();
        assert!(form.is_dirty());
        assert!(patients.cancel());
        assert!(!patients.cancel());

        assert_eq!(patients.find(id).unwrap().name.get(), "Cleo");
        assert_eq!(patients.repository().find_by_id(id).unwrap().name.get(), "Cleo");
    }

    #[test]
    fn test_failed_submit_stays_editing() {
        let registry = registry();
        let patients = registry.get::<Patient>().unwrap();
        let mut patients = patients.borrow_mut();
        patients.refresh().unwrap();

        patients.create(&registry).unwrap();
        let err = patients.submit().unwrap_err();
        assert!(matches!(err, CrudError::Validation(_)));
        assert_eq!(patients.state(), ControllerState::Editing { id: None });
        assert!(patients.items().is_empty());
        assert_eq!(patients.repository().count().unwrap(), 0);
    }

    #[test]
    fn test_wrong_state_operations() {
        let registry = registry();
        let id = add_patient(&registry, "Dee");
        let patients = registry.get::<Patient>().unwrap();
        let mut patients = patients.borrow_mut();

        assert!(matches!(
            patients.submit().err(),
            Some(CrudError::InvalidState(_))
        ));

        patients.create(&registry).unwrap();
        assert!(matches!(
            patients.create(&registry).err(),
            Some(CrudError::InvalidState(_))
        ));
        assert!(matches!(
            patients.select(id, &registry).err(),
            Some(CrudError::InvalidState(_))
        ));
        assert!(matches!(
            patients.delete(id).err(),
            Some(CrudError::InvalidState(_))
        ));
    }

    #[test]
    fn test_select_missing_is_not_found() {
        let registry = registry();
        let patients = registry.get::<Patient>().unwrap();
        let mut patients = patients.borrow_mut();
        let Err(err) = patients.select(RecordId::new(5).unwrap(), &registry) else {
            panic!("select of a missing id should fail");
        };
        assert!(matches!(err, CrudError::NotFound { .. }));
        assert_eq!(patients.state(), ControllerState::List);
    }

    #[test]
    fn test_delete_removes_from_list_and_storage() {
        let registry = registry();
        let keep = add_patient(&registry, "Keep");
        let gone = add_patient(&registry, "Gone");

        let patients = registry.get::<Patient>().unwrap();
        let mut patients = patients.borrow_mut();
        patients.refresh().unwrap();
        patients.delete(gone).unwrap();

        assert!(patients.find(gone).is_none());
        assert!(patients.find(keep).is_some());
        assert!(matches!(
            patients.repository().find_by_id(gone).unwrap_err(),
            CrudError::NotFound { .. }
        ));
    }

    #[test]
    fn test_delete_referenced_unit_leaves_state_unchanged() {
        let registry = registry();

        let units = registry.get::<QtyUnit>().unwrap();
        let unit_id = {
            let mut units = units.borrow_mut();
            units.refresh().unwrap();
            let form = units.create(&registry).unwrap();
            form.set("name", "mg").unwrap();
            units.submit().unwrap().id()
        };

        {
            let drugs = registry.get::<Drug>().unwrap();
            let mut drugs = drugs.borrow_mut();
            let form = drugs.create(&registry).unwrap();
            form.set("name", "Ibuprofen").unwrap();
            form.set("unit", "mg").unwrap();
            drugs.submit().unwrap();
        }

        let mut units = units.borrow_mut();
        let err = units.delete(unit_id).unwrap_err();
        assert!(matches!(err, CrudError::Persistence { .. }));
        assert!(err.is_constraint_violation());
        assert!(units.find(unit_id).is_some());
        assert!(units.repository().find_by_id(unit_id).is_ok());
    }

    #[test]
    fn test_pick_field_shows_related_name() {
        let registry = registry();
        for name in ["Al", "Bea", "Jane Doe", "Kim"] {
            add_patient(&registry, name);
        }
        let jane = RecordId::new(3).unwrap();
        let kim = RecordId::new(4).unwrap();

        let record_id = {
            let records = registry.get::<MedicalRecord>().unwrap();
            let mut records = records.borrow_mut();
            let form = records.create(&registry).unwrap();
            form.set("patient", "3").unwrap();
            form.set("check-up-date", "2024-04-02 10:30").unwrap();
            form.set("symptom", "Headache").unwrap();
            form.set("treatment", "Rest").unwrap();
            records.submit().unwrap().id()
        };

        let records = registry.get::<MedicalRecord>().unwrap();
        let mut records = records.borrow_mut();
        let form = records.select(record_id, &registry).unwrap();
        let patient = form.field("patient").unwrap();
        assert_eq!(patient.display_value().unwrap(), "Jane Doe");

        let record = Rc::clone(form.target());
        let before_date = record.check_up_date.get();
        patient.pick(Some(kim)).unwrap();

        assert_eq!(record.patient_id.get(), Some(kim));
        assert_eq!(patient.display_value().unwrap(), "Kim");
        assert_eq!(record.check_up_date.get(), before_date);
        assert_eq!(record.symptom.get(), "Headache");
        assert_eq!(record.treatment.get(), "Rest");
        assert_eq!(record.doctor_id.get(), None);
        assert_ne!(record.patient_id.get(), Some(jane));

        records.submit().unwrap();
        let stored = records.repository().find_by_id(record_id).unwrap();
        assert_eq!(stored.patient_id.get(), Some(kim));
        assert_eq!(
            stored.check_up_date.get(),
            NaiveDate::from_ymd_opt(2024, 4, 2)
                .unwrap()
                .and_hms_opt(10, 30, 0)
        );
    }
}
