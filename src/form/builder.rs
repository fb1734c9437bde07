//! Fluent form builder
//!
//! A form schema is a chain of field declarations ending in [`FormBuilder::submit`]:
//!
//! ```ignore
//! builder
//!     .date_time("Check Up Date", &record.check_up_date)
//!     .required()
//!     .text("Symptom", &record.symptom)
//!     .pick("Patient", &record.patient_id, patients, Patient::display_name)
//!     .submit("Submit")
//! ```
//!
//! The builder only describes the form. Nothing is persisted until the
//! resulting [`Form`] is submitted.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use chrono::NaiveDateTime;

use crate::controller::CrudController;
use crate::core::entity::Entity;
use crate::core::error::{CrudError, Result, ValidationErrors};
use crate::core::identity::RecordId;
use crate::core::property::{Property, PropertyRef, Subscription};
use crate::core::repository::Repository;
use crate::form::field::{FieldBinding, FormField};
use crate::form::pick::{ControllerPick, PickSource};

/// Accumulates field declarations for one target entity
pub struct FormBuilder<E: Entity> {
    target: Rc<E>,
    repository: Repository<E>,
    fields: Vec<FormField>,
}

impl<E: Entity> FormBuilder<E> {
    pub fn new(target: Rc<E>, repository: Repository<E>) -> Self {
        Self {
            target,
            repository,
            fields: Vec::new(),
        }
    }

    pub fn target(&self) -> &E {
        &self.target
    }

    fn push(mut self, label: &str, binding: FieldBinding) -> Self {
        self.fields.push(FormField::new(label, binding));
        self
    }

    pub fn text(self, label: &str, property: &Property<String>) -> Self {
        self.push(label, FieldBinding::Text(property.clone()))
    }

    pub fn date_time(self, label: &str, property: &Property<Option<NaiveDateTime>>) -> Self {
        self.push(label, FieldBinding::Date(property.clone()))
    }

    /// Pick a related `R` row by its display label; the property stores its id
    pub fn pick<R: Entity>(
        self,
        label: &str,
        property: &Property<Option<RecordId>>,
        controller: Rc<RefCell<CrudController<R>>>,
        display: fn(&R) -> String,
    ) -> Self {
        self.pick_from(label, property, Rc::new(ControllerPick::new(controller, display)))
    }

    pub fn pick_from(
        self,
        label: &str,
        property: &Property<Option<RecordId>>,
        source: Rc<dyn PickSource>,
    ) -> Self {
        self.push(
            label,
            FieldBinding::Pick {
                property: property.clone(),
                source,
            },
        )
    }

    /// Mark the most recently declared field as required
    pub fn required(mut self) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.set_required(true);
        }
        self
    }

    /// Attach the submit action and finish the form
    pub fn submit(self, label: &str) -> Form<E> {
        let dirty = Rc::new(Cell::new(false));
        let subscriptions = self
            .fields
            .iter()
            .map(|field| {
                let property = field.property();
                let flag = Rc::clone(&dirty);
                let token = property.on_change(move || flag.set(true));
                (property, token)
            })
            .collect();

        Form {
            fields: self.fields,
            action: SubmitAction {
                label: label.to_string(),
                target: self.target,
                repository: self.repository,
            },
            dirty,
            subscriptions,
        }
    }
}

/// Result of a successful submit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Inserted(RecordId),
    Updated(RecordId),
}

impl SubmitOutcome {
    pub fn id(self) -> RecordId {
        match self {
            SubmitOutcome::Inserted(id) | SubmitOutcome::Updated(id) => id,
        }
    }
}

/// Inserts the target if it is new, otherwise updates it
pub struct SubmitAction<E: Entity> {
    label: String,
    target: Rc<E>,
    repository: Repository<E>,
}

impl<E: Entity> SubmitAction<E> {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn run(&self) -> Result<SubmitOutcome> {
        match self.target.id() {
            None => self
                .repository
                .insert(&self.target)
                .map(SubmitOutcome::Inserted),
            Some(id) => self
                .repository
                .update(&self.target)
                .map(|_| SubmitOutcome::Updated(id)),
        }
    }
}

/// A built form: bound fields plus the submit action
pub struct Form<E: Entity> {
    fields: Vec<FormField>,
    action: SubmitAction<E>,
    dirty: Rc<Cell<bool>>,
    subscriptions: Vec<(PropertyRef, Subscription)>,
}

impl<E: Entity> Form<E> {
    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    /// Look up a field by key or label, ignoring case
    pub fn field(&self, name: &str) -> Option<&FormField> {
        let name = name.trim();
        self.fields
            .iter()
            .find(|f| f.key() == name || f.label().eq_ignore_ascii_case(name))
    }

    /// Write text input into the named field
    pub fn set(&self, name: &str, input: &str) -> Result<()> {
        match self.field(name) {
            Some(field) => field.input(input),
            None => {
                let known: Vec<&str> = self.fields.iter().map(|f| f.key()).collect();
                let mut errors = ValidationErrors::new();
                errors.add(
                    name,
                    format!("unknown field; expected one of: {}", known.join(", ")),
                );
                Err(CrudError::Validation(errors))
            }
        }
    }

    /// Every required-field failure, in form order
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for field in &self.fields {
            field.validate(&mut errors);
        }
        errors
    }

    /// Validate, then insert or update the target
    pub fn submit(&self) -> Result<SubmitOutcome> {
        self.validate().into_result()?;
        let outcome = self.action.run()?;
        self.dirty.set(false);
        Ok(outcome)
    }

    pub fn submit_label(&self) -> &str {
        self.action.label()
    }

    pub fn target(&self) -> &Rc<E> {
        &self.action.target
    }

    pub fn is_new(&self) -> bool {
        self.action.target.is_new()
    }

    /// Whether any bound property changed since the form was built or last submitted
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }
}

impl<E: Entity> Drop for Form<E> {
    fn drop(&mut self) {
        for (property, token) in self.subscriptions.drain(..) {
            property.unsubscribe(token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::database::Database;
    use crate::core::entity::FieldDef;
    use crate::core::identity::Identity;
    use crate::form::field::FieldKind;
    use crate::form::pick::{PickOption, StaticPick};

    #[derive(Default)]
    struct Referral {
        identity: Identity,
        reason: Property<String>,
        due: Property<Option<NaiveDateTime>>,
        clinic_id: Property<Option<RecordId>>,
    }

    impl Entity for Referral {
        const NAME: &'static str = "Referral";
        const TABLE: &'static str = "referral";
        const FIELDS: &'static [FieldDef<Self>] = &[
            FieldDef::text("reason", |r: &Referral| PropertyRef::from(&r.reason)),
            FieldDef::date_time("due", |r: &Referral| PropertyRef::from(&r.due)),
            FieldDef::foreign_key("clinic_id", "clinic", |r: &Referral| {
                PropertyRef::from(&r.clinic_id)
            }),
        ];

        fn identity(&self) -> &Identity {
            &self.identity
        }
    }

    fn clinics() -> Rc<dyn PickSource> {
        Rc::new(StaticPick::new(
            "Clinic",
            vec![PickOption {
                id: RecordId::new(1).unwrap(),
                label: "Eastside".to_string(),
            }],
        ))
    }

    fn build(db: &Database, target: Rc<Referral>) -> Form<Referral> {
        let entity = Rc::clone(&target);
        FormBuilder::new(target, Repository::new(db))
            .text("Reason: ", &entity.reason)
            .required()
            .date_time("Due", &entity.due)
            .pick_from("Clinic", &entity.clinic_id, clinics())
            .submit("Save")
    }

    fn db() -> Database {
        let db = Database::open_in_memory().unwrap();
        // No referenced table: keep the foreign key unenforced for these tests.
        db.connection()
            .execute_batch(
                "CREATE TABLE referral (id INTEGER PRIMARY KEY AUTOINCREMENT, \
                 reason TEXT NOT NULL DEFAULT '', due TEXT, clinic_id INTEGER);",
            )
            .unwrap();
        db
    }

    #[test]
    fn test_fields_in_declaration_order() {
        let db = db();
        let form = build(&db, Rc::new(Referral::default()));

        let summary: Vec<(&str, FieldKind, bool)> = form
            .fields()
            .iter()
            .map(|f| (f.label(), f.kind(), f.is_required()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Reason", FieldKind::Text, true),
                ("Due", FieldKind::Date, false),
                ("Clinic", FieldKind::Pick, false),
            ]
        );
        assert_eq!(form.submit_label(), "Save");
    }

    #[test]
    fn test_submit_inserts_new_then_updates() {
        let db = db();
        let target = Rc::new(Referral::default());
        let form = build(&db, Rc::clone(&target));
        assert!(form.is_new());

        form.set("reason", "cardiology").unwrap();
        form.set("Clinic", "Eastside").unwrap();
        let first = form.submit().unwrap();
        let id = match first {
            SubmitOutcome::Inserted(id) => id,
            other => panic!("expected insert, got {other:?}"),
        };
        assert_eq!(target.id(), Some(id));

        form.set("due", "2024-07-01").unwrap();
        assert_eq!(form.submit().unwrap(), SubmitOutcome::Updated(id));

        let stored = Repository::<Referral>::new(&db).find_by_id(id).unwrap();
        assert_eq!(stored.values(), target.values());
    }

    #[test]
    fn test_validation_blocks_submit() {
        let db = db();
        let form = build(&db, Rc::new(Referral::default()));

        let err = form.submit().unwrap_err();
        match err {
            CrudError::Validation(errors) => {
                assert_eq!(errors.for_field("Reason"), vec!["is required"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(form.is_new());
        assert_eq!(Repository::<Referral>::new(&db).count().unwrap(), 0);
    }

    #[test]
    fn test_unknown_field() {
        let db = db();
        let form = build(&db, Rc::new(Referral::default()));
        let err = form.set("urgency", "high").unwrap_err();
        assert!(err.to_string().contains("reason, due, clinic"));
    }

    #[test]
    fn test_dirty_tracking_and_cleanup() {
        let db = db();
        let target = Rc::new(Referral::default());
        let form = build(&db, Rc::clone(&target));
        assert!(!form.is_dirty());
        assert_eq!(target.reason.subscriber_count(), 1);

        target.reason.set("ortho".to_string());
        assert!(form.is_dirty());

        form.submit().unwrap();
        assert!(!form.is_dirty());

        drop(form);
        assert_eq!(target.reason.subscriber_count(), 0);
    }
}
