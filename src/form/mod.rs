//! Forms: fields bound to entity properties plus a submit action

pub mod builder;
pub mod field;
pub mod pick;

pub use builder::{Form, FormBuilder, SubmitAction, SubmitOutcome};
pub use field::{FieldBinding, FieldKind, FormField, DATE_TIME_FORMAT};
pub use pick::{ControllerPick, PickOption, PickSource, StaticPick};
