//! Sources of candidate rows for pick fields

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

use crate::controller::CrudController;
use crate::core::entity::Entity;
use crate::core::error::{CrudError, Result};
use crate::core::identity::RecordId;

/// One selectable row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickOption {
    pub id: RecordId,
    pub label: String,
}

/// Supplies the rows a pick field can point at
pub trait PickSource {
    /// Name of the related entity type
    fn entity_name(&self) -> &'static str;

    /// Candidate rows, in list order
    fn options(&self) -> Result<Vec<PickOption>>;

    /// Display label of one row, or `None` if no such row is listed
    fn label_for(&self, id: RecordId) -> Result<Option<String>> {
        Ok(self
            .options()?
            .into_iter()
            .find(|o| o.id == id)
            .map(|o| o.label))
    }
}

/// Pick source backed by another entity's controller
pub struct ControllerPick<R: Entity> {
    controller: Rc<RefCell<CrudController<R>>>,
    display: fn(&R) -> String,
}

impl<R: Entity> ControllerPick<R> {
    pub fn new(controller: Rc<RefCell<CrudController<R>>>, display: fn(&R) -> String) -> Self {
        Self {
            controller,
            display,
        }
    }
}

impl<R: Entity> PickSource for ControllerPick<R> {
    fn entity_name(&self) -> &'static str {
        R::NAME
    }

    fn options(&self) -> Result<Vec<PickOption>> {
        let mut controller = self.controller.try_borrow_mut().map_err(|_| {
            CrudError::invalid_state(format!(
                "{} controller is busy and cannot list pick options",
                R::NAME
            ))
        })?;
        controller.ensure_loaded()?;
        Ok(controller
            .items()
            .iter()
            .filter_map(|e| {
                e.id().map(|id| PickOption {
                    id,
                    label: (self.display)(e),
                })
            })
            .collect())
    }
}

/// Fixed list of options, useful for tests and static lookups
pub struct StaticPick {
    entity: &'static str,
    options: Vec<PickOption>,
}

impl StaticPick {
    pub fn new(entity: &'static str, options: Vec<PickOption>) -> Self {
        Self { entity, options }
    }
}

impl PickSource for StaticPick {
    fn entity_name(&self) -> &'static str {
        self.entity
    }

    fn options(&self) -> Result<Vec<PickOption>> {
        Ok(self.options.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(id: i64, label: &str) -> PickOption {
        PickOption {
            id: RecordId::new(id).unwrap(),
            label: label.to_string(),
        }
    }

    #[test]
    fn test_label_for() {
        let source = StaticPick::new("Doctor", vec![option(1, "Dr. Adams"), option(4, "Dr. Ng")]);
        assert_eq!(
            source.label_for(RecordId::new(4).unwrap()).unwrap(),
            Some("Dr. Ng".to_string())
        );
        assert_eq!(source.label_for(RecordId::new(2).unwrap()).unwrap(), None);
        assert_eq!(source.entity_name(), "Doctor");
    }
}
