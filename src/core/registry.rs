//! Controller registry: one lazily built controller per entity type
//!
//! Built once at startup and passed to whatever needs a peer controller
//! (pick fields resolving related rows). Instances are memoized for the
//! lifetime of the registry and never evicted.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::controller::CrudController;
use crate::core::database::Database;
use crate::core::entity::Entity;
use crate::core::error::{CrudError, Result};

type Factory = Box<dyn Fn(&ControllerRegistry) -> Result<Rc<dyn Any>>>;

pub struct ControllerRegistry {
    database: Database,
    factories: HashMap<TypeId, (&'static str, Factory)>,
    instances: RefCell<HashMap<TypeId, Rc<dyn Any>>>,
}

impl ControllerRegistry {
    pub fn new(database: Database) -> Self {
        Self {
            database,
            factories: HashMap::new(),
            instances: RefCell::new(HashMap::new()),
        }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Record how to build the controller for `E`. Replaces any earlier factory.
    pub fn register<E, F>(&mut self, factory: F)
    where
        E: Entity,
        F: Fn(&ControllerRegistry) -> Result<CrudController<E>> + 'static,
    {
        let erased: Factory = Box::new(move |registry| {
            let controller = factory(registry)?;
            Ok(Rc::new(RefCell::new(controller)) as Rc<dyn Any>)
        });
        self.factories.insert(TypeId::of::<E>(), (E::NAME, erased));
    }

    pub fn is_registered<E: Entity>(&self) -> bool {
        self.factories.contains_key(&TypeId::of::<E>())
    }

    /// Whether the controller for `E` has been built yet
    pub fn is_instantiated<E: Entity>(&self) -> bool {
        self.instances.borrow().contains_key(&TypeId::of::<E>())
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Names of registered entity types, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.values().map(|(name, _)| *name).collect();
        names.sort_unstable();
        names
    }

    /// The controller for `E`, built on first request and shared afterwards
    pub fn get<E: Entity>(&self) -> Result<Rc<RefCell<CrudController<E>>>> {
        let key = TypeId::of::<E>();

        // Clone out so the map is not borrowed while a factory runs.
        let cached = self.instances.borrow().get(&key).cloned();
        let instance = match cached {
            Some(instance) => instance,
            None => {
                let (_, factory) = self
                    .factories
                    .get(&key)
                    .ok_or(CrudError::Unregistered(E::NAME))?;
                let created = factory(self)?;
                tracing::debug!(entity = E::NAME, "controller created");
                Rc::clone(
                    self.instances
                        .borrow_mut()
                        .entry(key)
                        .or_insert(created),
                )
            }
        };

        instance
            .downcast::<RefCell<CrudController<E>>>()
            .map_err(|_| {
                CrudError::invalid_state(format!(
                    "registry entry for {} holds a different controller type",
                    E::NAME
                ))
            })
    }
}
