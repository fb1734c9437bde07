//! Core module - the entity model, persistence and controller registry

pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod identity;
pub mod property;
pub mod registry;
pub mod repository;

pub use config::Config;
pub use database::Database;
pub use entity::{Entity, FieldDef};
pub use error::{CrudError, FieldError, Result, ValidationErrors};
pub use identity::{IdParseError, Identity, RecordId};
pub use property::{Property, PropertyKind, PropertyRef, Subscription, Value};
pub use registry::ControllerRegistry;
pub use repository::Repository;
