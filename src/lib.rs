//! clinic: clinic records on a declarative CRUD engine
//!
//! Each entity declares its persisted fields once. From that declaration
//! the engine derives the table layout, a generic repository, bound forms
//! and a list/edit controller.

pub mod cli;
pub mod controller;
pub mod core;
pub mod entities;
pub mod form;
