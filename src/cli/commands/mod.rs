//! CLI command implementations

pub mod utils;

pub mod completions;
pub mod entity;
pub mod init;
