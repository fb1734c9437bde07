//! SQLite database handle shared by all repositories

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use rusqlite::{params, Connection, OptionalExtension};

use crate::core::entity::{check_fields, Entity};
use crate::core::error::{CrudError, Result};
use crate::core::property::PropertyKind;

/// Shared connection. Cloning shares the same connection.
#[derive(Clone)]
pub struct Database {
    conn: Rc<Connection>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open or create a database file
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(|e| CrudError::persistence("database", e))?;

        // WAL reports the resulting mode as a row, so it cannot go through execute()
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| CrudError::persistence("database", e))?;

        let db = Self {
            conn: Rc::new(conn),
            path: Some(path.to_path_buf()),
        };
        db.configure()?;
        tracing::debug!(path = %path.display(), "opened database");
        Ok(db)
    }

    /// Private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| CrudError::persistence("database", e))?;
        let db = Self {
            conn: Rc::new(conn),
            path: None,
        };
        db.configure()?;
        Ok(db)
    }

    fn configure(&self) -> Result<()> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| CrudError::persistence("database", e))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// File path, or `None` for in-memory databases
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Create the entity's table if it does not exist yet
    pub fn ensure_table<E: Entity>(&self) -> Result<()> {
        check_fields::<E>()?;
        let ddl = table_ddl::<E>();
        tracing::debug!(table = E::TABLE, "ensuring table");
        self.conn
            .execute_batch(&ddl)
            .map_err(|e| CrudError::persistence(E::NAME, e))
    }

    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let found: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![table],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| CrudError::persistence("database", e))?;
        Ok(found.is_some())
    }
}

/// `CREATE TABLE` statement derived from an entity's field table
pub fn table_ddl<E: Entity>() -> String {
    let mut columns = vec!["id INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];
    for field in E::FIELDS {
        let column = match (field.kind, field.references) {
            (PropertyKind::Text, _) => format!("{} TEXT NOT NULL DEFAULT ''", field.column),
            (PropertyKind::DateTime, _) => format!("{} TEXT", field.column),
            (PropertyKind::ForeignKey, Some(table)) => {
                format!("{} INTEGER REFERENCES {}(id)", field.column, table)
            }
            (PropertyKind::ForeignKey, None) => format!("{} INTEGER", field.column),
        };
        columns.push(column);
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);",
        E::TABLE,
        columns.join(",\n    ")
    )
}
