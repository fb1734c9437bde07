//! Generic single-table CRUD gateway

use std::marker::PhantomData;

use rusqlite::{params, params_from_iter, OptionalExtension};

use crate::core::database::Database;
use crate::core::entity::Entity;
use crate::core::error::{CrudError, Result};
use crate::core::identity::RecordId;
use crate::core::property::Value;

/// Translates between rows of one table and entities of type `E`.
/// Holds no entity data.
pub struct Repository<E: Entity> {
    db: Database,
    table: &'static str,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            table: self.table,
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Repository<E> {
    /// Repository over the entity's declared table
    pub fn new(db: &Database) -> Self {
        Self::with_table(db, E::TABLE)
    }

    pub fn with_table(db: &Database, table: &'static str) -> Self {
        Self {
            db: db.clone(),
            table,
            _entity: PhantomData,
        }
    }

    pub fn table_name(&self) -> &'static str {
        self.table
    }

    fn fail(&self, source: rusqlite::Error) -> CrudError {
        tracing::warn!(entity = E::NAME, table = self.table, error = %source, "storage failure");
        CrudError::persistence(E::NAME, source)
    }

    fn select_sql(&self) -> String {
        let mut columns = vec!["id"];
        columns.extend(E::FIELDS.iter().map(|f| f.column));
        format!("SELECT {} FROM {}", columns.join(", "), self.table)
    }

    fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(RecordId, Vec<Value>)> {
        let id: RecordId = row.get(0)?;
        let values = E::FIELDS
            .iter()
            .enumerate()
            .map(|(i, f)| Value::read(f.kind, row, i + 1))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((id, values))
    }

    fn hydrate(id: RecordId, values: Vec<Value>) -> Result<E> {
        let entity = E::default();
        entity.identity().restore(Some(id));
        for (field, value) in E::FIELDS.iter().zip(values) {
            field.bind(&entity).set_value(value)?;
        }
        Ok(entity)
    }

    /// All rows in storage order. An empty table yields an empty list.
    pub fn find_all(&self) -> Result<Vec<E>> {
        let sql = format!("{} ORDER BY id", self.select_sql());
        let conn = self.db.connection();
        let mut stmt = conn.prepare(&sql).map_err(|e| self.fail(e))?;
        let rows = stmt
            .query_map([], Self::read_row)
            .map_err(|e| self.fail(e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| self.fail(e))?;

        tracing::debug!(entity = E::NAME, count = rows.len(), "loaded rows");
        rows.into_iter()
            .map(|(id, values)| Self::hydrate(id, values))
            .collect()
    }

    pub fn find_by_id(&self, id: RecordId) -> Result<E> {
        let sql = format!("{} WHERE id = ?1", self.select_sql());
        let row = self
            .db
            .connection()
            .query_row(&sql, params![id], Self::read_row)
            .optional()
            .map_err(|e| self.fail(e))?;

        match row {
            Some((id, values)) => Self::hydrate(id, values),
            None => Err(CrudError::NotFound {
                entity: E::NAME,
                id,
            }),
        }
    }

    /// Insert a new entity and assign the generated id onto it
    pub fn insert(&self, entity: &E) -> Result<RecordId> {
        if let Some(id) = entity.id() {
            return Err(CrudError::invalid_state(format!(
                "{} #{} is already persisted; use update",
                E::NAME,
                id
            )));
        }

        let sql = if E::FIELDS.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", self.table)
        } else {
            let columns: Vec<&str> = E::FIELDS.iter().map(|f| f.column).collect();
            let placeholders: Vec<String> =
                (1..=columns.len()).map(|i| format!("?{}", i)).collect();
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.table,
                columns.join(", "),
                placeholders.join(", ")
            )
        };

        let conn = self.db.connection();
        conn.execute(&sql, params_from_iter(entity.values()))
            .map_err(|e| self.fail(e))?;

        let id = RecordId::new(conn.last_insert_rowid()).ok_or_else(|| {
            CrudError::invalid_state(format!("storage returned no id for new {}", E::NAME))
        })?;
        entity.identity().assign(id)?;

        tracing::info!(entity = E::NAME, %id, "inserted");
        Ok(id)
    }

    /// Write every declared field of a persisted entity
    pub fn update(&self, entity: &E) -> Result<()> {
        let id = entity.id().ok_or_else(|| {
            CrudError::invalid_state(format!("{} has not been persisted; use insert", E::NAME))
        })?;

        if E::FIELDS.is_empty() {
            // Nothing to write; still report a missing row.
            return self.find_by_id(id).map(|_| ());
        }

        let assignments: Vec<String> = E::FIELDS
            .iter()
            .enumerate()
            .map(|(i, f)| format!("{} = ?{}", f.column, i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            self.table,
            assignments.join(", "),
            E::FIELDS.len() + 1
        );

        let mut values = entity.values();
        values.push(Value::ForeignKey(Some(id)));

        let changed = self
            .db
            .connection()
            .execute(&sql, params_from_iter(values))
            .map_err(|e| self.fail(e))?;

        if changed == 0 {
            return Err(CrudError::NotFound {
                entity: E::NAME,
                id,
            });
        }
        tracing::info!(entity = E::NAME, %id, "updated");
        Ok(())
    }

    pub fn delete(&self, id: RecordId) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", self.table);
        let changed = self
            .db
            .connection()
            .execute(&sql, params![id])
            .map_err(|e| self.fail(e))?;

        if changed == 0 {
            return Err(CrudError::NotFound {
                entity: E::NAME,
                id,
            });
        }
        tracing::info!(entity = E::NAME, %id, "deleted");
        Ok(())
    }

    pub fn count(&self) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let count: i64 = self
            .db
            .connection()
            .query_row(&sql, [], |row| row.get(0))
            .map_err(|e| self.fail(e))?;
        Ok(count.max(0) as usize)
    }
}
