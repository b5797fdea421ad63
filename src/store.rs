//! Persistent store: target-table management, the duplicate probe, and the
//! append path, all over a scoped SQLite connection.
//!
//! The duplicate probe and the append are a check-then-act pair. Nothing
//! here serializes concurrent runners; the design assumes one runner
//! processing one file at a time. A deployment that needs real concurrency
//! must add a store-side uniqueness guard across the non-float business
//! columns.

use std::path::Path;

use log::{debug, info};
use rusqlite::{Connection, params_from_iter, types::Value as SqlValue};

use crate::{
    data::Value,
    error::PipelineError,
    normalize::NormalizedBatch,
    schema::{BATCH_ID_COLUMN, FieldDef, ImportSchema, SOURCE_FILE_COLUMN},
};

pub const DEFAULT_TABLE: &str = "timesheet_import";

pub struct Store {
    conn: Connection,
    table: String,
}

impl Store {
    /// Opens (creating if absent) the SQLite database at `path`. The
    /// connection lives for one pipeline run and is released on drop,
    /// success or failure.
    pub fn open(path: &Path, table: &str) -> Result<Self, PipelineError> {
        let conn = Connection::open(path)?;
        Ok(Self {
            conn,
            table: table.to_string(),
        })
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory(table: &str) -> Result<Self, PipelineError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn,
            table: table.to_string(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Idempotently creates the target table: surrogate id, batch id, the
    /// business columns in registry order, original file name. Never alters
    /// an existing table's shape.
    pub fn ensure_table(&self, schema: &ImportSchema) -> Result<(), PipelineError> {
        let mut columns = vec![
            "\"id\" INTEGER PRIMARY KEY AUTOINCREMENT".to_string(),
            format!("\"{BATCH_ID_COLUMN}\" TEXT NOT NULL"),
        ];
        for field in &schema.fields {
            let null = if field.nullable { "" } else { " NOT NULL" };
            columns.push(format!(
                "\"{}\" {}{}",
                field.column_name(),
                field.datatype.sql_type(),
                null
            ));
        }
        columns.push(format!("\"{SOURCE_FILE_COLUMN}\" TEXT NOT NULL"));

        let sql = format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" ({})",
            self.table,
            columns.join(", ")
        );
        debug!("Ensuring target table: {sql}");
        self.conn.execute(&sql, [])?;
        Ok(())
    }

    /// Read-only duplicate probe. Takes the first row of the batch as
    /// representative of the whole file and matches every business field
    /// whose type is not float against the store. Returns the batch id of
    /// the first match in insertion order, if any.
    pub fn find_existing_batch(
        &self,
        schema: &ImportSchema,
        batch: &NormalizedBatch,
    ) -> Result<Option<String>, PipelineError> {
        let Some(first) = batch.first_row() else {
            return Ok(None);
        };

        let mut predicates = Vec::new();
        let mut bindings = Vec::new();
        for idx in schema.dedup_indexes() {
            let field = &schema.fields[idx];
            // IS instead of = so a NULL cell matches a NULL column.
            predicates.push(format!("\"{}\" IS ?{}", field.column_name(), bindings.len() + 1));
            bindings.push(sql_value(first.get(idx).and_then(|cell| cell.as_ref())));
        }

        let sql = format!(
            "SELECT \"{BATCH_ID_COLUMN}\" FROM \"{}\" WHERE {} LIMIT 1",
            self.table,
            predicates.join(" AND ")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bindings))?;
        if let Some(row) = rows.next()? {
            let existing: String = row.get(0)?;
            Ok(Some(existing))
        } else {
            Ok(None)
        }
    }

    /// Appends every row of the batch inside one transaction: either all
    /// rows commit or none do. Callers invoke this only after the duplicate
    /// probe reported no existing batch; no re-check happens here.
    pub fn append(
        &mut self,
        schema: &ImportSchema,
        batch: &NormalizedBatch,
    ) -> Result<usize, PipelineError> {
        let column_names: Vec<String> = std::iter::once(BATCH_ID_COLUMN.to_string())
            .chain(schema.fields.iter().map(FieldDef::column_name))
            .chain(std::iter::once(SOURCE_FILE_COLUMN.to_string()))
            .map(|name| format!("\"{name}\""))
            .collect();
        let placeholders: Vec<String> = (1..=column_names.len())
            .map(|n| format!("?{n}"))
            .collect();
        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            self.table,
            column_names.join(", "),
            placeholders.join(", ")
        );

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in batch.rows() {
                let mut bindings = Vec::with_capacity(column_names.len());
                bindings.push(SqlValue::Text(batch.batch_id().to_string()));
                for cell in row {
                    bindings.push(sql_value(cell.as_ref()));
                }
                bindings.push(SqlValue::Text(batch.source_file().to_string()));
                stmt.execute(params_from_iter(bindings))?;
            }
        }
        tx.commit()?;

        info!(
            "Committed {} row(s) to '{}' under batch {}",
            batch.len(),
            self.table,
            batch.batch_id()
        );
        Ok(batch.len())
    }
}

fn sql_value(cell: Option<&Value>) -> SqlValue {
    match cell {
        None => SqlValue::Null,
        Some(Value::Text(s)) => SqlValue::Text(s.clone()),
        Some(Value::Integer(i)) => SqlValue::Integer(*i),
        Some(Value::Float(f)) => SqlValue::Real(*f),
        Some(Value::Date(d)) => SqlValue::Text(d.format("%Y-%m-%d").to_string()),
    }
}
