use std::sync::Arc;

use rusqlite::types::Value;

use super::{SqlConnection, SqlCursor, SqlStatement};
use crate::error::SqlBuilderError;
use crate::row::SqlRow;
use crate::template::PlaceholderStyle;
use crate::types::{SqlValue, TypeHint};

/// Convert a builder value into a `SQLite` value.
///
/// SQLite derives storage classes from the value itself, so the type hint
/// carried alongside a binding is not consulted here. Temporal values are
/// stored as ISO-8601 text.
#[must_use]
pub fn sql_value_to_sqlite(value: &SqlValue) -> Value {
    match value {
        SqlValue::Int(i) => Value::Integer(*i),
        SqlValue::Float(f) => Value::Real(*f),
        SqlValue::Text(s) => Value::Text(s.clone()),
        SqlValue::Bool(b) => Value::Integer(i64::from(*b)),
        SqlValue::Date(d) => Value::Text(d.format("%F").to_string()),
        SqlValue::Timestamp(ts) => Value::Text(ts.format("%F %T%.f").to_string()),
        SqlValue::Null => Value::Null,
        SqlValue::Json(j) => Value::Text(j.to_string()),
        SqlValue::Blob(bytes) => Value::Blob(bytes.clone()),
    }
}

/// Convert a `SQLite` column value into a builder value.
#[must_use]
pub fn sqlite_value_to_sql(value: Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::Int(i),
        Value::Real(f) => SqlValue::Float(f),
        Value::Text(s) => SqlValue::Text(s),
        Value::Blob(b) => SqlValue::Blob(b),
    }
}

impl SqlConnection for rusqlite::Connection {
    fn prepare<'c>(&'c self, sql: &str) -> Result<Box<dyn SqlStatement + 'c>, SqlBuilderError> {
        let stmt = rusqlite::Connection::prepare(self, sql)?;
        Ok(Box::new(SqliteStatement {
            conn: self,
            stmt,
            last_rowid: None,
        }))
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Question
    }
}

/// Prepared statement over a borrowed `rusqlite` connection.
pub struct SqliteStatement<'conn> {
    conn: &'conn rusqlite::Connection,
    stmt: rusqlite::Statement<'conn>,
    last_rowid: Option<i64>,
}

impl SqlStatement for SqliteStatement<'_> {
    fn bind_positional(
        &mut self,
        index: usize,
        value: &SqlValue,
        _hint: TypeHint,
    ) -> Result<(), SqlBuilderError> {
        self.stmt
            .raw_bind_parameter(index, sql_value_to_sqlite(value))?;
        Ok(())
    }

    fn execute_update(&mut self) -> Result<u64, SqlBuilderError> {
        let affected = self.stmt.raw_execute()?;
        // SQLite reports only the rowid of the last inserted row, so a
        // multi-row insert surfaces a single generated key.
        self.last_rowid = (affected > 0).then(|| self.conn.last_insert_rowid());
        Ok(affected as u64)
    }

    fn execute_query<'s>(&'s mut self) -> Result<Box<dyn SqlCursor + 's>, SqlBuilderError> {
        let columns: Arc<Vec<String>> = Arc::new(
            self.stmt
                .column_names()
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
        );
        let rows = self.stmt.raw_query();
        Ok(Box::new(SqliteCursor {
            columns,
            rows: Some(rows),
            current: None,
        }))
    }

    fn generated_keys_cursor<'s>(
        &'s mut self,
    ) -> Result<Box<dyn SqlCursor + 's>, SqlBuilderError> {
        let columns = Arc::new(vec!["last_insert_rowid".to_string()]);
        let pending = self
            .last_rowid
            .take()
            .map(|id| SqlRow::new(columns, vec![SqlValue::Int(id)]));
        Ok(Box::new(KeysCursor {
            pending,
            current: None,
        }))
    }

    fn close(self: Box<Self>) -> Result<(), SqlBuilderError> {
        let SqliteStatement { stmt, .. } = *self;
        stmt.finalize()?;
        Ok(())
    }
}

/// Lazy cursor over `rusqlite` rows with single-row materialization.
struct SqliteCursor<'stmt> {
    columns: Arc<Vec<String>>,
    rows: Option<rusqlite::Rows<'stmt>>,
    current: Option<SqlRow>,
}

impl SqlCursor for SqliteCursor<'_> {
    fn advance(&mut self) -> Result<bool, SqlBuilderError> {
        let Some(rows) = self.rows.as_mut() else {
            self.current = None;
            return Ok(false);
        };
        match rows.next() {
            Ok(Some(row)) => {
                let mut values = Vec::with_capacity(self.columns.len());
                for idx in 0..self.columns.len() {
                    let value: Value = row.get(idx)?;
                    values.push(sqlite_value_to_sql(value));
                }
                self.current = Some(SqlRow::new(Arc::clone(&self.columns), values));
                Ok(true)
            }
            Ok(None) => {
                self.current = None;
                self.rows = None;
                Ok(false)
            }
            Err(e) => {
                self.current = None;
                self.rows = None;
                Err(e.into())
            }
        }
    }

    fn row(&self) -> Result<&SqlRow, SqlBuilderError> {
        self.current.as_ref().ok_or_else(|| {
            SqlBuilderError::ExecutionError("cursor has no current row".to_string())
        })
    }

    fn close(&mut self) -> Result<(), SqlBuilderError> {
        // Dropping the native rows handle resets the statement.
        self.current = None;
        self.rows = None;
        Ok(())
    }
}

/// One-shot cursor over the synthesized generated-key row.
struct KeysCursor {
    pending: Option<SqlRow>,
    current: Option<SqlRow>,
}

impl SqlCursor for KeysCursor {
    fn advance(&mut self) -> Result<bool, SqlBuilderError> {
        self.current = self.pending.take();
        Ok(self.current.is_some())
    }

    fn row(&self) -> Result<&SqlRow, SqlBuilderError> {
        self.current.as_ref().ok_or_else(|| {
            SqlBuilderError::ExecutionError("cursor has no current row".to_string())
        })
    }

    fn close(&mut self) -> Result<(), SqlBuilderError> {
        self.pending = None;
        self.current = None;
        Ok(())
    }
}
