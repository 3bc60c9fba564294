//! Test doubles for exercising the builder without a real database.
//!
//! [`RecordingConnection`] implements the driver traits over scripted data
//! and records every prepare, bind, and execution so tests can assert on
//! statement reuse and positional value order.

use std::cell::RefCell;
use std::sync::Arc;

use crate::driver::{SqlConnection, SqlCursor, SqlStatement};
use crate::error::SqlBuilderError;
use crate::row::SqlRow;
use crate::template::PlaceholderStyle;
use crate::types::{SqlValue, TypeHint};

/// One recorded `execute_update` call: the SQL the statement was prepared
/// with plus the positional values and hints applied before the execution.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedExecution {
    pub sql: String,
    pub values: Vec<SqlValue>,
    pub hints: Vec<TypeHint>,
}

#[derive(Debug)]
struct RecorderState {
    style: PlaceholderStyle,
    prepared: Vec<String>,
    executions: Vec<RecordedExecution>,
    update_count: u64,
    rows: Vec<SqlRow>,
    generated_keys: Vec<i64>,
    closed: usize,
}

impl Default for RecorderState {
    fn default() -> Self {
        Self {
            style: PlaceholderStyle::Question,
            prepared: Vec::new(),
            executions: Vec::new(),
            update_count: 0,
            rows: Vec::new(),
            generated_keys: Vec::new(),
            closed: 0,
        }
    }
}

/// Scripted connection recording all driver traffic.
#[derive(Debug, Default)]
pub struct RecordingConnection {
    state: RefCell<RecorderState>,
}

impl RecordingConnection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_update_count(self, count: u64) -> Self {
        self.state.borrow_mut().update_count = count;
        self
    }

    /// Rows every query on this connection will return.
    #[must_use]
    pub fn with_rows(self, rows: Vec<SqlRow>) -> Self {
        self.state.borrow_mut().rows = rows;
        self
    }

    #[must_use]
    pub fn with_generated_keys(self, keys: Vec<i64>) -> Self {
        self.state.borrow_mut().generated_keys = keys;
        self
    }

    #[must_use]
    pub fn with_placeholder_style(self, style: PlaceholderStyle) -> Self {
        self.state.borrow_mut().style = style;
        self
    }

    /// Refill the scripted generated keys, e.g. between two inserts.
    pub fn set_generated_keys(&self, keys: Vec<i64>) {
        self.state.borrow_mut().generated_keys = keys;
    }

    /// Number of native prepare calls seen so far.
    #[must_use]
    pub fn prepare_count(&self) -> usize {
        self.state.borrow().prepared.len()
    }

    /// Every SQL text handed to prepare, in order.
    #[must_use]
    pub fn prepared_sql(&self) -> Vec<String> {
        self.state.borrow().prepared.clone()
    }

    /// Every recorded execution, in order.
    #[must_use]
    pub fn executions(&self) -> Vec<RecordedExecution> {
        self.state.borrow().executions.clone()
    }

    /// Number of statements released so far.
    #[must_use]
    pub fn close_count(&self) -> usize {
        self.state.borrow().closed
    }
}

impl SqlConnection for RecordingConnection {
    fn prepare<'c>(&'c self, sql: &str) -> Result<Box<dyn SqlStatement + 'c>, SqlBuilderError> {
        self.state.borrow_mut().prepared.push(sql.to_string());
        Ok(Box::new(RecordingStatement {
            conn: self,
            sql: sql.to_string(),
            bound: Vec::new(),
        }))
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        self.state.borrow().style
    }
}

struct RecordingStatement<'c> {
    conn: &'c RecordingConnection,
    sql: String,
    bound: Vec<(SqlValue, TypeHint)>,
}

impl SqlStatement for RecordingStatement<'_> {
    fn bind_positional(
        &mut self,
        index: usize,
        value: &SqlValue,
        hint: TypeHint,
    ) -> Result<(), SqlBuilderError> {
        if index == 0 {
            return Err(SqlBuilderError::ExecutionError(
                "positional indexes are 1-based".to_string(),
            ));
        }
        let slot = index - 1;
        if slot < self.bound.len() {
            self.bound[slot] = (value.clone(), hint);
        } else if slot == self.bound.len() {
            self.bound.push((value.clone(), hint));
        } else {
            return Err(SqlBuilderError::ExecutionError(format!(
                "positional index {index} bound out of order"
            )));
        }
        Ok(())
    }

    fn execute_update(&mut self) -> Result<u64, SqlBuilderError> {
        let mut state = self.conn.state.borrow_mut();
        state.executions.push(RecordedExecution {
            sql: self.sql.clone(),
            values: self.bound.iter().map(|(v, _)| v.clone()).collect(),
            hints: self.bound.iter().map(|(_, h)| *h).collect(),
        });
        Ok(state.update_count)
    }

    fn execute_query<'s>(&'s mut self) -> Result<Box<dyn SqlCursor + 's>, SqlBuilderError> {
        let rows = self.conn.state.borrow().rows.clone();
        Ok(Box::new(RecordingCursor {
            remaining: rows.into_iter(),
            current: None,
        }))
    }

    fn generated_keys_cursor<'s>(
        &'s mut self,
    ) -> Result<Box<dyn SqlCursor + 's>, SqlBuilderError> {
        let keys = std::mem::take(&mut self.conn.state.borrow_mut().generated_keys);
        let columns = Arc::new(vec!["generated_key".to_string()]);
        let rows: Vec<SqlRow> = keys
            .into_iter()
            .map(|key| SqlRow::new(Arc::clone(&columns), vec![SqlValue::Int(key)]))
            .collect();
        Ok(Box::new(RecordingCursor {
            remaining: rows.into_iter(),
            current: None,
        }))
    }

    fn close(self: Box<Self>) -> Result<(), SqlBuilderError> {
        self.conn.state.borrow_mut().closed += 1;
        Ok(())
    }
}

struct RecordingCursor {
    remaining: std::vec::IntoIter<SqlRow>,
    current: Option<SqlRow>,
}

impl SqlCursor for RecordingCursor {
    fn advance(&mut self) -> Result<bool, SqlBuilderError> {
        self.current = self.remaining.next();
        Ok(self.current.is_some())
    }

    fn row(&self) -> Result<&SqlRow, SqlBuilderError> {
        self.current.as_ref().ok_or_else(|| {
            SqlBuilderError::ExecutionError("cursor has no current row".to_string())
        })
    }

    fn close(&mut self) -> Result<(), SqlBuilderError> {
        self.remaining = Vec::new().into_iter();
        self.current = None;
        Ok(())
    }
}

/// Build rows sharing one column-name vector, for scripting query results.
#[must_use]
pub fn rows_of(columns: &[&str], rows: Vec<Vec<SqlValue>>) -> Vec<SqlRow> {
    let columns = Arc::new(
        columns
            .iter()
            .map(|name| (*name).to_string())
            .collect::<Vec<_>>(),
    );
    rows.into_iter()
        .map(|values| SqlRow::new(Arc::clone(&columns), values))
        .collect()
}
