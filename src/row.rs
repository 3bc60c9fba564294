use std::sync::Arc;

use crate::types::SqlValue;

/// A single materialized row from a query or generated-key cursor.
///
/// Column names are shared across all rows of one result via `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlRow {
    column_names: Arc<Vec<String>>,
    values: Vec<SqlValue>,
}

impl SqlRow {
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<SqlValue>) -> Self {
        Self {
            column_names,
            values,
        }
    }

    /// Value of the named column, or `None` if the column does not exist.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&SqlValue> {
        self.column_names
            .iter()
            .position(|name| name == column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Value at the zero-based column index.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
