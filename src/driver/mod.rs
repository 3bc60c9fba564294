// Driver abstraction - the contract an externally supplied relational
// connection must satisfy
//
// - traits: SqlConnection / SqlStatement / SqlCursor
// - sqlite: implementation over rusqlite (feature "sqlite")

#[cfg(feature = "sqlite")]
pub mod sqlite;

use crate::error::SqlBuilderError;
use crate::row::SqlRow;
use crate::template::PlaceholderStyle;
use crate::types::{SqlValue, TypeHint};

/// A client connection able to compile SQL into prepared statements.
///
/// The builder only ever borrows a connection; closing a builder or
/// replacing its template never touches the connection itself.
pub trait SqlConnection {
    /// Compile `sql` into a new native prepared statement.
    ///
    /// # Errors
    ///
    /// Returns [`SqlBuilderError`] when the underlying client rejects the
    /// SQL text.
    fn prepare<'c>(&'c self, sql: &str) -> Result<Box<dyn SqlStatement + 'c>, SqlBuilderError>;

    /// Positional marker syntax this connection's dialect expects.
    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::default()
    }
}

/// A compiled statement holding positional parameter slots.
///
/// Statements are reused across repeated bind+execute cycles for the same
/// template; values are re-applied in full before every execution.
pub trait SqlStatement {
    /// Apply a value to the 1-based positional slot.
    ///
    /// # Errors
    ///
    /// Returns [`SqlBuilderError`] when the slot index is out of range for
    /// the compiled statement or the value cannot be converted.
    fn bind_positional(
        &mut self,
        index: usize,
        value: &SqlValue,
        hint: TypeHint,
    ) -> Result<(), SqlBuilderError>;

    /// Run the statement as an update, returning the affected-row count.
    ///
    /// # Errors
    ///
    /// Returns [`SqlBuilderError`] on any native execution failure.
    fn execute_update(&mut self) -> Result<u64, SqlBuilderError>;

    /// Run the statement as a query, returning a forward-only cursor.
    ///
    /// # Errors
    ///
    /// Returns [`SqlBuilderError`] on any native execution failure.
    fn execute_query<'s>(&'s mut self) -> Result<Box<dyn SqlCursor + 's>, SqlBuilderError>;

    /// Cursor over the keys generated by the most recent affecting update.
    ///
    /// The key set is consumed by retrieval: asking again without another
    /// update yields an exhausted cursor.
    ///
    /// # Errors
    ///
    /// Returns [`SqlBuilderError`] when the native client fails to produce
    /// the key set.
    fn generated_keys_cursor<'s>(&'s mut self)
    -> Result<Box<dyn SqlCursor + 's>, SqlBuilderError>;

    /// Release the native statement handle.
    ///
    /// # Errors
    ///
    /// Returns [`SqlBuilderError`] when the native release fails.
    fn close(self: Box<Self>) -> Result<(), SqlBuilderError>;
}

/// A forward-only handle over query result rows.
pub trait SqlCursor {
    /// Step to the next row; `true` while a row is available. Once `false`
    /// is returned the native resource has been released.
    ///
    /// # Errors
    ///
    /// Returns [`SqlBuilderError`] on a native fetch failure; the cursor is
    /// released before the error is surfaced.
    fn advance(&mut self) -> Result<bool, SqlBuilderError>;

    /// The current row; valid only after `advance` returned `true`.
    ///
    /// # Errors
    ///
    /// Returns [`SqlBuilderError::ExecutionError`] when no row is current.
    fn row(&self) -> Result<&SqlRow, SqlBuilderError>;

    /// Release the native cursor early; later `advance` calls report
    /// exhaustion.
    ///
    /// # Errors
    ///
    /// Returns [`SqlBuilderError`] when the native release fails.
    fn close(&mut self) -> Result<(), SqlBuilderError>;
}

/// Cursor with no rows; backs consumed generated-key retrievals.
#[derive(Debug, Default)]
pub struct EmptyCursor;

impl SqlCursor for EmptyCursor {
    fn advance(&mut self) -> Result<bool, SqlBuilderError> {
        Ok(false)
    }

    fn row(&self) -> Result<&SqlRow, SqlBuilderError> {
        Err(SqlBuilderError::ExecutionError(
            "cursor has no current row".to_string(),
        ))
    }

    fn close(&mut self) -> Result<(), SqlBuilderError> {
        Ok(())
    }
}
