// Builder facade and statement lifecycle
//
// - the facade owns the current template, its bindings, and the cached
//   native statement for that template
// - stream: lazy row consumption with guaranteed cursor release

mod stream;

pub use stream::RowStream;

use std::fmt;

use tracing::debug;

use crate::driver::{EmptyCursor, SqlConnection, SqlCursor, SqlStatement};
use crate::error::SqlBuilderError;
use crate::row::SqlRow;
use crate::template::bindings::Bindings;
use crate::template::rewriter;
use crate::types::{SqlValue, TypeHint};

/// Fluent named-parameter statement builder over a borrowed connection.
///
/// A builder carries one SQL template at a time. Placeholders of the form
/// `:name` are rewritten into the connection's positional markers on every
/// execution; a placeholder bound to several values expands to that many
/// markers, which makes `IN (:list)` clauses work without string pasting.
///
/// The native prepared statement is compiled once per template and reused
/// across repeated bind+execute cycles. Rebinding a reused template with a
/// different per-placeholder value count is not validated here; the driver
/// reports the arity mismatch.
///
/// ```no_run
/// use sql_param_builder::prelude::*;
///
/// fn demo(conn: &rusqlite::Connection) -> Result<(), SqlBuilderError> {
///     let mut builder = SqlParamBuilder::new(conn);
///     builder
///         .sql("INSERT INTO employee (id, code) VALUES (:id, :code)")?
///         .bind("id", 1)
///         .bind("code", "T")
///         .execute()?;
///     Ok(())
/// }
/// ```
///
/// Builders are single-threaded; use one instance per thread, each over its
/// own connection.
pub struct SqlParamBuilder<'c> {
    connection: &'c dyn SqlConnection,
    sql_template: String,
    bindings: Bindings,
    statement: Option<Box<dyn SqlStatement + 'c>>,
    keys_retrievable: bool,
}

impl<'c> SqlParamBuilder<'c> {
    #[must_use]
    pub fn new(connection: &'c dyn SqlConnection) -> Self {
        Self {
            connection,
            sql_template: String::new(),
            bindings: Bindings::default(),
            statement: None,
            keys_retrievable: false,
        }
    }

    /// Release the current statement (if any) and install a new template.
    /// All bindings are cleared; the connection is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SqlBuilderError::CloseFailed`] when releasing the previous
    /// statement fails; the new template is not installed in that case.
    pub fn sql(&mut self, template: impl Into<String>) -> Result<&mut Self, SqlBuilderError> {
        self.close()?;
        self.sql_template = template.into();
        self.bindings.clear();
        Ok(self)
    }

    /// [`Self::sql`] over a template split into lines, joined with `\n`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::sql`].
    pub fn sql_lines(&mut self, lines: &[&str]) -> Result<&mut Self, SqlBuilderError> {
        self.sql(lines.join("\n"))
    }

    /// Bind a single value to a placeholder name, replacing any prior
    /// binding for that name.
    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> &mut Self {
        self.bindings
            .set(name, TypeHint::Unspecified, vec![value.into()]);
        self
    }

    /// Bind several values to one name; each occurrence of the placeholder
    /// expands to the same number of comma-joined markers. An empty
    /// iterator binds a single NULL.
    pub fn bind_all<I>(&mut self, name: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<SqlValue>,
    {
        self.bindings.set(
            name,
            TypeHint::Unspecified,
            values.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Conditional bind with an explicit driver type hint. With
    /// `enabled == false` the call is a recorded no-op, which keeps fluent
    /// chains with optional parameters readable.
    pub fn bind_if<I>(
        &mut self,
        enabled: bool,
        name: impl Into<String>,
        hint: TypeHint,
        values: I,
    ) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<SqlValue>,
    {
        if enabled {
            self.bindings
                .set(name, hint, values.into_iter().map(Into::into).collect());
        }
        self
    }

    /// Run the statement as an update.
    ///
    /// # Errors
    ///
    /// [`SqlBuilderError::MissingParameters`] when a placeholder is unbound,
    /// or any driver error from prepare/bind/execute.
    pub fn execute(&mut self) -> Result<u64, SqlBuilderError> {
        self.keys_retrievable = false;
        let statement = self.prepared()?;
        statement.execute_update()
    }

    /// Run the statement as an update and make the generated-key set
    /// retrievable through [`Self::generated_keys`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::execute`].
    pub fn execute_insert(&mut self) -> Result<u64, SqlBuilderError> {
        self.keys_retrievable = false;
        let affected = self.prepared()?.execute_update()?;
        self.keys_retrievable = true;
        Ok(affected)
    }

    /// Run the statement as a query and lazily map each row.
    ///
    /// The returned stream borrows the builder, so the builder cannot be
    /// touched until the stream is dropped, drained, or closed; that is
    /// also what guarantees at most one open cursor per builder.
    ///
    /// # Errors
    ///
    /// [`SqlBuilderError::MissingParameters`] when a placeholder is unbound,
    /// or any driver error from prepare/bind/execute.
    pub fn stream_map<'s, T, F>(
        &'s mut self,
        mapper: F,
    ) -> Result<RowStream<'s, T, F>, SqlBuilderError>
    where
        F: FnMut(&SqlRow) -> Result<T, SqlBuilderError>,
    {
        self.keys_retrievable = false;
        let statement = self.prepared()?;
        let cursor = statement.execute_query()?;
        Ok(RowStream::new(cursor, mapper))
    }

    /// Run the statement as a query and feed every row to `consumer`.
    ///
    /// # Errors
    ///
    /// Propagates query errors and the first error the consumer returns.
    pub fn for_each<F>(&mut self, mut consumer: F) -> Result<(), SqlBuilderError>
    where
        F: FnMut(&SqlRow) -> Result<(), SqlBuilderError>,
    {
        let stream = self.stream_map(move |row| consumer(row))?;
        for row in stream {
            row?;
        }
        Ok(())
    }

    /// Stream the keys generated by the most recent [`Self::execute_insert`].
    ///
    /// The key set is single-use: a second retrieval without an intervening
    /// insert yields an empty stream, not a fresh key set.
    ///
    /// # Errors
    ///
    /// Any driver error raised while producing the key cursor.
    pub fn generated_keys<'s, T, F>(
        &'s mut self,
        mapper: F,
    ) -> Result<RowStream<'s, T, F>, SqlBuilderError>
    where
        F: FnMut(&SqlRow) -> Result<T, SqlBuilderError>,
    {
        let cursor: Box<dyn SqlCursor + 's> = if self.keys_retrievable {
            self.keys_retrievable = false;
            match self.statement.as_deref_mut() {
                Some(statement) => statement.generated_keys_cursor()?,
                None => Box::new(EmptyCursor),
            }
        } else {
            Box::new(EmptyCursor)
        };
        Ok(RowStream::new(cursor, mapper))
    }

    /// The last generated key of the most recent [`Self::execute_insert`].
    ///
    /// # Errors
    ///
    /// [`SqlBuilderError::EmptyGeneratedKeys`] when the key set is empty or
    /// already consumed; otherwise any error from the key stream.
    pub fn generated_last_key<T, F>(&mut self, mapper: F) -> Result<T, SqlBuilderError>
    where
        F: FnMut(&SqlRow) -> Result<T, SqlBuilderError>,
    {
        let mut last = None;
        for key in self.generated_keys(mapper)? {
            last = Some(key?);
        }
        last.ok_or(SqlBuilderError::EmptyGeneratedKeys)
    }

    /// Diagnostic SQL with bound values inlined as `[v]`. Unresolved
    /// placeholders stay as `:name`; unlike execution, rendering never
    /// fails on missing bindings.
    #[must_use]
    pub fn render(&self) -> String {
        rewriter::render(&self.sql_template, &self.bindings)
    }

    /// [`Self::render`] collapsed to a single log-friendly line.
    #[must_use]
    pub fn render_line(&self) -> String {
        rewriter::single_line(&self.render())
    }

    #[must_use]
    pub fn sql_template(&self) -> &str {
        &self.sql_template
    }

    #[must_use]
    pub fn connection(&self) -> &'c dyn SqlConnection {
        self.connection
    }

    /// Release the native statement and any cursor it owns. Idempotent;
    /// the builder stays usable for a new [`Self::sql`] call and the
    /// connection itself is never closed.
    ///
    /// # Errors
    ///
    /// Returns [`SqlBuilderError::CloseFailed`] when the native release
    /// fails; the builder's own state is reset regardless.
    pub fn close(&mut self) -> Result<(), SqlBuilderError> {
        self.keys_retrievable = false;
        match self.statement.take() {
            Some(statement) => {
                debug!("releasing prepared statement");
                statement
                    .close()
                    .map_err(|e| SqlBuilderError::CloseFailed(Box::new(e)))
            }
            None => Ok(()),
        }
    }

    /// Rewrite the template against the current bindings, compile the
    /// native statement on first use, and re-apply the full positional
    /// value list.
    fn prepared(&mut self) -> Result<&mut (dyn SqlStatement + 'c), SqlBuilderError> {
        let rewrite = rewriter::rewrite(
            &self.sql_template,
            &self.bindings,
            self.connection.placeholder_style(),
        )?;
        if self.statement.is_none() {
            debug!(sql = %rewrite.sql, params = rewrite.values.len(), "preparing statement");
            self.statement = Some(self.connection.prepare(&rewrite.sql)?);
        }
        let Some(statement) = self.statement.as_deref_mut() else {
            return Err(SqlBuilderError::ExecutionError(
                "statement unavailable after prepare".to_string(),
            ));
        };
        for (index, (value, hint)) in rewrite.values.iter().enumerate() {
            statement.bind_positional(index + 1, value, *hint)?;
        }
        Ok(statement)
    }
}

impl fmt::Display for SqlParamBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl Drop for SqlParamBuilder<'_> {
    fn drop(&mut self) {
        if let Some(statement) = self.statement.take() {
            let _ = statement.close();
        }
    }
}
