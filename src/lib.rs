//! Named-parameter SQL statement builder and execution layer.
//!
//! SQL templates use human-friendly `:name` placeholders; the builder
//! rewrites them into the connection's positional markers, expands
//! multi-valued bindings for `IN (:list)` clauses, caches and reuses the
//! native prepared statement per template, and streams query rows lazily
//! with guaranteed cursor release.
//!
//! ```
//! use sql_param_builder::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let connection = rusqlite::Connection::open_in_memory()?;
//!     let mut builder = SqlParamBuilder::new(&connection);
//!
//!     builder
//!         .sql("CREATE TABLE employee (id INTEGER PRIMARY KEY, code TEXT)")?
//!         .execute()?;
//!     builder
//!         .sql("INSERT INTO employee (id, code) VALUES (:id, :code)")?
//!         .bind("id", 1)
//!         .bind("code", "T")
//!         .execute()?;
//!
//!     let ids = builder
//!         .sql("SELECT id FROM employee WHERE code IN (:codes)")?
//!         .bind_all("codes", ["T", "V"])
//!         .stream_map(|row| {
//!             row.get("id")
//!                 .and_then(SqlValue::as_int)
//!                 .copied()
//!                 .ok_or_else(|| SqlBuilderError::ExecutionError("id column".into()))
//!         })?
//!         .collect::<Result<Vec<i64>, _>>()?;
//!     assert_eq!(ids, [1]);
//!     Ok(())
//! }
//! ```
//!
//! Placeholder recognition is a plain text scan for `:identifier`; colons
//! inside string literals or comments are not treated specially. Custom
//! backends plug in through the [`driver`] traits.

pub mod builder;
pub mod driver;
pub mod error;
pub mod prelude;
mod row;
pub mod template;
mod types;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use builder::{RowStream, SqlParamBuilder};
pub use error::SqlBuilderError;
pub use row::SqlRow;
pub use template::PlaceholderStyle;
pub use types::{SqlValue, TypeHint};
