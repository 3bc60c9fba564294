//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and traits
//! to make it easier to get started with the library.

pub use crate::builder::{RowStream, SqlParamBuilder};
pub use crate::driver::{SqlConnection, SqlCursor, SqlStatement};
pub use crate::error::SqlBuilderError;
pub use crate::row::SqlRow;
pub use crate::template::PlaceholderStyle;
pub use crate::types::{SqlValue, TypeHint};
