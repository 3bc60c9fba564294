use std::marker::PhantomData;

use crate::driver::SqlCursor;
use crate::error::SqlBuilderError;
use crate::row::SqlRow;

/// Lazy, forward-only, non-restartable stream of mapped query rows.
///
/// Yields one `Result<T, SqlBuilderError>` per row. The underlying native
/// cursor is released as soon as the stream drains, errors, is dropped, or
/// is closed explicitly. Because the stream mutably borrows its builder, a
/// new query cannot start while one is open.
pub struct RowStream<'s, T, F> {
    cursor: Option<Box<dyn SqlCursor + 's>>,
    mapper: F,
    _mapped: PhantomData<fn() -> T>,
}

impl<'s, T, F> RowStream<'s, T, F> {
    pub(crate) fn new(cursor: Box<dyn SqlCursor + 's>, mapper: F) -> Self {
        Self {
            cursor: Some(cursor),
            mapper,
            _mapped: PhantomData,
        }
    }

    /// Release the cursor before the stream is drained.
    ///
    /// # Errors
    ///
    /// Returns [`SqlBuilderError::CloseFailed`] when the native cursor
    /// reports a failure while closing.
    pub fn close(mut self) -> Result<(), SqlBuilderError> {
        self.release()
    }

    fn release(&mut self) -> Result<(), SqlBuilderError> {
        match self.cursor.take() {
            Some(mut cursor) => cursor
                .close()
                .map_err(|e| SqlBuilderError::CloseFailed(Box::new(e))),
            None => Ok(()),
        }
    }
}

impl<T, F> Iterator for RowStream<'_, T, F>
where
    F: FnMut(&SqlRow) -> Result<T, SqlBuilderError>,
{
    type Item = Result<T, SqlBuilderError>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.as_deref_mut()?;
        match cursor.advance() {
            Ok(true) => {
                let item = match cursor.row() {
                    Ok(row) => (self.mapper)(row),
                    Err(e) => Err(e),
                };
                Some(item)
            }
            Ok(false) => match self.release() {
                Ok(()) => None,
                Err(e) => Some(Err(e)),
            },
            Err(e) => {
                let _ = self.release();
                Some(Err(e))
            }
        }
    }
}

impl<T, F> Drop for RowStream<'_, T, F> {
    fn drop(&mut self) {
        let _ = self.release();
    }
}
