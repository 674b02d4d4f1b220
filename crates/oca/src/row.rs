//! Result rows and cursors as seen by the scanner.

use crate::error::OrmResult;
use crate::value::Value;

/// One result row with positional, decoded column access.
pub trait DbRow: Send {
    /// Number of columns.
    fn len(&self) -> usize;

    /// Whether the row has no columns.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the column at `idx`.
    fn column_name(&self, idx: usize) -> Option<&str>;

    /// Decoded value of the column at `idx`.
    fn value(&self, idx: usize) -> OrmResult<Value>;

    /// Position of the column named `name`.
    fn position(&self, name: &str) -> Option<usize> {
        (0..self.len()).find(|&i| self.column_name(i) == Some(name))
    }
}

/// An open result set.
///
/// `close` must be idempotent; the scanner calls it on every exit path.
pub trait RowCursor: Send {
    type Row: DbRow;

    /// Result column names, in order.
    fn columns(&self) -> &[String];

    /// Advance to the next row. `Ok(None)` once the set is exhausted; an error is
    /// terminal.
    fn next_row(&mut self) -> impl std::future::Future<Output = OrmResult<Option<Self::Row>>> + Send;

    /// Release the result set.
    fn close(&mut self);
}
