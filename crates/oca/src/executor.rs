//! The database handle abstraction used by repositories.

use crate::error::OrmResult;
use crate::row::{DbRow, RowCursor};
use crate::value::Value;

/// Something that can run SQL: a connection, a transaction, a pooled client, or
/// the in-memory `MemoryExecutor` behind the `testing` feature.
///
/// Implementations must be usable concurrently from several tasks.
pub trait Executor: Send + Sync {
    type Row: DbRow;
    type Rows: RowCursor<Row = Self::Row>;

    /// Run a query and return a cursor over its rows.
    fn query_rows(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Self::Rows>> + Send;

    /// Run a query and return its **first** row.
    ///
    /// Semantics:
    /// - 0 rows: returns [`OrmError::NotFound`](crate::OrmError::NotFound)
    /// - 1 or more rows: returns the first
    fn query_row(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Self::Row>> + Send;

    /// Run a statement and return the number of affected rows.
    fn exec(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<u64>> + Send;
}

impl<E: Executor> Executor for &E {
    type Row = E::Row;
    type Rows = E::Rows;

    fn query_rows(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Self::Rows>> + Send {
        (**self).query_rows(sql, args)
    }

    fn query_row(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Self::Row>> + Send {
        (**self).query_row(sql, args)
    }

    fn exec(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<u64>> + Send {
        (**self).exec(sql, args)
    }
}
