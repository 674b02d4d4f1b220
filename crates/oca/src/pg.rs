//! [`Executor`] for `tokio-postgres` clients, transactions and (feature `pool`)
//! deadpool clients.
//!
//! Statements are prepared first so the result columns are known even when the
//! query returns no rows; [`Value`] arguments are bound through their `ToSql`
//! impl.

use crate::error::{OrmError, OrmResult};
use crate::executor::Executor;
use crate::row::{DbRow, RowCursor};
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tokio_postgres::Row;
use tokio_postgres::types::{ToSql, Type};
use uuid::Uuid;

/// A PostgreSQL result row.
#[derive(Debug)]
pub struct PgRow(Row);

impl PgRow {
    /// The underlying `tokio-postgres` row.
    pub fn into_inner(self) -> Row {
        self.0
    }
}

impl DbRow for PgRow {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn column_name(&self, idx: usize) -> Option<&str> {
        self.0.columns().get(idx).map(|c| c.name())
    }

    fn value(&self, idx: usize) -> OrmResult<Value> {
        decode_column(&self.0, idx)
    }
}

/// Materialized PostgreSQL result set.
#[derive(Debug)]
pub struct PgRows {
    columns: Vec<String>,
    rows: std::vec::IntoIter<Row>,
}

impl PgRows {
    fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows: rows.into_iter(),
        }
    }
}

impl RowCursor for PgRows {
    type Row = PgRow;

    fn columns(&self) -> &[String] {
        &self.columns
    }

    async fn next_row(&mut self) -> OrmResult<Option<PgRow>> {
        Ok(self.rows.next().map(PgRow))
    }

    fn close(&mut self) {
        self.rows = Vec::new().into_iter();
    }
}

fn params(args: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    args.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

fn decode_column(row: &Row, idx: usize) -> OrmResult<Value> {
    let Some(column) = row.columns().get(idx) else {
        return Err(OrmError::decode(
            format!("#{idx}"),
            format!("row has only {} column(s)", row.len()),
        ));
    };
    let name = column.name();
    let ty = column.type_();

    macro_rules! get {
        ($t:ty) => {
            row.try_get::<_, Option<$t>>(idx)
                .map(Value::from)
                .map_err(|e| OrmError::decode(name, e.to_string()))
        };
    }

    if *ty == Type::BOOL {
        get!(bool)
    } else if *ty == Type::INT2 {
        get!(i16)
    } else if *ty == Type::INT4 {
        get!(i32)
    } else if *ty == Type::INT8 {
        get!(i64)
    } else if *ty == Type::FLOAT4 {
        get!(f32)
    } else if *ty == Type::FLOAT8 {
        get!(f64)
    } else if [Type::TEXT, Type::VARCHAR, Type::BPCHAR, Type::NAME].contains(ty) {
        get!(String)
    } else if *ty == Type::BYTEA {
        get!(Vec<u8>)
    } else if *ty == Type::UUID {
        get!(Uuid)
    } else if *ty == Type::DATE {
        get!(NaiveDate)
    } else if *ty == Type::TIMESTAMP {
        get!(NaiveDateTime)
    } else if *ty == Type::TIMESTAMPTZ {
        get!(DateTime<Utc>)
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        get!(serde_json::Value)
    } else {
        Err(OrmError::decode(
            name,
            format!("unsupported column type '{}'", ty.name()),
        ))
    }
}

macro_rules! impl_pg_executor {
    ($($client:ty),* $(,)?) => {
        $(
            impl Executor for $client {
                type Row = PgRow;
                type Rows = PgRows;

                async fn query_rows(&self, sql: &str, args: &[Value]) -> OrmResult<PgRows> {
                    let stmt = self.prepare(sql).await.map_err(OrmError::from_db_error)?;
                    let columns = stmt.columns().iter().map(|c| c.name().to_string()).collect();
                    let rows = self
                        .query(&stmt, &params(args))
                        .await
                        .map_err(OrmError::from_db_error)?;
                    Ok(PgRows::new(columns, rows))
                }

                async fn query_row(&self, sql: &str, args: &[Value]) -> OrmResult<PgRow> {
                    let rows = self
                        .query(sql, &params(args))
                        .await
                        .map_err(OrmError::from_db_error)?;
                    rows.into_iter()
                        .next()
                        .map(PgRow)
                        .ok_or_else(|| OrmError::not_found("Expected one row, got none"))
                }

                async fn exec(&self, sql: &str, args: &[Value]) -> OrmResult<u64> {
                    self.execute(sql, &params(args))
                        .await
                        .map_err(OrmError::from_db_error)
                }
            }
        )*
    };
}

impl_pg_executor!(tokio_postgres::Client, tokio_postgres::Transaction<'_>);

#[cfg(feature = "pool")]
impl Executor for deadpool_postgres::Client {
    type Row = PgRow;
    type Rows = PgRows;

    async fn query_rows(&self, sql: &str, args: &[Value]) -> OrmResult<PgRows> {
        // Delegate to the deref target (tokio_postgres::Client).
        let client: &tokio_postgres::Client = self;
        Executor::query_rows(client, sql, args).await
    }

    async fn query_row(&self, sql: &str, args: &[Value]) -> OrmResult<PgRow> {
        let client: &tokio_postgres::Client = self;
        Executor::query_row(client, sql, args).await
    }

    async fn exec(&self, sql: &str, args: &[Value]) -> OrmResult<u64> {
        let client: &tokio_postgres::Client = self;
        Executor::exec(client, sql, args).await
    }
}
