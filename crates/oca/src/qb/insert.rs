//! INSERT query builder.

use crate::dialect::{self, Dialect};
use crate::error::{OrmError, OrmResult};
use crate::qb::BuiltQuery;
use crate::qb::param::ParamList;
use crate::value::Value;

/// INSERT query builder supporting multi-row VALUES and RETURNING.
///
/// [`Value::Raw`](crate::Value::Raw) entries are written into the statement
/// verbatim and take no placeholder.
#[derive(Debug, Clone)]
pub struct InsertBuilder {
    table: String,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    returning: Vec<String>,
    dialect: Dialect,
}

impl InsertBuilder {
    /// Start an INSERT into `table` using the registry's current dialect.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            rows: Vec::new(),
            returning: Vec::new(),
            dialect: dialect::dialect(),
        }
    }

    /// Render with `dialect` instead of the one captured at construction.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Add target columns.
    pub fn columns(mut self, cols: &[&str]) -> Self {
        self.columns.extend(cols.iter().map(|c| c.to_string()));
        self
    }

    /// Add one row of values, in column order.
    pub fn values<I, V>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
        self
    }

    /// Add RETURNING columns.
    pub fn returning(mut self, cols: &[&str]) -> Self {
        self.returning.extend(cols.iter().map(|c| c.to_string()));
        self
    }

    /// Shorthand for `returning(&["id"])`.
    pub fn returning_id(self) -> Self {
        self.returning(&["id"])
    }

    fn validate(&self) -> OrmResult<()> {
        if self.table.trim().is_empty() {
            return Err(OrmError::validation("insert requires a table"));
        }
        if self.columns.is_empty() {
            return Err(OrmError::validation(format!(
                "insert into {} has no columns",
                self.table
            )));
        }
        if self.rows.is_empty() {
            return Err(OrmError::validation(format!(
                "insert into {} has no values",
                self.table
            )));
        }
        if let Some((i, row)) = self
            .rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != self.columns.len())
        {
            return Err(OrmError::validation(format!(
                "insert into {}: row {} has {} value(s) for {} column(s)",
                self.table,
                i,
                row.len(),
                self.columns.len()
            )));
        }
        if !self.returning.is_empty() && !self.dialect.supports_returning() {
            return Err(OrmError::Unsupported {
                dialect: self.dialect.name(),
                feature: "RETURNING",
            });
        }
        Ok(())
    }

    /// Render the statement, rejecting incomplete or inconsistent builders.
    pub fn try_build(&self) -> OrmResult<BuiltQuery> {
        self.validate()?;

        let mut params = ParamList::new(self.dialect);
        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ",
            self.table,
            self.columns.join(", ")
        );

        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push('(');
            for (j, value) in row.iter().enumerate() {
                if j > 0 {
                    sql.push_str(", ");
                }
                params.push(&mut sql, value);
            }
            sql.push(')');
        }

        if !self.returning.is_empty() {
            sql.push_str(" RETURNING ");
            sql.push_str(&self.returning.join(", "));
        }

        Ok(BuiltQuery {
            sql,
            args: params.into_args(),
        })
    }

    /// Render the statement, or an empty [`BuiltQuery`] when the builder is
    /// invalid. Check [`BuiltQuery::is_empty`] before executing.
    pub fn to_sql(&self) -> BuiltQuery {
        self.try_build().unwrap_or_default()
    }
}
