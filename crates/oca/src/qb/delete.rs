//! DELETE query builder.

use crate::dialect::{self, Dialect};
use crate::qb::BuiltQuery;
use crate::qb::condition::Condition;
use crate::qb::param::ParamList;

/// DELETE query builder. WHERE handling matches [`SelectBuilder`](super::SelectBuilder).
#[derive(Debug, Clone)]
pub struct DeleteBuilder {
    table: String,
    conditions: Vec<Condition>,
    dialect: Dialect,
}

impl DeleteBuilder {
    /// Start a DELETE on `table` using the registry's current dialect.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            conditions: Vec::new(),
            dialect: dialect::dialect(),
        }
    }

    /// Render with `dialect` instead of the one captured at construction.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Add a WHERE condition.
    pub fn and_where(mut self, cond: Condition) -> Self {
        self.conditions.push(cond);
        self
    }

    /// Add several WHERE conditions.
    pub fn where_all(mut self, conds: impl IntoIterator<Item = Condition>) -> Self {
        self.conditions.extend(conds);
        self
    }

    /// Whether any WHERE condition has been added.
    pub fn has_conditions(&self) -> bool {
        !self.conditions.is_empty()
    }

    /// Render the statement and its arguments.
    pub fn build(&self) -> BuiltQuery {
        let mut params = ParamList::new(self.dialect);
        let mut sql = format!("DELETE FROM {}", self.table);
        params.push_where(&mut sql, &self.conditions);
        BuiltQuery {
            sql,
            args: params.into_args(),
        }
    }
}
