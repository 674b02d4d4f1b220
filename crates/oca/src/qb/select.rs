//! SELECT query builder.

use crate::dialect::{self, Dialect};
use crate::qb::BuiltQuery;
use crate::qb::condition::Condition;
use crate::qb::param::ParamList;
use crate::value::Value;

/// JOIN flavour for [`SelectBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinKind {
    fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL JOIN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Join {
    kind: JoinKind,
    table: String,
    on: String,
}

/// SELECT query builder.
///
/// Conditions are AND-joined in the order they were added. Placeholders are
/// numbered when [`build`](Self::build) runs, so one builder can be built many
/// times with identical results.
#[derive(Debug, Clone)]
pub struct SelectBuilder {
    table: String,
    columns: Vec<String>,
    joins: Vec<Join>,
    conditions: Vec<Condition>,
    order_by: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
    dialect: Dialect,
}

impl SelectBuilder {
    /// Start a SELECT on `table` using the registry's current dialect.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            joins: Vec::new(),
            conditions: Vec::new(),
            order_by: None,
            limit: None,
            offset: None,
            dialect: dialect::dialect(),
        }
    }

    /// Render with `dialect` instead of the one captured at construction.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// The dialect this builder renders with.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Add projected columns. Nothing selected means `*`.
    pub fn select(mut self, cols: &[&str]) -> Self {
        self.columns.extend(cols.iter().map(|c| c.to_string()));
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

    fn join(mut self, kind: JoinKind, table: &str, on: &str) -> Self {
        self.joins.push(Join {
            kind,
            table: table.to_string(),
            on: on.to_string(),
        });
        self
    }

    /// `INNER JOIN table ON on`
    pub fn inner_join(self, table: &str, on: &str) -> Self {
        self.join(JoinKind::Inner, table, on)
    }

    /// `LEFT JOIN table ON on`
    pub fn left_join(self, table: &str, on: &str) -> Self {
        self.join(JoinKind::Left, table, on)
    }

    /// `RIGHT JOIN table ON on`
    pub fn right_join(self, table: &str, on: &str) -> Self {
        self.join(JoinKind::Right, table, on)
    }

    /// `FULL JOIN table ON on`
    pub fn full_join(self, table: &str, on: &str) -> Self {
        self.join(JoinKind::Full, table, on)
    }

    /// Set the ORDER BY clause (trusted SQL, replaces any previous one).
    /// An empty string clears it.
    pub fn order_by(mut self, clause: &str) -> Self {
        let clause = clause.trim();
        self.order_by = (!clause.is_empty()).then(|| clause.to_string());
        self
    }

    /// Set LIMIT. Zero is kept; a negative value clears it.
    pub fn limit(mut self, n: i64) -> Self {
        self.limit = (n >= 0).then_some(n);
        self
    }

    /// Set OFFSET. Zero is kept; a negative value clears it.
    pub fn offset(mut self, n: i64) -> Self {
        self.offset = (n >= 0).then_some(n);
        self
    }

    /// Render the statement and its arguments.
    pub fn build(&self) -> BuiltQuery {
        let mut params = ParamList::new(self.dialect);
        let mut sql = String::from("SELECT ");

        if self.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.columns.join(", "));
        }
        sql.push_str(" FROM ");
        sql.push_str(&self.table);

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join.kind.as_sql());
            sql.push(' ');
            sql.push_str(&join.table);
            sql.push_str(" ON ");
            sql.push_str(&join.on);
        }

        params.push_where(&mut sql, &self.conditions);

        if let Some(order) = &self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }
        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ");
            params.push(&mut sql, &Value::I64(limit));
        }
        if let Some(offset) = self.offset {
            sql.push_str(" OFFSET ");
            params.push(&mut sql, &Value::I64(offset));
        }

        BuiltQuery {
            sql,
            args: params.into_args(),
        }
    }
}
