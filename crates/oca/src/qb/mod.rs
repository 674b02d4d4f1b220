//! Query builder for SELECT, INSERT and DELETE statements.
//!
//! Conditions are written with `?` markers and composed freely; placeholders are
//! numbered only when a statement is built, using the builder's dialect (`?` for
//! MySQL-style backends, `$1, $2, ...` for PostgreSQL). One running index is shared
//! by WHERE, LIMIT and OFFSET (or by every VALUES row), so the returned arguments
//! always line up with the placeholders in the text.
//!
//! # Usage
//!
//! ```ignore
//! use oca::{col, qb, raw, Dialect};
//!
//! let q = qb::from("users")
//!     .select(&["id"])
//!     .and_where(col("age").gt(18))
//!     .limit(10)
//!     .with_dialect(Dialect::POSTGRES)
//!     .build();
//! assert_eq!(q.sql, "SELECT id FROM users WHERE age > $1 LIMIT $2");
//!
//! let q = qb::insert_into("todos")
//!     .columns(&["title", "created_at"])
//!     .values([oca::Value::from("Task 1"), raw("NOW()")])
//!     .returning_id()
//!     .try_build()?;
//! ```

mod condition;
mod delete;
mod insert;
mod param;
mod select;

pub use condition::{Column, Condition, and, c, col, not, or};
pub use delete::DeleteBuilder;
pub use insert::InsertBuilder;
pub use select::{JoinKind, SelectBuilder};

use crate::value::Value;

/// Statement text plus its bound arguments, in placeholder order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub args: Vec<Value>,
}

impl BuiltQuery {
    /// True for the fail-soft result of an invalid builder.
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// Create a SELECT query builder for the given table.
///
/// # Example
/// ```ignore
/// let q = oca::qb::from("users").and_where(oca::col("id").eq(1)).build();
/// ```
pub fn from(table: &str) -> SelectBuilder {
    SelectBuilder::new(table)
}

/// Create an INSERT query builder for the given table.
pub fn insert_into(table: &str) -> InsertBuilder {
    InsertBuilder::new(table)
}

/// Create a DELETE query builder for the given table.
pub fn delete(table: &str) -> DeleteBuilder {
    DeleteBuilder::new(table)
}
