//! # oca
//!
//! Annotation-driven entity mapping and a dialect-aware SQL query builder.
//!
//! ## Features
//!
//! - **Annotated entities**: `#[derive(Entity)]` with `#[db("column,pk,auto")]` bindings
//! - **Query builder**: SELECT / INSERT / DELETE with `?` conditions rewritten per dialect
//! - **Dialects**: `?` (MySQL, MariaDB, SQLite) or `$n` (PostgreSQL) placeholders
//! - **Repository**: find / find_one / insert / delete, with auto columns read back via RETURNING
//! - **Transaction-friendly**: anything implementing [`Executor`] works, including transactions
//!
//! ## Query Builder (qb)
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
//! // SELECT id FROM users WHERE age > $1 LIMIT $2
//!
//! let q = qb::insert_into("todos")
//!     .columns(&["title", "created_at"])
//!     .values([oca::Value::from("Task 1"), raw("NOW()")])
//!     .returning(&["id"])
//!     .try_build()?;
//! // INSERT INTO todos (title, created_at) VALUES (?, NOW()) RETURNING id
//! ```
//!
//! ## Repository
//!
//! ```ignore
//! use oca::{Entity, FindOption, Repository};
//!
//! #[derive(Debug, Default, Entity)]
//! struct Todo {
//!     #[db("id,pk,auto")]
//!     id: i64,
//!     #[db("title")]
//!     title: String,
//!     #[db("created_at")]
//!     #[schema("default:now()")]
//!     created_at: Option<chrono::NaiveDateTime>,
//! }
//!
//! let repo = Repository::<Todo, _>::new(&client);
//! let mut todo = Todo { title: "Task 1".into(), ..Default::default() };
//! repo.insert(&mut todo).await?;
//! let first = repo.find_one([FindOption::Where(oca::col("id").eq(todo.id))]).await?;
//! ```

extern crate self as oca;

pub mod config;
pub mod dialect;
pub mod entity;
pub mod error;
pub mod executor;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod meta;
pub mod pg;
pub mod qb;
pub mod repository;
pub mod row;
pub mod scan;
pub mod value;

pub use config::RepositoryConfig;
pub use dialect::{Dialect, PlaceholderStyle, dialect, set_dialect};
pub use entity::{Entity, FieldDescriptor};
pub use error::{OrmError, OrmResult};
pub use executor::Executor;
pub use meta::{FieldMeta, column_map, column_names, metadata, table_name};
pub use pg::{PgRow, PgRows};
pub use qb::{BuiltQuery, Column, Condition, and, c, col, not, or};
pub use repository::{FindFilter, FindOption, Repository, Store};
pub use row::{DbRow, RowCursor};
pub use scan::{scan_returning, scan_row, scan_rows};
pub use value::{FromValue, ScanTarget, Value, raw};

#[cfg(feature = "derive")]
pub use oca_derive::Entity;
