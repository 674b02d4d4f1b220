//! Generic CRUD over [`Entity`] types.
//!
//! A [`Repository`] pairs an [`Executor`] with a [`RepositoryConfig`] and derives
//! every statement from the entity's resolved field metadata.
//!
//! ```ignore
//! use oca::{col, FindOption, Repository};
//!
//! let repo = Repository::<Todo, _>::new(&client);
//!
//! let mut todo = Todo { title: "write docs".into(), ..Default::default() };
//! repo.insert(&mut todo).await?;          // id and created_at come back via RETURNING
//!
//! let open = repo
//!     .find([
//!         FindOption::Where(col("done").eq(false)),
//!         FindOption::OrderBy("id DESC".into()),
//!         FindOption::Limit(20),
//!     ])
//!     .await?;
//! ```

use crate::config::RepositoryConfig;
use crate::entity::Entity;
use crate::error::{OrmError, OrmResult};
use crate::executor::Executor;
use crate::meta::{self, FieldMeta};
use crate::qb::{self, BuiltQuery, Condition};
use crate::scan::{scan_returning, scan_rows};
use crate::value::Value;
use std::marker::PhantomData;

/// Accumulated filters for [`Repository::find`].
#[derive(Debug, Clone, Default)]
pub struct FindFilter {
    pub conditions: Vec<Condition>,
    pub order_by: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl FindFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a sequence of options in order.
    pub fn from_options(opts: impl IntoIterator<Item = FindOption>) -> Self {
        let mut filter = Self::new();
        for opt in opts {
            opt.apply(&mut filter);
        }
        filter
    }
}

/// One modification of a [`FindFilter`].
#[derive(Debug, Clone)]
pub enum FindOption {
    /// Add a WHERE condition (AND-joined with the others).
    Where(Condition),
    /// Set ORDER BY (trusted SQL, last one wins).
    OrderBy(String),
    /// Set LIMIT; negative clears it.
    Limit(i64),
    /// Set OFFSET; negative clears it.
    Offset(i64),
}

impl FindOption {
    pub fn apply(self, filter: &mut FindFilter) {
        match self {
            FindOption::Where(cond) => filter.conditions.push(cond),
            FindOption::OrderBy(clause) => filter.order_by = Some(clause),
            FindOption::Limit(n) => filter.limit = (n >= 0).then_some(n),
            FindOption::Offset(n) => filter.offset = (n >= 0).then_some(n),
        }
    }
}

impl From<Condition> for FindOption {
    fn from(cond: Condition) -> Self {
        FindOption::Where(cond)
    }
}

/// CRUD for entity type `T` over executor `E`.
pub struct Repository<T, E> {
    executor: E,
    config: RepositoryConfig,
    _entity: PhantomData<fn() -> T>,
}

impl<T, E> std::fmt::Debug for Repository<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("entity", &std::any::type_name::<T>())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T: Entity, E: Executor> Repository<T, E> {
    /// Repository with default configuration (registry dialect, `NOW()`).
    pub fn new(executor: E) -> Self {
        Self::with_config(executor, RepositoryConfig::default())
    }

    pub fn with_config(executor: E, config: RepositoryConfig) -> Self {
        Self {
            executor,
            config,
            _entity: PhantomData,
        }
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn into_executor(self) -> E {
        self.executor
    }

    /// Table this repository reads and writes.
    pub fn table(&self) -> String {
        meta::table_name::<T>()
    }

    /// Fetch every matching row.
    ///
    /// Selects the entity's declared columns explicitly; with no options this is
    /// `SELECT <columns> FROM <table>` with no arguments.
    pub async fn find(&self, opts: impl IntoIterator<Item = FindOption>) -> OrmResult<Vec<T>> {
        let filter = FindFilter::from_options(opts);
        let fields = meta::metadata::<T>();
        let table = self.table();
        let query = self.select_query(&table, &fields, filter);

        self.config
            .log_statement("find", &table, &query.sql, query.args.len());
        let cursor = self.executor.query_rows(&query.sql, &query.args).await?;
        scan_rows(cursor, &fields).await
    }

    /// Fetch the first matching row. Any limit in `opts` is replaced by 1.
    pub async fn find_one(
        &self,
        opts: impl IntoIterator<Item = FindOption>,
    ) -> OrmResult<Option<T>> {
        let opts: Vec<FindOption> = opts
            .into_iter()
            .chain(std::iter::once(FindOption::Limit(1)))
            .collect();
        Ok(self.find(opts).await?.into_iter().next())
    }

    /// Insert `entity`.
    ///
    /// `auto` fields are left to the database and read back through RETURNING,
    /// in declaration order. `default:now()` fields are written as the configured
    /// now literal. Without auto fields the statement runs through `exec`.
    pub async fn insert(&self, entity: &mut T) -> OrmResult<()> {
        let fields = meta::metadata::<T>();
        let table = self.table();

        let mut columns = Vec::new();
        let mut values = Vec::new();
        let mut auto = Vec::new();
        for field in fields {
            if field.is_auto {
                auto.push(field);
                continue;
            }
            let value = if field.defaults_to_now() {
                Value::Raw(self.config.now_literal.clone())
            } else {
                field_value(entity, &field)
            };
            columns.push(field.column);
            values.push(value);
        }

        let column_refs: Vec<&str> = columns.iter().map(String::as_str).collect();
        let mut builder = qb::insert_into(&table)
            .with_dialect(self.config.dialect)
            .columns(&column_refs)
            .values(values);
        if !auto.is_empty() {
            let returning: Vec<&str> = auto.iter().map(|f| f.column.as_str()).collect();
            builder = builder.returning(&returning);
        }
        let query = builder.try_build()?;

        self.config
            .log_statement("insert", &table, &query.sql, query.args.len());
        if auto.is_empty() {
            self.executor.exec(&query.sql, &query.args).await?;
            return Ok(());
        }
        let row = self.executor.query_row(&query.sql, &query.args).await?;
        scan_returning(entity, &row, &auto)
    }

    /// Delete matching rows and return how many were removed.
    ///
    /// At least one condition is required.
    pub async fn delete(&self, conds: impl IntoIterator<Item = Condition>) -> OrmResult<u64> {
        let table = self.table();
        let builder = qb::delete(&table)
            .with_dialect(self.config.dialect)
            .where_all(conds);
        if !builder.has_conditions() {
            return Err(OrmError::validation(format!(
                "delete from {table} requires at least one condition"
            )));
        }
        let query = builder.build();

        self.config
            .log_statement("delete", &table, &query.sql, query.args.len());
        self.executor.exec(&query.sql, &query.args).await
    }

    fn select_query(&self, table: &str, fields: &[FieldMeta], filter: FindFilter) -> BuiltQuery {
        let columns: Vec<&str> = fields.iter().map(|f| f.column.as_str()).collect();
        let mut builder = qb::from(table)
            .with_dialect(self.config.dialect)
            .select(&columns)
            .where_all(filter.conditions);
        if let Some(order) = &filter.order_by {
            builder = builder.order_by(order);
        }
        if let Some(limit) = filter.limit {
            builder = builder.limit(limit);
        }
        if let Some(offset) = filter.offset {
            builder = builder.offset(offset);
        }
        builder.build()
    }
}

fn field_value<T: Entity>(entity: &T, field: &FieldMeta) -> Value {
    match entity.field_value(field.ordinal) {
        Some(value) => value,
        None => panic!(
            "{}: field `{}` (column `{}`) is mapped but has no value accessor",
            T::type_name(),
            field.name,
            field.column
        ),
    }
}

/// Mockable CRUD surface implemented by [`Repository`].
pub trait Store<T: Entity>: Send + Sync {
    fn find(
        &self,
        opts: Vec<FindOption>,
    ) -> impl std::future::Future<Output = OrmResult<Vec<T>>> + Send;

    fn find_one(
        &self,
        opts: Vec<FindOption>,
    ) -> impl std::future::Future<Output = OrmResult<Option<T>>> + Send;

    fn insert(&self, entity: &mut T) -> impl std::future::Future<Output = OrmResult<()>> + Send;

    fn delete(
        &self,
        conds: Vec<Condition>,
    ) -> impl std::future::Future<Output = OrmResult<u64>> + Send;
}

impl<T: Entity, E: Executor> Store<T> for Repository<T, E> {
    async fn find(&self, opts: Vec<FindOption>) -> OrmResult<Vec<T>> {
        Repository::find(self, opts).await
    }

    async fn find_one(&self, opts: Vec<FindOption>) -> OrmResult<Option<T>> {
        Repository::find_one(self, opts).await
    }

    async fn insert(&self, entity: &mut T) -> OrmResult<()> {
        Repository::insert(self, entity).await
    }

    async fn delete(&self, conds: Vec<Condition>) -> OrmResult<u64> {
        Repository::delete(self, conds).await
    }
}
