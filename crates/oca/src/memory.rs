//! In-memory [`Executor`] for tests, available with the `testing` feature.
//!
//! Replies are scripted up front and consumed in order, one per call; every
//! statement the executor receives is recorded.
//!
//! ```ignore
//! use oca::memory::{MemoryExecutor, ResultSet};
//!
//! let db = MemoryExecutor::new();
//! db.push_rows(ResultSet::new(&["id", "title"]).row([oca::Value::I64(1), "Task".into()]));
//! db.push_affected(1);
//!
//! let repo = oca::Repository::<Todo, _>::new(&db);
//! let todos = repo.find([]).await?;
//! assert_eq!(db.statements()[0].sql, "SELECT id, title FROM todos");
//! ```

use crate::error::{OrmError, OrmResult};
use crate::executor::Executor;
use crate::row::{DbRow, RowCursor};
use crate::value::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Which executor method received a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    QueryRows,
    QueryRow,
    Exec,
}

/// A statement received by [`MemoryExecutor`].
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: CallKind,
    pub sql: String,
    pub args: Vec<Value>,
}

/// Scripted result set.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    fail_after: Option<(usize, String)>,
}

impl ResultSet {
    /// Empty result set with the given columns.
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
            fail_after: None,
        }
    }

    /// Append a row; values are in column order.
    pub fn row<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.rows.push(values.into_iter().map(Into::into).collect());
        self
    }

    /// Make the cursor fail with `message` after yielding `rows` rows.
    pub fn fail_after(mut self, rows: usize, message: impl Into<String>) -> Self {
        self.fail_after = Some((rows, message.into()));
        self
    }
}

#[derive(Debug)]
enum Reply {
    Rows(ResultSet),
    Affected(u64),
    Error(String),
}

/// Scripted executor with a statement log.
#[derive(Debug, Default)]
pub struct MemoryExecutor {
    replies: Mutex<VecDeque<Reply>>,
    log: Mutex<Vec<Statement>>,
    closed: Arc<AtomicUsize>,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a result set.
    pub fn push_rows(&self, rows: ResultSet) {
        self.push(Reply::Rows(rows));
    }

    /// Queue an affected-row count.
    pub fn push_affected(&self, n: u64) {
        self.push(Reply::Affected(n));
    }

    /// Queue a failure.
    pub fn push_error(&self, message: impl Into<String>) {
        self.push(Reply::Error(message.into()));
    }

    /// Every statement received so far, in order.
    pub fn statements(&self) -> Vec<Statement> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of cursors that have been closed.
    pub fn closed_cursors(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of scripted replies not consumed yet.
    pub fn pending(&self) -> usize {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn push(&self, reply: Reply) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }

    fn next_reply(&self, kind: CallKind, sql: &str, args: &[Value]) -> OrmResult<Reply> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Statement {
                kind,
                sql: sql.to_string(),
                args: args.to_vec(),
            });
        let reply = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match reply {
            Some(Reply::Error(message)) => Err(OrmError::Other(message)),
            Some(reply) => Ok(reply),
            None => Err(OrmError::Other(format!("no scripted reply for: {sql}"))),
        }
    }

    fn cursor(&self, set: ResultSet) -> MemoryRows {
        let columns: Arc<[String]> = set.columns.into();
        MemoryRows {
            columns,
            rows: set.rows.into_iter(),
            fail_after: set.fail_after,
            yielded: 0,
            closed: false,
            counter: Arc::clone(&self.closed),
        }
    }
}

impl Executor for MemoryExecutor {
    type Row = MemoryRow;
    type Rows = MemoryRows;

    async fn query_rows(&self, sql: &str, args: &[Value]) -> OrmResult<MemoryRows> {
        match self.next_reply(CallKind::QueryRows, sql, args)? {
            Reply::Rows(set) => Ok(self.cursor(set)),
            _ => Err(OrmError::Other(format!("scripted reply is not a result set: {sql}"))),
        }
    }

    async fn query_row(&self, sql: &str, args: &[Value]) -> OrmResult<MemoryRow> {
        match self.next_reply(CallKind::QueryRow, sql, args)? {
            Reply::Rows(set) => {
                let columns: Arc<[String]> = set.columns.into();
                set.rows
                    .into_iter()
                    .next()
                    .map(|values| MemoryRow { columns, values })
                    .ok_or_else(|| OrmError::not_found("Expected one row, got none"))
            }
            _ => Err(OrmError::Other(format!("scripted reply is not a result set: {sql}"))),
        }
    }

    async fn exec(&self, sql: &str, args: &[Value]) -> OrmResult<u64> {
        match self.next_reply(CallKind::Exec, sql, args)? {
            Reply::Affected(n) => Ok(n),
            Reply::Rows(set) => Ok(set.rows.len() as u64),
            Reply::Error(message) => Err(OrmError::Other(message)),
        }
    }
}

/// Row produced by [`MemoryExecutor`].
#[derive(Debug, Clone)]
pub struct MemoryRow {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl DbRow for MemoryRow {
    fn len(&self) -> usize {
        self.values.len()
    }

    fn column_name(&self, idx: usize) -> Option<&str> {
        self.columns.get(idx).map(String::as_str)
    }

    fn value(&self, idx: usize) -> OrmResult<Value> {
        self.values.get(idx).cloned().ok_or_else(|| {
            let column = self
                .column_name(idx)
                .map_or_else(|| format!("#{idx}"), str::to_string);
            OrmError::decode(column, "row has no value at this position")
        })
    }
}

/// Cursor produced by [`MemoryExecutor::query_rows`].
#[derive(Debug)]
pub struct MemoryRows {
    columns: Arc<[String]>,
    rows: std::vec::IntoIter<Vec<Value>>,
    fail_after: Option<(usize, String)>,
    yielded: usize,
    closed: bool,
    counter: Arc<AtomicUsize>,
}

impl RowCursor for MemoryRows {
    type Row = MemoryRow;

    fn columns(&self) -> &[String] {
        &self.columns
    }

    async fn next_row(&mut self) -> OrmResult<Option<MemoryRow>> {
        if self.closed {
            return Err(OrmError::Other("cursor is closed".to_string()));
        }
        if let Some((limit, message)) = &self.fail_after {
            if self.yielded >= *limit {
                return Err(OrmError::Other(message.clone()));
            }
        }
        let Some(values) = self.rows.next() else {
            return Ok(None);
        };
        self.yielded += 1;
        Ok(Some(MemoryRow {
            columns: Arc::clone(&self.columns),
            values,
        }))
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.counter.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replies_are_consumed_in_order() {
        let db = MemoryExecutor::new();
        db.push_affected(3);
        db.push_error("boom");

        assert_eq!(db.exec("DELETE FROM t", &[]).await.unwrap(), 3);
        let err = db.exec("DELETE FROM t", &[Value::I64(1)]).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(db.exec("DELETE FROM t", &[]).await.is_err());
        assert_eq!(db.pending(), 0);

        let log = db.statements();
        assert_eq!(log.len(), 3);
        assert_eq!(log[1].args, [Value::I64(1)]);
        assert_eq!(log[1].kind, CallKind::Exec);
    }

    #[tokio::test]
    async fn query_row_on_empty_set_is_not_found() {
        let db = MemoryExecutor::new();
        db.push_rows(ResultSet::new(&["id"]));
        let err = db.query_row("SELECT id FROM t", &[]).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn close_is_counted_once() {
        let db = MemoryExecutor::new();
        db.push_rows(ResultSet::new(&["id"]).row([1]));
        let mut rows = db.query_rows("SELECT id FROM t", &[]).await.unwrap();
        assert_eq!(rows.columns(), ["id"]);
        rows.close();
        rows.close();
        assert_eq!(db.closed_cursors(), 1);
        assert!(rows.next_row().await.is_err());
    }

    #[tokio::test]
    async fn rows_expose_names_and_values() {
        let db = MemoryExecutor::new();
        db.push_rows(ResultSet::new(&["id", "title"]).row([Value::I64(7), "x".into()]));
        let row = db.query_row("SELECT", &[]).await.unwrap();
        assert_eq!(row.len(), 2);
        assert_eq!(row.position("title"), Some(1));
        assert_eq!(row.value(0).unwrap(), Value::I64(7));
        assert!(row.value(5).is_err());
    }
}
