//! Repository configuration and SQL event logging.

use crate::dialect::{self, Dialect};
use tracing::Level;

/// Settings for a [`Repository`](crate::Repository).
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// Dialect used to render statements.
    pub dialect: Dialect,
    /// SQL written for `default:now()` columns on insert.
    pub now_literal: String,
    /// Tracing level for SQL events.
    pub log_level: Level,
    /// Truncate logged SQL (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            dialect: dialect::dialect(),
            now_literal: "NOW()".to_string(),
            log_level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl RepositoryConfig {
    /// Defaults, with the registry's current dialect.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the dialect.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Override the literal used for `default:now()` columns.
    pub fn now_literal(mut self, literal: impl Into<String>) -> Self {
        self.now_literal = literal.into();
        self
    }

    /// Override the tracing event level.
    pub fn log_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }

    /// Set maximum SQL length to log.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub(crate) fn truncate_sql<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_bytes(sql, max)).into(),
            _ => sql.into(),
        }
    }

    /// Emit the `oca.sql` event for a statement about to run.
    pub(crate) fn log_statement(&self, op: &'static str, table: &str, sql: &str, param_count: usize) {
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let sql = self.truncate_sql(sql);
        emit_at_level!(
            self.log_level,
            target: "oca.sql",
            op,
            table,
            param_count,
            dialect = self.dialect.name(),
            sql = %sql,
        );
    }
}

fn truncate_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
