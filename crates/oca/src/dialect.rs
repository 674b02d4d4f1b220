//! SQL dialects and the process-wide default dialect.
//!
//! A [`Dialect`] decides how bound-parameter placeholders are spelled and whether
//! `RETURNING` may be emitted. Builders capture the registry's current dialect when
//! they are created; call `with_dialect` on a builder to pin a specific one.
//!
//! ```ignore
//! use oca::dialect::{self, Dialect};
//!
//! dialect::set_dialect(Dialect::POSTGRES);
//! let q = oca::qb::from("users").and_where(oca::col("id").eq(1)).build();
//! assert_eq!(q.sql, "SELECT * FROM users WHERE id = $1");
//! ```

use crate::error::OrmError;
use std::fmt;
use std::str::FromStr;
use std::sync::{PoisonError, RwLock};

/// How a dialect spells positional parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `?` for every parameter.
    Question,
    /// `$1`, `$2`, ... numbered per statement.
    Dollar,
}

/// A SQL backend flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    name: &'static str,
    style: PlaceholderStyle,
    supports_returning: bool,
}

impl Dialect {
    /// `?` placeholders, RETURNING allowed. The registry default.
    pub const GENERIC: Dialect = Dialect::new("generic", PlaceholderStyle::Question, true);
    /// MySQL: `?` placeholders, no RETURNING.
    pub const MYSQL: Dialect = Dialect::new("mysql", PlaceholderStyle::Question, false);
    /// MariaDB (10.5+): `?` placeholders, RETURNING allowed.
    pub const MARIADB: Dialect = Dialect::new("mariadb", PlaceholderStyle::Question, true);
    /// PostgreSQL: `$n` placeholders, RETURNING allowed.
    pub const POSTGRES: Dialect = Dialect::new("postgresql", PlaceholderStyle::Dollar, true);
    /// SQLite (3.35+): `?` placeholders, RETURNING allowed.
    pub const SQLITE: Dialect = Dialect::new("sqlite", PlaceholderStyle::Question, true);

    /// Define a custom dialect.
    pub const fn new(name: &'static str, style: PlaceholderStyle, supports_returning: bool) -> Self {
        Self {
            name,
            style,
            supports_returning,
        }
    }

    /// Dialect name (for logs and error messages).
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Placeholder style.
    pub fn style(&self) -> PlaceholderStyle {
        self.style
    }

    /// Whether `INSERT ... RETURNING` can be emitted.
    pub fn supports_returning(&self) -> bool {
        self.supports_returning
    }

    /// Token for the 1-based parameter `index`.
    pub fn placeholder(&self, index: usize) -> String {
        match self.style {
            PlaceholderStyle::Question => "?".to_string(),
            PlaceholderStyle::Dollar => format!("${}", index),
        }
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::GENERIC
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl FromStr for Dialect {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generic" => Ok(Self::GENERIC),
            "mysql" => Ok(Self::MYSQL),
            "mariadb" => Ok(Self::MARIADB),
            "postgres" | "postgresql" | "pg" => Ok(Self::POSTGRES),
            "sqlite" => Ok(Self::SQLITE),
            other => Err(OrmError::validation(format!("unknown SQL dialect '{other}'"))),
        }
    }
}

static ACTIVE: RwLock<Dialect> = RwLock::new(Dialect::GENERIC);

/// Replace the process-wide default dialect.
///
/// Builders created afterwards pick it up; builders that already exist keep the
/// dialect they were created with. Concurrent writers race, last one wins.
pub fn set_dialect(dialect: Dialect) {
    let mut guard = ACTIVE.write().unwrap_or_else(PoisonError::into_inner);
    *guard = dialect;
}

/// The current process-wide default dialect.
pub fn dialect() -> Dialect {
    *ACTIVE.read().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_style_ignores_index() {
        assert_eq!(Dialect::MYSQL.placeholder(1), "?");
        assert_eq!(Dialect::MYSQL.placeholder(7), "?");
    }

    #[test]
    fn dollar_style_is_numbered() {
        assert_eq!(Dialect::POSTGRES.placeholder(1), "$1");
        assert_eq!(Dialect::POSTGRES.placeholder(12), "$12");
    }

    #[test]
    fn parse_names() {
        assert_eq!("Postgres".parse::<Dialect>().unwrap(), Dialect::POSTGRES);
        assert_eq!("pg".parse::<Dialect>().unwrap(), Dialect::POSTGRES);
        assert_eq!(" mariadb ".parse::<Dialect>().unwrap(), Dialect::MARIADB);
        assert!("oracle".parse::<Dialect>().is_err());
    }

    #[test]
    fn returning_capability() {
        assert!(Dialect::GENERIC.supports_returning());
        assert!(Dialect::POSTGRES.supports_returning());
        assert!(!Dialect::MYSQL.supports_returning());
    }

    #[test]
    fn default_is_generic() {
        assert_eq!(Dialect::default(), Dialect::GENERIC);
        assert_eq!(Dialect::default().to_string(), "generic");
    }
}
