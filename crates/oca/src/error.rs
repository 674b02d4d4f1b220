//! Error types for oca

use thiserror::Error;

/// Result type alias for oca operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for mapping, query building and execution
#[derive(Debug, Error)]
pub enum OrmError {
    /// Query execution error reported by the driver
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// A column declared by the entity is missing from the result set
    #[error("Cannot map column '{column}': not present in result set")]
    ColumnMapping { column: String },

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Validation error (builder state, condition arity, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// The active dialect cannot express the requested statement
    #[error("Unsupported by dialect '{dialect}': {feature}")]
    Unsupported {
        dialect: &'static str,
        feature: &'static str,
    },

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a column mapping error
    pub fn column_mapping(column: impl Into<String>) -> Self {
        Self::ColumnMapping {
            column: column.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Check if this is a column mapping error
    pub fn is_column_mapping(&self) -> bool {
        matches!(self, Self::ColumnMapping { .. })
    }

    /// Parse a tokio_postgres error into a more specific OrmError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                "23514" => return Self::CheckViolation(format!("{}: {}", constraint, message)),
                _ => {}
            }
        }
        Self::Query(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for OrmError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_mapping_message_names_the_column() {
        let err = OrmError::column_mapping("created_at");
        assert!(err.is_column_mapping());
        assert_eq!(
            err.to_string(),
            "Cannot map column 'created_at': not present in result set"
        );
    }

    #[test]
    fn unsupported_message() {
        let err = OrmError::Unsupported {
            dialect: "mysql",
            feature: "RETURNING",
        };
        assert_eq!(err.to_string(), "Unsupported by dialect 'mysql': RETURNING");
    }
}
