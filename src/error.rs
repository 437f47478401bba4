//! Error types for the database access engine.
//!
//! All errors use `thiserror` and fold into three kinds: precondition
//! violations raised before any I/O, execution failures wrapping the
//! underlying database error, and configuration errors from registry
//! misuse. No operation swallows an error silently.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// Invalid input detected before any statement was prepared
    /// (bad batch size, key/value count mismatch, null key value).
    /// Never retried.
    #[error("Precondition violated: {message}")]
    Precondition { message: String },

    /// Statement preparation, execution or commit failed at the database
    /// layer. Retry policy is the caller's responsibility.
    #[error("Execution failed: {message}")]
    Execution {
        message: String,
        /// e.g. "42P01" for undefined table
        sql_state: Option<String>,
    },

    /// Registry misuse: unknown or duplicate configuration name, or an
    /// incomplete configuration. Initialization-time only.
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl DbError {
    /// Create a precondition error.
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    /// Create an execution error without an SQLSTATE.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
            sql_state: None,
        }
    }

    /// Create an execution error carrying the driver's SQLSTATE.
    pub fn execution_with_state(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::Execution {
            message: message.into(),
            sql_state,
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Check if this error was raised before any I/O happened.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition { .. })
    }

    /// Get the SQLSTATE reported by the database, if any.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Execution { sql_state, .. } => sql_state.as_deref(),
            _ => None,
        }
    }
}

/// Convert sqlx errors into the single wrapped execution kind.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::execution_with_state(db_err.message().to_string(), code)
            }
            other => DbError::execution(other.to_string()),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DbError::precondition("batchSize must be at least 1");
        assert!(err.to_string().contains("Precondition violated"));
        assert!(err.is_precondition());
    }

    #[test]
    fn test_execution_sql_state() {
        let err = DbError::execution_with_state("relation missing", Some("42P01".to_string()));
        assert_eq!(err.sql_state(), Some("42P01"));
        assert!(!err.is_precondition());
    }

    #[test]
    fn test_configuration_has_no_sql_state() {
        let err = DbError::configuration("config not found: analytics");
        assert_eq!(err.sql_state(), None);
    }
}
