//! Error types for the pet store infrastructure
//!
//! These cover storage, configuration and parsing failures. Business rule
//! violations are reported through [`crate::application::ApplicationError`].

use thiserror::Error;

/// Result type alias using the infrastructure [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// SQLite primary and extended result codes that signal lock contention or a
/// stale read snapshot.
const CONTENTION_CODES: &[&str] = &["5", "6", "261", "262", "517"];

/// Infrastructure error types
#[derive(Error, Debug)]
pub enum Error {
    // Database errors (E400-E499)
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Stored value could not be read: {0}")]
    Parse(String),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::DatabaseError(_) => "E400",
            Self::Parse(_) => "E401",
            Self::ConfigError(_) => "E600",
            Self::Serialization(_) => "E601",
            Self::Io(_) => "E9999",
        }
    }

    /// Whether the store rejected the statement because another transaction
    /// holds the write lock or has committed since this one started reading.
    pub fn is_contention(&self) -> bool {
        match self {
            Self::DatabaseError(sqlx::Error::Database(db_err)) => {
                let code_matches = db_err
                    .code()
                    .map(|code| CONTENTION_CODES.iter().any(|known| *known == code))
                    .unwrap_or(false);
                code_matches || db_err.message().contains("database is locked")
            }
            Self::DatabaseError(sqlx::Error::PoolTimedOut) => true,
            _ => false,
        }
    }

    /// Whether the statement violated a UNIQUE constraint
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::DatabaseError(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }

    /// Name of the column involved in a UNIQUE violation, if SQLite reported one
    ///
    /// SQLite reports `UNIQUE constraint failed: table.column`.
    pub fn unique_violation_column(&self) -> Option<String> {
        match self {
            Self::DatabaseError(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                db_err
                    .message()
                    .rsplit_once('.')
                    .map(|(_, column)| column.trim().to_string())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::Parse("x".into()).code(), "E401");
        assert_eq!(Error::ConfigError("x".into()).code(), "E600");
        assert_eq!(Error::DatabaseError(sqlx::Error::RowNotFound).code(), "E400");
    }

    #[test]
    fn test_pool_timeout_counts_as_contention() {
        assert!(Error::DatabaseError(sqlx::Error::PoolTimedOut).is_contention());
        assert!(!Error::DatabaseError(sqlx::Error::RowNotFound).is_contention());
        assert!(!Error::Parse("bad".into()).is_contention());
    }

    #[test]
    fn test_non_database_errors_are_not_unique_violations() {
        assert!(!Error::ConfigError("x".into()).is_unique_violation());
        assert!(Error::ConfigError("x".into()).unique_violation_column().is_none());
    }
}
