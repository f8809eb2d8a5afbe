//! Application layer errors
//!
//! Every service operation fails with one of these. Presentation layers
//! dispatch on [`ApplicationError::kind`].

use std::fmt;

use crate::error::Error;

/// Application layer error types
#[derive(Debug)]
pub enum ApplicationError {
    /// Input rejected before any transaction opened, or a unique value taken
    Validation { field: String, message: String },
    /// Entity not found
    NotFound { entity: String, id: String },
    /// Operation not allowed in current state
    InvalidState {
        entity: String,
        current: String,
        operation: String,
    },
    /// The authorizer denied the operation
    Authorization { operation: String, reason: String },
    /// A concurrent transaction changed the data first
    Conflict { entity: String, id: String },
    /// Infrastructure failure
    Storage(Error),
}

/// Coarse classification of [`ApplicationError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    InvalidState,
    Authorization,
    Conflict,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::InvalidState => "invalid_state",
            Self::Authorization => "authorization",
            Self::Conflict => "conflict",
            Self::Storage => "storage",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ApplicationError {
    /// Create a validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a validation error for a value that must be unique
    pub fn duplicate(field: impl Into<String>, value: impl fmt::Display) -> Self {
        Self::Validation {
            field: field.into(),
            message: format!("'{}' is already taken", value),
        }
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(
        entity: impl Into<String>,
        current: impl ToString,
        operation: impl Into<String>,
    ) -> Self {
        Self::InvalidState {
            entity: entity.into(),
            current: current.to_string(),
            operation: operation.into(),
        }
    }

    /// Create an authorization error
    pub fn unauthorized(operation: impl ToString, reason: impl Into<String>) -> Self {
        Self::Authorization {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::Conflict {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::Authorization { .. } => ErrorKind::Authorization,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Whether running the operation again may succeed
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { field, message } => {
                write!(f, "Validation error for '{}': {}", field, message)
            }
            Self::NotFound { entity, id } => {
                write!(f, "{} with id '{}' not found", entity, id)
            }
            Self::InvalidState {
                entity,
                current,
                operation,
            } => {
                write!(f, "Cannot {} {} in '{}' state", operation, entity, current)
            }
            Self::Authorization { operation, reason } => {
                write!(f, "Not authorized to {}: {}", operation, reason)
            }
            Self::Conflict { entity, id } => {
                write!(f, "{} '{}' was modified concurrently", entity, id)
            }
            Self::Storage(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for ApplicationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Error> for ApplicationError {
    fn from(error: Error) -> Self {
        if error.is_contention() {
            return Self::conflict("database", "locked");
        }
        if error.is_unique_violation() {
            let field = error
                .unique_violation_column()
                .unwrap_or_else(|| "value".to_string());
            return Self::validation(field, "is already taken");
        }
        Self::Storage(error)
    }
}

impl From<sqlx::Error> for ApplicationError {
    fn from(error: sqlx::Error) -> Self {
        Error::DatabaseError(error).into()
    }
}

/// Result type for application operations
pub type AppResult<T> = Result<T, ApplicationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = ApplicationError::validation("email", "must contain '@'");
        assert!(err.to_string().contains("email"));
        assert!(err.to_string().contains("'@'"));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_not_found_error() {
        let err = ApplicationError::not_found("Pet", 42);
        assert!(err.to_string().contains("Pet"));
        assert!(err.to_string().contains("42"));
        assert!(err.to_string().contains("not found"));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_duplicate_is_validation() {
        let err = ApplicationError::duplicate("login", "jane");
        assert!(err.to_string().contains("already taken"));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_invalid_state_error() {
        let err = ApplicationError::invalid_state("Pet", "adopted", "finalize adoption of");
        assert!(err.to_string().contains("Cannot finalize adoption of"));
        assert!(err.to_string().contains("adopted"));
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_conflict_error() {
        let err = ApplicationError::conflict("Pet", 42);
        assert!(err.is_conflict());
        assert!(err.to_string().contains("modified concurrently"));
        assert!(!ApplicationError::not_found("Pet", 42).is_conflict());
    }

    #[test]
    fn test_infrastructure_error_is_storage() {
        let err: ApplicationError = Error::Parse("bad status".into()).into();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_pool_timeout_is_conflict() {
        let err: ApplicationError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }
}
