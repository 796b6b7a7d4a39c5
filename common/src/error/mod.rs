//! Error types for the account ledger
//!
//! Every component reports failures through [`Error`]. Store-specific errors
//! are classified into the ledger taxonomy (conflict, not found, contention,
//! invalid argument, unavailable) as close to their source as possible so that
//! the gateway can map them to RPC faults without looking inside them.

use std::fmt::Display;
use thiserror::Error;

/// Ledger error type
#[derive(Debug, Error)]
pub enum Error {
    /// Uniqueness violation on a username or an account type per user
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A user, account or balance row does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Balance compare-and-swap retries were exhausted
    #[error("Contention: {0}")]
    Contention(String),

    /// Malformed identifier, empty field or disallowed amount
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The store cannot be reached
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// The caller's deadline elapsed before the operation finished
    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Database error that does not fit any other category
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    /// Database migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Decimal conversion error
    #[error("Decimal conversion error: {0}")]
    DecimalError(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether a retry of the same request could succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Contention(_) | Error::Unavailable(_) | Error::DeadlineExceeded(_)
        )
    }
}

/// Extension trait to add context to error results
pub trait ErrorExt<T> {
    /// Add context information to an error
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display;
}

impl<T> ErrorExt<T> for Result<T> {
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display,
    {
        self.map_err(|e| {
            let context = context_fn().to_string();
            match e {
                Error::Conflict(msg) => Error::Conflict(format!("{}: {}", context, msg)),
                Error::NotFound(msg) => Error::NotFound(format!("{}: {}", context, msg)),
                Error::Contention(msg) => Error::Contention(format!("{}: {}", context, msg)),
                Error::InvalidArgument(msg) => Error::InvalidArgument(format!("{}: {}", context, msg)),
                Error::Unavailable(msg) => Error::Unavailable(format!("{}: {}", context, msg)),
                Error::DeadlineExceeded(msg) => Error::DeadlineExceeded(format!("{}: {}", context, msg)),
                Error::ConfigurationError(msg) => Error::ConfigurationError(format!("{}: {}", context, msg)),
                Error::Internal(msg) => Error::Internal(format!("{}: {}", context, msg)),
                Error::DecimalError(msg) => Error::DecimalError(format!("{}: {}", context, msg)),
                Error::Database(e) => Error::Database(e),
                Error::Migration(e) => Error::Migration(e),
            }
        })
    }
}

/// Classify sqlx failures into the ledger taxonomy
impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("row not found".to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                Error::Unavailable(err.to_string())
            }
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                let constraint = db_err.constraint().unwrap_or("unique constraint").to_string();
                Error::Conflict(format!("duplicate key violates {}", constraint))
            }
            other => Error::Database(other),
        }
    }
}

/// Convert string messages into an error
impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::Internal(message)
    }
}

/// Convert static string references into an error
impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Error::Internal(message.to_string())
    }
}

/// From rust_decimal::Error
impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::DecimalError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_keeps_variant() {
        let result: Result<()> = Err(Error::NotFound("balance".to_string()));
        match result.with_context(|| "account 42") {
            Err(Error::NotFound(msg)) => assert_eq!(msg, "account 42: balance"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_pool_failures_are_unavailable() {
        let err: Error = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, Error::Unavailable(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: Error = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(!err.is_transient());
    }
}
