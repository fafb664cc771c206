//! Error types for vp-db

use std::time::Duration;
use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Table not found (D003)
    #[error("[D003] Table or view not found: {0}")]
    TableNotFound(String),

    /// Constraint violation, e.g. duplicate primary key (D004)
    #[error("[D004] Constraint violated: {0}")]
    ConstraintViolation(String),

    /// Statement interrupted by the statement timeout (D005)
    #[error("[D005] Statement exceeded timeout of {timeout:?}")]
    Timeout { timeout: Duration },

    /// Transaction control failed (D006)
    #[error("[D006] Transaction failed: {0}")]
    TransactionError(String),

    /// Mutex poisoned (D007)
    #[error("[D007] Database mutex poisoned: {0}")]
    MutexPoisoned(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        // duckdb::Error does not expose structured variants for catalog or
        // constraint failures, so classify on the message prefix.
        let msg = err.to_string();
        if msg.contains("Constraint Error") {
            DbError::ConstraintViolation(msg)
        } else if msg.contains("Table with name")
            || msg.contains("Table or view with name")
            || (msg.contains("Catalog Error") && msg.contains("Table") && msg.contains("not exist"))
        {
            DbError::TableNotFound(msg)
        } else {
            DbError::ExecutionError(msg)
        }
    }
}
