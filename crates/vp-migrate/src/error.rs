//! Error types for the schema bootstrapper.
//!
//! A failing statement inside a unit is not an error here: it is reported as
//! a [`crate::UnitFailure`] in the bootstrap result. These variants cover the
//! conditions that stop a run before or around the unit loop.

use thiserror::Error;
use vp_db::DbError;

/// Bootstrapper errors.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// The database cannot be reached (M001).
    #[error("[M001] Database connection failed: {0}")]
    Connection(#[source] DbError),

    /// The ledger table is missing and could not be created, or is unreadable (M002).
    #[error("[M002] Migration ledger '{table}' is unusable: {reason}")]
    LedgerCorruption { table: String, reason: String },

    /// Another runner holds the bootstrap lock (M003).
    #[error("[M003] Bootstrap lock held by {holder} since {acquired_at}")]
    LockHeld { holder: String, acquired_at: String },

    /// Units were not supplied in strictly increasing id order (M004).
    #[error("[M004] Migrations out of order: '{previous}' must sort before '{next}'")]
    OutOfOrder { previous: String, next: String },

    /// Applied units changed since they ran and the drift policy is `fail` (M005).
    #[error("[M005] Applied migrations changed since they ran: {}", units.join(", "))]
    ChecksumDrift { units: Vec<String> },

    /// Lock table bookkeeping failed (M006).
    #[error("[M006] Bootstrap lock bookkeeping failed: {0}")]
    Lock(#[source] DbError),

    /// Other database error outside a unit (M007).
    #[error("[M007] Database error: {0}")]
    Db(#[from] DbError),
}

/// Result type alias for [`MigrateError`].
pub type MigrateResult<T> = Result<T, MigrateError>;
