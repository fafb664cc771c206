//! Database trait definitions

use crate::error::DbResult;

/// Engine-specific existence checks against the schema catalog.
///
/// Names may be schema-qualified (`schema.table`); unqualified names resolve
/// against the engine's default schema. Comparisons are case-insensitive to
/// match unquoted SQL identifier semantics.
pub trait Catalog {
    /// Check if a table or view exists
    fn table_exists(&self, table: &str) -> DbResult<bool>;

    /// Check if `column` exists on `table`
    fn column_exists(&self, table: &str, column: &str) -> DbResult<bool>;

    /// Check if an index named `index` exists on `table`
    fn index_exists(&self, table: &str, index: &str) -> DbResult<bool>;
}

/// Connection contract the schema bootstrapper is written against.
///
/// Calls block until the engine answers. One connection is used for a whole
/// bootstrap run; transaction state lives on that connection.
pub trait Database: Catalog {
    /// Execute a single statement, returns affected rows
    fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Start a transaction
    fn begin(&self) -> DbResult<()>;

    /// Commit the open transaction
    fn commit(&self) -> DbResult<()>;

    /// Roll back the open transaction
    fn rollback(&self) -> DbResult<()>;

    /// Run a query returning a single integer (first column of first row)
    fn query_scalar(&self, sql: &str) -> DbResult<i64>;

    /// Run a query and return every row with values rendered as text
    fn query_rows(&self, sql: &str) -> DbResult<Vec<Vec<Option<String>>>>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}
