//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::row_helpers::collect_rows;
use crate::timeout::Watchdog;
use crate::traits::{Catalog, Database};
use duckdb::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use vp_core::sql_utils::{escape_sql_string, split_qualified_name};

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
    statement_timeout: Option<Duration>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self::from_connection(conn))
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        log::debug!("Opened DuckDB database at {}", path.display());
        Ok(Self::from_connection(conn))
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            statement_timeout: None,
        }
    }

    /// Bound every statement by `timeout` (`None` disables the bound)
    pub fn with_statement_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.statement_timeout = timeout;
        self
    }

    /// Currently configured statement timeout
    pub fn statement_timeout(&self) -> Option<Duration> {
        self.statement_timeout
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Run `f` on the connection under the statement timeout.
    fn run<T, F>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&Connection) -> duckdb::Result<T>,
    {
        let conn = self.lock()?;
        let Some(timeout) = self.statement_timeout else {
            return f(&conn).map_err(DbError::from);
        };

        let watchdog = Watchdog::arm(conn.interrupt_handle(), timeout);
        let result = f(&conn);
        let fired = watchdog.disarm();

        match result {
            Ok(v) => Ok(v),
            Err(_) if fired => Err(DbError::Timeout { timeout }),
            Err(e) => Err(e.into()),
        }
    }

    /// Run a transaction-control statement under the statement timeout.
    fn control(&self, sql: &str) -> DbResult<()> {
        self.run(|conn| conn.execute_batch(sql)).map_err(|e| match e {
            DbError::ExecutionError(msg)
            | DbError::ConstraintViolation(msg)
            | DbError::TableNotFound(msg) => {
                DbError::TransactionError(format!("{sql} failed: {msg}"))
            }
            other => other,
        })
    }

    fn count(&self, sql: &str) -> DbResult<bool> {
        Ok(self.query_scalar(sql)? > 0)
    }
}

impl Catalog for DuckDbBackend {
    fn table_exists(&self, table: &str) -> DbResult<bool> {
        let (schema, table) = split_qualified_name(table);
        self.count(&format!(
            "SELECT COUNT(*) FROM information_schema.tables \
             WHERE lower(table_schema) = lower('{}') AND lower(table_name) = lower('{}')",
            escape_sql_string(schema),
            escape_sql_string(table)
        ))
    }

    fn column_exists(&self, table: &str, column: &str) -> DbResult<bool> {
        let (schema, table) = split_qualified_name(table);
        self.count(&format!(
            "SELECT COUNT(*) FROM information_schema.columns \
             WHERE lower(table_schema) = lower('{}') AND lower(table_name) = lower('{}') \
             AND lower(column_name) = lower('{}')",
            escape_sql_string(schema),
            escape_sql_string(table),
            escape_sql_string(column)
        ))
    }

    fn index_exists(&self, table: &str, index: &str) -> DbResult<bool> {
        let (schema, table) = split_qualified_name(table);
        self.count(&format!(
            "SELECT COUNT(*) FROM duckdb_indexes() \
             WHERE lower(schema_name) = lower('{}') AND lower(table_name) = lower('{}') \
             AND lower(index_name) = lower('{}')",
            escape_sql_string(schema),
            escape_sql_string(table),
            escape_sql_string(index)
        ))
    }
}

impl Database for DuckDbBackend {
    fn execute(&self, sql: &str) -> DbResult<usize> {
        self.run(|conn| conn.execute(sql, []))
    }

    fn begin(&self) -> DbResult<()> {
        self.control("BEGIN TRANSACTION")
    }

    fn commit(&self) -> DbResult<()> {
        self.control("COMMIT")
    }

    fn rollback(&self) -> DbResult<()> {
        self.control("ROLLBACK")
    }

    fn query_scalar(&self, sql: &str) -> DbResult<i64> {
        self.run(|conn| conn.query_row(sql, [], |row| row.get::<_, i64>(0)))
    }

    fn query_rows(&self, sql: &str) -> DbResult<Vec<Vec<Option<String>>>> {
        self.run(|conn| {
            let mut stmt = conn.prepare(sql)?;
            collect_rows(&mut stmt)
        })
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
