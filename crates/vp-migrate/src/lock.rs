//! Single-row run lock.
//!
//! The lock table has a primary key on `lock_id` and at most one row. A
//! runner owns the lock while its row exists; a second insert fails with a
//! constraint violation.

use crate::error::{MigrateError, MigrateResult};
use chrono::Utc;
use vp_core::sql_utils::{escape_sql_string, quote_ident, quote_qualified, split_qualified_name};
use vp_db::{Database, DbError};

const LOCK_ID: i64 = 1;

/// Run lock owned by one holder token.
#[derive(Debug, Clone)]
pub struct RunLock {
    table: String,
    holder: String,
}

impl RunLock {
    pub fn new(table: impl Into<String>, holder: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            holder: holder.into(),
        }
    }

    /// Holder token for a process: pid plus a random suffix.
    pub fn default_holder() -> String {
        format!("pid-{}-{}", std::process::id(), uuid::Uuid::new_v4())
    }

    pub fn holder(&self) -> &str {
        &self.holder
    }

    fn ensure_table(&self, db: &dyn Database) -> MigrateResult<()> {
        let (schema, _) = split_qualified_name(&self.table);
        if schema != "main" {
            db.execute(&format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema)))
                .map_err(MigrateError::Lock)?;
        }
        db.execute(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                lock_id     INTEGER PRIMARY KEY,
                holder      VARCHAR NOT NULL,
                acquired_at TIMESTAMP NOT NULL
            )",
            quote_qualified(&self.table)
        ))
        .map_err(MigrateError::Lock)?;
        Ok(())
    }

    /// Take the lock, or report who holds it.
    pub fn acquire(&self, db: &dyn Database) -> MigrateResult<()> {
        self.ensure_table(db)?;
        let insert = format!(
            "INSERT INTO {} (lock_id, holder, acquired_at) VALUES ({LOCK_ID}, '{}', TIMESTAMP '{}')",
            quote_qualified(&self.table),
            escape_sql_string(&self.holder),
            Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S%.6f")
        );
        match db.execute(&insert) {
            Ok(_) => {
                log::debug!("Acquired bootstrap lock as {}", self.holder);
                Ok(())
            }
            Err(DbError::ConstraintViolation(_)) => {
                let (holder, acquired_at) = self
                    .current_holder(db)?
                    .unwrap_or_else(|| ("unknown".to_string(), "unknown".to_string()));
                Err(MigrateError::LockHeld {
                    holder,
                    acquired_at,
                })
            }
            Err(e) => Err(MigrateError::Lock(e)),
        }
    }

    /// Release the lock if this holder owns it. Returns whether a row was removed.
    pub fn release(&self, db: &dyn Database) -> MigrateResult<bool> {
        let removed = db
            .execute(&format!(
                "DELETE FROM {} WHERE lock_id = {LOCK_ID} AND holder = '{}'",
                quote_qualified(&self.table),
                escape_sql_string(&self.holder)
            ))
            .map_err(MigrateError::Lock)?;
        if removed == 0 {
            log::warn!("Bootstrap lock was not held by {}", self.holder);
        } else {
            log::debug!("Released bootstrap lock");
        }
        Ok(removed > 0)
    }

    /// Current `(holder, acquired_at)`, if the lock is taken.
    pub fn current_holder(&self, db: &dyn Database) -> MigrateResult<Option<(String, String)>> {
        if !db.table_exists(&self.table).map_err(MigrateError::Lock)? {
            return Ok(None);
        }
        let rows = db
            .query_rows(&format!(
                "SELECT holder, CAST(acquired_at AS VARCHAR) FROM {} WHERE lock_id = {LOCK_ID}",
                quote_qualified(&self.table)
            ))
            .map_err(MigrateError::Lock)?;
        Ok(rows.into_iter().next().map(|mut row| {
            let acquired_at = row.pop().flatten().unwrap_or_default();
            let holder = row.pop().flatten().unwrap_or_default();
            (holder, acquired_at)
        }))
    }

    /// Remove the lock regardless of holder. Returns the holder that was evicted.
    pub fn force_release(&self, db: &dyn Database) -> MigrateResult<Option<String>> {
        let Some((holder, _)) = self.current_holder(db)? else {
            return Ok(None);
        };
        db.execute(&format!(
            "DELETE FROM {} WHERE lock_id = {LOCK_ID}",
            quote_qualified(&self.table)
        ))
        .map_err(MigrateError::Lock)?;
        log::warn!("Force-released bootstrap lock held by {holder}");
        Ok(Some(holder))
    }
}

#[cfg(test)]
#[path = "lock_test.rs"]
mod tests;
