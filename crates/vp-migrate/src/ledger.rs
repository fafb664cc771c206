//! Ledger of applied migration units.
//!
//! One row per attempt. Success rows are written once and never updated;
//! failed rows are appended next to them and never block a retry.

use crate::error::{MigrateError, MigrateResult};
use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use vp_core::sql_utils::{escape_sql_string, quote_ident, quote_qualified, split_qualified_name};
use vp_core::MigrationUnit;
use vp_db::Database;

/// Columns the ledger must carry for the bootstrapper to trust it.
const REQUIRED_COLUMNS: &[&str] = &[
    "migration_id",
    "applied_at",
    "outcome",
    "checksum",
    "duration_ms",
    "error",
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Result of one recorded attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failed,
}

impl Outcome {
    fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failed => "failed",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Outcome::Success),
            "failed" => Some(Outcome::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the ledger table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedMigrationRecord {
    pub migration_id: String,
    pub applied_at: NaiveDateTime,
    pub outcome: Outcome,
    pub checksum: Option<String>,
    pub duration_ms: Option<i64>,
    pub error: Option<String>,
}

/// Handle on the ledger table.
#[derive(Debug, Clone)]
pub struct Ledger {
    table: String,
}

impl Ledger {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }

    /// Ledger table name as configured
    pub fn table(&self) -> &str {
        &self.table
    }

    fn corruption(&self, reason: impl Into<String>) -> MigrateError {
        MigrateError::LedgerCorruption {
            table: self.table.clone(),
            reason: reason.into(),
        }
    }

    /// Create the ledger if it is missing and check its shape.
    pub fn ensure(&self, db: &dyn Database) -> MigrateResult<()> {
        let (schema, _) = split_qualified_name(&self.table);
        if schema != "main" {
            db.execute(&format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema)))
                .map_err(|e| self.corruption(format!("cannot create schema: {e}")))?;
        }
        db.execute(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                migration_id VARCHAR NOT NULL,
                applied_at   TIMESTAMP NOT NULL DEFAULT current_timestamp,
                outcome      VARCHAR NOT NULL,
                checksum     VARCHAR,
                duration_ms  BIGINT,
                error        VARCHAR
            )",
            quote_qualified(&self.table)
        ))
        .map_err(|e| self.corruption(format!("cannot create table: {e}")))?;

        let mut missing = Vec::new();
        for column in REQUIRED_COLUMNS {
            let present = db
                .column_exists(&self.table, column)
                .map_err(|e| self.corruption(format!("cannot inspect columns: {e}")))?;
            if !present {
                missing.push(*column);
            }
        }
        if !missing.is_empty() {
            return Err(self.corruption(format!("missing columns: {}", missing.join(", "))));
        }
        Ok(())
    }

    /// Whether the ledger table exists at all
    pub fn exists(&self, db: &dyn Database) -> MigrateResult<bool> {
        Ok(db.table_exists(&self.table)?)
    }

    /// Checksums of successfully applied units, keyed by unit id.
    pub fn successful(&self, db: &dyn Database) -> MigrateResult<HashMap<String, Option<String>>> {
        let rows = db
            .query_rows(&format!(
                "SELECT migration_id, checksum FROM {} WHERE outcome = 'success'",
                quote_qualified(&self.table)
            ))
            .map_err(|e| self.corruption(format!("cannot read ledger: {e}")))?;

        let mut applied = HashMap::with_capacity(rows.len());
        for mut row in rows {
            let checksum = row.pop().flatten();
            let Some(id) = row.pop().flatten() else {
                return Err(self.corruption("row with NULL migration_id"));
            };
            // Keep the first checksum if a unit was recorded twice.
            applied.entry(id).or_insert(checksum);
        }
        Ok(applied)
    }

    /// Every ledger row, oldest first.
    pub fn applied_records(&self, db: &dyn Database) -> MigrateResult<Vec<AppliedMigrationRecord>> {
        let rows = db
            .query_rows(&format!(
                "SELECT migration_id, CAST(applied_at AS VARCHAR), outcome, checksum, \
                 duration_ms, error FROM {} ORDER BY applied_at, migration_id",
                quote_qualified(&self.table)
            ))
            .map_err(|e| self.corruption(format!("cannot read ledger: {e}")))?;

        rows.into_iter().map(|row| self.parse_record(row)).collect()
    }

    fn parse_record(&self, row: Vec<Option<String>>) -> MigrateResult<AppliedMigrationRecord> {
        let mut cols = row.into_iter();
        let mut next = || cols.next().flatten();

        let migration_id = next().ok_or_else(|| self.corruption("row with NULL migration_id"))?;
        let applied_at = next()
            .and_then(|s| NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).ok())
            .ok_or_else(|| self.corruption(format!("bad applied_at for '{migration_id}'")))?;
        let outcome = next()
            .as_deref()
            .and_then(Outcome::parse)
            .ok_or_else(|| self.corruption(format!("bad outcome for '{migration_id}'")))?;
        let checksum = next();
        let duration_ms = next().and_then(|s| s.parse().ok());
        let error = next();

        Ok(AppliedMigrationRecord {
            migration_id,
            applied_at,
            outcome,
            checksum,
            duration_ms,
            error,
        })
    }

    /// INSERT statement recording an attempt of `unit`.
    pub(crate) fn insert_sql(
        &self,
        unit: &MigrationUnit,
        outcome: Outcome,
        duration: Duration,
        error: Option<&str>,
    ) -> String {
        let error = match error {
            Some(e) => format!("'{}'", escape_sql_string(e)),
            None => "NULL".to_string(),
        };
        format!(
            "INSERT INTO {} (migration_id, applied_at, outcome, checksum, duration_ms, error) \
             VALUES ('{}', TIMESTAMP '{}', '{}', '{}', {}, {})",
            quote_qualified(&self.table),
            escape_sql_string(unit.id.as_str()),
            Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S%.6f"),
            outcome.as_str(),
            unit.checksum(),
            i64::try_from(duration.as_millis()).unwrap_or(i64::MAX),
            error
        )
    }

    /// Append a failed attempt. Runs outside any unit transaction.
    pub(crate) fn record_failure(
        &self,
        db: &dyn Database,
        unit: &MigrationUnit,
        duration: Duration,
        error: &str,
    ) -> MigrateResult<()> {
        db.execute(&self.insert_sql(unit, Outcome::Failed, duration, Some(error)))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
