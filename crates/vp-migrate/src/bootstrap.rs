//! The bootstrap run loop.
//!
//! Units run strictly in the order supplied. An applied unit is skipped by id;
//! a pending unit runs inside its own transaction (unless it opts out) with
//! its ledger row written in the same transaction. The first failing
//! statement rolls its unit back and halts the run.

use crate::error::{MigrateError, MigrateResult};
use crate::executor::{apply_steps, exec};
use crate::ledger::{Ledger, Outcome};
use crate::lock::RunLock;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;
use vp_core::{DriftPolicy, MigrationUnit, MigrationsConfig, UnitId};
use vp_db::Database;

/// Settings for one bootstrap run.
#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    /// Ledger table name
    pub ledger_table: String,
    /// Lock table name
    pub lock_table: String,
    /// What to do when an applied unit's content changed
    pub drift_policy: DriftPolicy,
    /// Token written to the lock row while this run holds it
    pub holder: String,
}

impl BootstrapOptions {
    pub fn from_config(config: &MigrationsConfig) -> Self {
        Self {
            ledger_table: config.ledger_table.clone(),
            lock_table: config.lock_table.clone(),
            drift_policy: config.on_checksum_drift,
            holder: RunLock::default_holder(),
        }
    }
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self::from_config(&MigrationsConfig::default())
    }
}

/// The statement that stopped a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitFailure {
    /// Unit being applied
    pub unit: UnitId,
    /// Statement text (or probe description) that failed
    pub statement: String,
    /// Driver error text
    pub cause: String,
}

impl UnitFailure {
    pub(crate) fn new(unit: &UnitId, statement: &str, cause: impl std::fmt::Display) -> Self {
        Self {
            unit: unit.clone(),
            statement: statement.to_string(),
            cause: cause.to_string(),
        }
    }
}

impl std::fmt::Display for UnitFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "migration {} failed at `{}`: {}",
            self.unit, self.statement, self.cause
        )
    }
}

/// Outcome of a bootstrap run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BootstrapResult {
    pub units_applied: usize,
    pub units_skipped: usize,
    pub failed_unit: Option<UnitId>,
    pub failure: Option<UnitFailure>,
    /// Applied units whose current content differs from what was recorded
    pub drifted: Vec<UnitId>,
}

impl BootstrapResult {
    /// True when no unit failed
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Bring `db` up to date with `units`.
///
/// Fatal conditions (unreachable database, unusable ledger, held lock,
/// unordered units, drift under [`DriftPolicy::Fail`]) return `Err` before
/// any unit runs. A failing unit is reported in the result instead.
pub fn bootstrap(
    db: &dyn Database,
    units: &[MigrationUnit],
    options: &BootstrapOptions,
) -> MigrateResult<BootstrapResult> {
    db.query_scalar("SELECT 1")
        .map_err(MigrateError::Connection)?;
    check_order(units)?;

    let ledger = Ledger::new(options.ledger_table.as_str());
    ledger.ensure(db)?;

    let lock = RunLock::new(options.lock_table.as_str(), options.holder.as_str());
    lock.acquire(db)?;
    log::info!(
        "Bootstrapping {} database with {} migration(s)",
        db.db_type(),
        units.len()
    );

    let outcome = run_locked(db, units, &ledger, options.drift_policy);

    if let Err(e) = lock.release(db) {
        log::error!("Failed to release bootstrap lock held by {}: {e}", lock.holder());
    }
    outcome
}

/// Ids must be strictly increasing; this also rejects duplicates.
fn check_order(units: &[MigrationUnit]) -> MigrateResult<()> {
    for pair in units.windows(2) {
        if pair[0].id >= pair[1].id {
            return Err(MigrateError::OutOfOrder {
                previous: pair[0].id.to_string(),
                next: pair[1].id.to_string(),
            });
        }
    }
    Ok(())
}

fn detect_drift(units: &[MigrationUnit], applied: &HashMap<String, Option<String>>) -> Vec<UnitId> {
    units
        .iter()
        .filter(|unit| {
            matches!(
                applied.get(unit.id.as_str()),
                Some(Some(recorded)) if *recorded != unit.checksum()
            )
        })
        .map(|unit| unit.id.clone())
        .collect()
}

fn run_locked(
    db: &dyn Database,
    units: &[MigrationUnit],
    ledger: &Ledger,
    drift_policy: DriftPolicy,
) -> MigrateResult<BootstrapResult> {
    let applied = ledger.successful(db)?;
    let mut result = BootstrapResult::default();

    let drifted = detect_drift(units, &applied);
    match drift_policy {
        DriftPolicy::Ignore => {}
        DriftPolicy::Warn => {
            for id in &drifted {
                log::warn!("Migration {id} changed since it was applied; the change is not executed");
            }
            result.drifted = drifted;
        }
        DriftPolicy::Fail if !drifted.is_empty() => {
            return Err(MigrateError::ChecksumDrift {
                units: drifted.iter().map(ToString::to_string).collect(),
            });
        }
        DriftPolicy::Fail => {}
    }

    let latest_applied = units
        .iter()
        .filter(|unit| applied.contains_key(unit.id.as_str()))
        .map(|unit| &unit.id)
        .max();

    for unit in units {
        if applied.contains_key(unit.id.as_str()) {
            log::debug!("Skipping migration {} (already applied)", unit.id);
            result.units_skipped += 1;
            continue;
        }
        if let Some(latest) = latest_applied {
            if unit.id < *latest {
                log::warn!(
                    "Migration {} sorts before already applied {latest}; applying it now",
                    unit.id
                );
            }
        }

        log::info!(
            "Applying migration {} ({} step(s), from {})",
            unit.id,
            unit.steps.len(),
            unit.origin
        );
        let started = Instant::now();
        match apply_unit(db, unit, ledger, started) {
            Ok(()) => {
                result.units_applied += 1;
                log::info!(
                    "Applied migration {} in {}ms",
                    unit.id,
                    started.elapsed().as_millis()
                );
            }
            Err(failure) => {
                log::error!(
                    "Migration {} failed at statement `{}`: {}",
                    failure.unit,
                    failure.statement,
                    failure.cause
                );
                if let Err(e) = ledger.record_failure(db, unit, started.elapsed(), &failure.cause) {
                    log::warn!("Could not record failure of {}: {e}", unit.id);
                }
                result.failed_unit = Some(unit.id.clone());
                result.failure = Some(failure);
                break;
            }
        }
    }

    Ok(result)
}

/// Apply one unit and write its success row.
fn apply_unit(
    db: &dyn Database,
    unit: &MigrationUnit,
    ledger: &Ledger,
    started: Instant,
) -> Result<(), UnitFailure> {
    let record = |db: &dyn Database| {
        exec(
            db,
            unit,
            &ledger.insert_sql(unit, Outcome::Success, started.elapsed(), None),
        )
    };

    if !unit.transactional {
        apply_steps(db, unit)?;
        return record(db);
    }

    db.begin()
        .map_err(|e| UnitFailure::new(&unit.id, "BEGIN TRANSACTION", e))?;
    let applied = apply_steps(db, unit)
        .and_then(|()| record(db))
        .and_then(|()| {
            db.commit()
                .map_err(|e| UnitFailure::new(&unit.id, "COMMIT", e))
        });
    if applied.is_err() {
        if let Err(e) = db.rollback() {
            log::warn!("Rollback of migration {} failed: {e}", unit.id);
        }
    }
    applied
}

#[cfg(test)]
#[path = "bootstrap_test.rs"]
mod tests;
