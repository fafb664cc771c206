//! Read-only view of where each unit stands.

use crate::bootstrap::BootstrapOptions;
use crate::error::MigrateResult;
use crate::ledger::{AppliedMigrationRecord, Ledger, Outcome};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeSet;
use vp_core::{MigrationUnit, UnitId};
use vp_db::Database;

/// State of one supplied unit against the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitState {
    Applied,
    Pending,
    /// Not applied; the last attempt failed
    Failed,
    /// Applied, but the content changed since
    Drifted,
}

impl std::fmt::Display for UnitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UnitState::Applied => "applied",
            UnitState::Pending => "pending",
            UnitState::Failed => "failed",
            UnitState::Drifted => "drifted",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitStatus {
    pub id: UnitId,
    pub state: UnitState,
    pub applied_at: Option<NaiveDateTime>,
    pub last_error: Option<String>,
    pub origin: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub units: Vec<UnitStatus>,
    /// Ledger ids with no matching supplied unit
    pub orphaned: Vec<String>,
}

impl StatusReport {
    pub fn count(&self, state: UnitState) -> usize {
        self.units.iter().filter(|u| u.state == state).count()
    }
}

/// Compare `units` with the ledger without writing anything.
pub fn status(
    db: &dyn Database,
    units: &[MigrationUnit],
    options: &BootstrapOptions,
) -> MigrateResult<StatusReport> {
    let ledger = Ledger::new(options.ledger_table.as_str());
    let records = if ledger.exists(db)? {
        ledger.applied_records(db)?
    } else {
        Vec::new()
    };

    let statuses = units
        .iter()
        .map(|unit| unit_status(unit, &records))
        .collect();

    let known: BTreeSet<&str> = units.iter().map(|u| u.id.as_str()).collect();
    let orphaned: BTreeSet<String> = records
        .iter()
        .filter(|r| !known.contains(r.migration_id.as_str()))
        .map(|r| r.migration_id.clone())
        .collect();

    Ok(StatusReport {
        units: statuses,
        orphaned: orphaned.into_iter().collect(),
    })
}

fn unit_status(unit: &MigrationUnit, records: &[AppliedMigrationRecord]) -> UnitStatus {
    let mut history = records.iter().filter(|r| r.migration_id == unit.id.as_str());

    let success = history
        .clone()
        .find(|r| r.outcome == Outcome::Success);
    let (state, applied_at, last_error) = match success {
        Some(record) => {
            let drifted = matches!(&record.checksum, Some(c) if *c != unit.checksum());
            let state = if drifted {
                UnitState::Drifted
            } else {
                UnitState::Applied
            };
            (state, Some(record.applied_at), None)
        }
        None => match history.next_back() {
            Some(last) if last.outcome == Outcome::Failed => {
                (UnitState::Failed, None, last.error.clone())
            }
            _ => (UnitState::Pending, None, None),
        },
    };

    UnitStatus {
        id: unit.id.clone(),
        state,
        applied_at,
        last_error,
        origin: unit.origin.clone(),
    }
}
