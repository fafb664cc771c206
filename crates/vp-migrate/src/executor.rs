//! Probe-then-apply execution of a unit's steps.

use crate::bootstrap::UnitFailure;
use vp_core::{MigrationUnit, Probe, Step};
use vp_db::{Database, DbResult};

/// Whether the object a probe looks for is already present.
pub(crate) fn probe_present(db: &dyn Database, probe: &Probe) -> DbResult<bool> {
    match probe {
        Probe::Table { table } => db.table_exists(table),
        Probe::Column { table, column } => db.column_exists(table, column),
        Probe::Index { table, index } => db.index_exists(table, index),
        Probe::RowCount { sql } => Ok(db.query_scalar(sql)? > 0),
    }
}

fn probe_label(probe: &Probe) -> String {
    match probe {
        Probe::Table { table } => format!("catalog probe: table {table}"),
        Probe::Column { table, column } => format!("catalog probe: column {table}.{column}"),
        Probe::Index { table, index } => format!("catalog probe: index {index} on {table}"),
        Probe::RowCount { sql } => sql.clone(),
    }
}

/// Execute one statement, capturing the failure with its text.
pub(crate) fn exec(db: &dyn Database, unit: &MigrationUnit, sql: &str) -> Result<(), UnitFailure> {
    log::debug!("[{}] {}", unit.id, sql);
    db.execute(sql)
        .map(|_| ())
        .map_err(|e| UnitFailure::new(&unit.id, sql, e))
}

/// Run every step of `unit` in order. Stops at the first failing statement.
pub(crate) fn apply_steps(db: &dyn Database, unit: &MigrationUnit) -> Result<(), UnitFailure> {
    for step in &unit.steps {
        match step {
            Step::Sql(sql) => exec(db, unit, sql)?,
            Step::Object(object) => {
                let probe = object.probe();
                let present = probe_present(db, &probe)
                    .map_err(|e| UnitFailure::new(&unit.id, &probe_label(&probe), e))?;
                if present {
                    log::debug!("[{}] {} already present", unit.id, object.describe());
                    continue;
                }
                for statement in object.statements() {
                    exec(db, unit, &statement)?;
                }
            }
        }
    }
    Ok(())
}
