//! Migrate command implementation

use anyhow::{Context, Result};
use vp_migrate::{bootstrap, BootstrapOptions};

use crate::cli::GlobalArgs;
use crate::commands::common::{
    collect_units, load_project, open_database, ExitCode, EXIT_UNIT_FAILED,
};

/// Bring the database up to date with every known migration.
pub(crate) fn execute(global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let units = collect_units(&project)?;
    let db = open_database(&project, global)?;
    let options = BootstrapOptions::from_config(&project.config.migrations);

    let result = bootstrap(&db, &units, &options).context("Bootstrap aborted")?;

    for id in &result.drifted {
        println!("Drifted: {id} (changed since it was applied; not re-run)");
    }
    println!(
        "Migrations: {} applied, {} skipped, {} failed",
        result.units_applied,
        result.units_skipped,
        usize::from(result.failure.is_some())
    );

    if let Some(failure) = &result.failure {
        eprintln!("Migration {} failed", failure.unit);
        eprintln!("  statement: {}", failure.statement);
        eprintln!("  cause:     {}", failure.cause);
        return Err(ExitCode(EXIT_UNIT_FAILED).into());
    }
    Ok(())
}
