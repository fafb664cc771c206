//! Unlock command implementation

use anyhow::{Context, Result};
use vp_migrate::RunLock;

use crate::cli::GlobalArgs;
use crate::commands::common::{load_project, open_database};

/// Remove the bootstrap lock left behind by a crashed run.
pub(crate) fn execute(global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let db = open_database(&project, global)?;

    let lock = RunLock::new(
        project.config.migrations.lock_table.as_str(),
        RunLock::default_holder(),
    );
    match lock
        .force_release(&db)
        .context("Failed to release bootstrap lock")?
    {
        Some(holder) => println!("Released bootstrap lock held by {holder}"),
        None => println!("No bootstrap lock is held"),
    }
    Ok(())
}
