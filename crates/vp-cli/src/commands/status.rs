//! Status command implementation

use anyhow::{Context, Result};
use vp_migrate::{status, BootstrapOptions, StatusReport};

use crate::cli::{GlobalArgs, StatusArgs};
use crate::commands::common::{collect_units, load_project, open_database, print_table};

/// Show where every migration stands against the ledger.
pub(crate) fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let units = collect_units(&project)?;
    let db = open_database(&project, global)?;
    let options = BootstrapOptions::from_config(&project.config.migrations);

    let report = status(&db, &units, &options).context("Failed to read migration status")?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize status")?;
        println!("{json}");
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &StatusReport) {
    let rows: Vec<Vec<String>> = report
        .units
        .iter()
        .map(|unit| {
            vec![
                unit.id.to_string(),
                unit.state.to_string(),
                unit.applied_at
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "-".to_string()),
                unit.origin.clone(),
            ]
        })
        .collect();
    print_table(&["ID", "STATE", "APPLIED AT", "ORIGIN"], &rows);

    for unit in &report.units {
        if let Some(error) = &unit.last_error {
            println!("\n{} last failed: {error}", unit.id);
        }
    }
    if !report.orphaned.is_empty() {
        println!("\nIn the ledger but not known to this project:");
        for id in &report.orphaned {
            println!("  {id}");
        }
    }
}
