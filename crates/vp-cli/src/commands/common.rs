//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use vp_core::{discover_units, merge_units, Config, MigrationUnit};
use vp_db::DuckDbBackend;
use vp_migrate::builtin_units;

use crate::cli::GlobalArgs;

/// A unit failed; the run halted.
pub(crate) const EXIT_UNIT_FAILED: i32 = 1;

/// The run could not start or was aborted (connection, ledger, lock, ordering, config).
pub(crate) const EXIT_FATAL: i32 = 2;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and the database is closed properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; the command already reported what went wrong.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Loaded project: its root directory and parsed config.
pub(crate) struct Project {
    pub(crate) root: PathBuf,
    pub(crate) config: Config,
}

/// Load the project from the directory and config given on the command line.
pub(crate) fn load_project(global: &GlobalArgs) -> Result<Project> {
    let root = PathBuf::from(&global.project_dir);
    let config = match &global.config {
        Some(path) => Config::load(Path::new(path)),
        None => Config::load_from_dir(&root),
    }
    .context("Failed to load project config")?;
    Ok(Project { root, config })
}

/// Built-in units (when enabled) merged with units found in the migration paths.
pub(crate) fn collect_units(project: &Project) -> Result<Vec<MigrationUnit>> {
    let builtin = if project.config.migrations.include_builtin {
        builtin_units()
    } else {
        Vec::new()
    };
    let paths = project.config.migration_paths_absolute(&project.root);
    let discovered = discover_units(&paths).context("Failed to load migration files")?;
    log::debug!(
        "Collected {} built-in and {} discovered migration(s)",
        builtin.len(),
        discovered.len()
    );
    merge_units(builtin, discovered).context("Failed to assemble migrations")
}

/// Open the configured database, honoring `--database` and the statement timeout.
pub(crate) fn open_database(project: &Project, global: &GlobalArgs) -> Result<DuckDbBackend> {
    let path = global
        .database
        .clone()
        .unwrap_or_else(|| project.config.database_path(&project.root));
    let db = DuckDbBackend::new(&path)
        .with_context(|| format!("Failed to connect to database at {path}"))?;
    Ok(db.with_statement_timeout(project.config.migrations.statement_timeout()))
}

// ---------------------------------------------------------------------------
// Table-printing utilities
// ---------------------------------------------------------------------------

/// Calculate column widths for a table given headers and row data.
pub(crate) fn calculate_column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.len());
        }
    }
    widths
}

fn render_row(cells: &[&str], widths: &[usize]) -> String {
    let parts: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &w)| format!("{:<width$}", cell, width = w))
        .collect();
    parts.join("  ").trim_end().to_string()
}

/// Print a formatted table to stdout.
///
/// Prints a left-aligned header row, a separator line of dashes, and each
/// data row. Columns are separated by two spaces.
pub(crate) fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let widths = calculate_column_widths(headers, rows);

    println!("{}", render_row(headers, &widths));
    let separators: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    let separators: Vec<&str> = separators.iter().map(String::as_str).collect();
    println!("{}", render_row(&separators, &widths));
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        println!("{}", render_row(&cells, &widths));
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
