//! Discovery of migration unit files on disk.
//!
//! Each file in a migration directory is one unit whose id is the file stem:
//!
//! - `<id>.sql`: statements split on top-level `;`. A first line of
//!   `-- vp:no-transaction` runs the unit outside a transaction.
//! - `<id>.yml` / `<id>.yaml`: a declarative unit with `transaction` and
//!   `steps` keys (see [`Step`]).
//!
//! Units are returned sorted by id. The bootstrapper never re-sorts, so this
//! is where execution order is decided.

use crate::error::{CoreError, CoreResult};
use crate::serde_helpers::default_true;
use crate::sql_utils::split_statements;
use crate::unit::{MigrationUnit, Step};
use crate::unit_id::UnitId;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Directive that marks a `.sql` unit as non-transactional.
pub const NO_TRANSACTION_DIRECTIVE: &str = "-- vp:no-transaction";

/// YAML unit file layout.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UnitFile {
    #[serde(default = "default_true")]
    transaction: bool,
    steps: Vec<Step>,
}

/// Discover units in `dirs`, sorted by id.
///
/// Missing directories are skipped. Subdirectories and files with other
/// extensions are ignored. A repeated id is an error.
pub fn discover_units(dirs: &[PathBuf]) -> CoreResult<Vec<MigrationUnit>> {
    let mut units: BTreeMap<UnitId, MigrationUnit> = BTreeMap::new();

    for dir in dirs {
        if !dir.is_dir() {
            log::debug!("Migration directory {} not found, skipping", dir.display());
            continue;
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(|e| CoreError::IoWithPath {
            path: dir.display().to_string(),
            source: e,
        })? {
            let entry = entry.map_err(|e| CoreError::IoWithPath {
                path: dir.display().to_string(),
                source: e,
            })?;
            let path = entry.path();
            if path.is_file() && unit_kind(&path).is_some() {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            let unit = load_unit(&path)?;
            insert_unique(&mut units, unit)?;
        }
    }

    Ok(units.into_values().collect())
}

/// Merge built-in units with discovered ones into one id-sorted list.
pub fn merge_units(
    builtin: Vec<MigrationUnit>,
    discovered: Vec<MigrationUnit>,
) -> CoreResult<Vec<MigrationUnit>> {
    let mut units: BTreeMap<UnitId, MigrationUnit> = BTreeMap::new();
    for unit in builtin.into_iter().chain(discovered) {
        insert_unique(&mut units, unit)?;
    }
    Ok(units.into_values().collect())
}

fn insert_unique(
    units: &mut BTreeMap<UnitId, MigrationUnit>,
    unit: MigrationUnit,
) -> CoreResult<()> {
    if let Some(existing) = units.get(&unit.id) {
        return Err(CoreError::DuplicateUnit {
            id: unit.id.to_string(),
            first: existing.origin.clone(),
            second: unit.origin,
        });
    }
    units.insert(unit.id.clone(), unit);
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitKind {
    Sql,
    Yaml,
}

fn unit_kind(path: &Path) -> Option<UnitKind> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("sql") => Some(UnitKind::Sql),
        Some("yml" | "yaml") => Some(UnitKind::Yaml),
        _ => None,
    }
}

/// Load a single unit file.
pub fn load_unit(path: &Path) -> CoreResult<MigrationUnit> {
    let kind = unit_kind(path).ok_or_else(|| CoreError::UnitParseError {
        path: path.display().to_string(),
        details: "expected a .sql, .yml or .yaml file".to_string(),
    })?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| CoreError::UnitParseError {
            path: path.display().to_string(),
            details: "file name is not valid UTF-8".to_string(),
        })?;
    let id = UnitId::parse(stem)?;

    let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
        path: path.display().to_string(),
        source: e,
    })?;

    let unit = match kind {
        UnitKind::Sql => parse_sql_unit(id, &content),
        UnitKind::Yaml => parse_yaml_unit(id, &content).map_err(|e| CoreError::UnitParseError {
            path: path.display().to_string(),
            details: e.to_string(),
        })?,
    }
    .with_origin(path.display().to_string());

    unit.validate()?;
    Ok(unit)
}

fn parse_sql_unit(id: UnitId, content: &str) -> MigrationUnit {
    let first_line = content.lines().find(|l| !l.trim().is_empty());
    let transactional = !matches!(first_line, Some(l) if l.trim() == NO_TRANSACTION_DIRECTIVE);

    let mut unit = split_statements(content)
        .into_iter()
        .fold(MigrationUnit::new(id), MigrationUnit::sql);
    unit.transactional = transactional;
    unit
}

fn parse_yaml_unit(id: UnitId, content: &str) -> Result<MigrationUnit, serde_yaml::Error> {
    let file: UnitFile = serde_yaml::from_str(content)?;
    let mut unit = MigrationUnit::new(id);
    unit.steps = file.steps;
    unit.transactional = file.transaction;
    Ok(unit)
}

#[cfg(test)]
#[path = "discovery_test.rs"]
mod tests;
