//! Configuration types and parsing for vetphysio.yml

use crate::error::{CoreError, CoreResult};
use crate::serde_helpers::default_true;
use crate::sql_utils::is_valid_identifier;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main project configuration from vetphysio.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Practice/project name
    pub name: String,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Schema bootstrap settings
    #[serde(default)]
    pub migrations: MigrationsConfig,
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database path (DuckDB file or `:memory:`)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// What to do when an applied unit's checksum no longer matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DriftPolicy {
    /// Say nothing
    Ignore,
    /// Log a warning and report the unit (default)
    #[default]
    Warn,
    /// Refuse to run
    Fail,
}

impl std::fmt::Display for DriftPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriftPolicy::Ignore => write!(f, "ignore"),
            DriftPolicy::Warn => write!(f, "warn"),
            DriftPolicy::Fail => write!(f, "fail"),
        }
    }
}

/// Schema bootstrap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationsConfig {
    /// Directories containing `.sql` / `.yml` migration units
    #[serde(default = "default_migration_paths")]
    pub paths: Vec<String>,

    /// Include the practice schema units shipped with the tool
    #[serde(default = "default_true")]
    pub include_builtin: bool,

    /// Ledger table recording applied units
    #[serde(default = "default_ledger_table")]
    pub ledger_table: String,

    /// Table holding the single-row run lock
    #[serde(default = "default_lock_table")]
    pub lock_table: String,

    /// Per-statement timeout in seconds (none when absent)
    #[serde(default)]
    pub statement_timeout_secs: Option<u64>,

    /// Behaviour when an applied unit's content has changed
    #[serde(default)]
    pub on_checksum_drift: DriftPolicy,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            paths: default_migration_paths(),
            include_builtin: true,
            ledger_table: default_ledger_table(),
            lock_table: default_lock_table(),
            statement_timeout_secs: None,
            on_checksum_drift: DriftPolicy::default(),
        }
    }
}

impl MigrationsConfig {
    /// Statement timeout as a `Duration`
    pub fn statement_timeout(&self) -> Option<Duration> {
        self.statement_timeout_secs.map(Duration::from_secs)
    }
}

const DEFAULT_DB_PATH: &str = ":memory:";

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_migration_paths() -> Vec<String> {
    vec!["migrations".to_string()]
}

fn default_ledger_table() -> String {
    "applied_migrations".to_string()
}

fn default_lock_table() -> String {
    "bootstrap_lock".to_string()
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                message: format!("{}: {e}", path.display()),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for vetphysio.yml or vetphysio.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("vetphysio.yml");
        let yaml_path = dir.join("vetphysio.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }

        if self.database.path.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "database.path cannot be empty".to_string(),
            });
        }

        let m = &self.migrations;
        for (field, value) in [("ledger_table", &m.ledger_table), ("lock_table", &m.lock_table)] {
            if !is_valid_identifier(value) {
                return Err(CoreError::ConfigInvalid {
                    message: format!("migrations.{field} '{value}' is not a valid table name"),
                });
            }
        }

        if m.ledger_table.eq_ignore_ascii_case(&m.lock_table) {
            return Err(CoreError::ConfigInvalid {
                message: "migrations.ledger_table and migrations.lock_table must differ"
                    .to_string(),
            });
        }

        if m.statement_timeout_secs == Some(0) {
            return Err(CoreError::ConfigInvalid {
                message: "migrations.statement_timeout_secs must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// Get absolute migration paths relative to a project root
    pub fn migration_paths_absolute(&self, root: &Path) -> Vec<PathBuf> {
        self.migrations.paths.iter().map(|p| root.join(p)).collect()
    }

    /// Resolve the database path against a project root.
    ///
    /// `:memory:` and absolute paths are returned unchanged.
    pub fn database_path(&self, root: &Path) -> String {
        let path = &self.database.path;
        if path == DEFAULT_DB_PATH || Path::new(path).is_absolute() {
            path.clone()
        } else {
            root.join(path).display().to_string()
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
