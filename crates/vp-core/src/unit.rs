//! Migration unit model.
//!
//! A [`MigrationUnit`] is one named, ordered batch of [`Step`]s. A step is
//! either raw SQL that must be idempotent on its own, or a [`SchemaObject`]
//! that is probed first and only created when absent.

use crate::checksum::compute_statements_checksum;
use crate::error::{CoreError, CoreResult};
use crate::sql_utils::{quote_ident, quote_qualified};
use crate::unit_id::UnitId;
use serde::Deserialize;

/// A schema target with an existence check and a creation statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaObject {
    /// A table. Foreign keys are declared inline in `columns`.
    Table { name: String, columns: Vec<String> },
    /// A column added to an existing table.
    Column {
        table: String,
        name: String,
        definition: String,
    },
    /// A secondary index.
    Index {
        name: String,
        table: String,
        columns: Vec<String>,
        unique: bool,
    },
    /// Seed rows, inserted only while no row matches `check`.
    Seed {
        table: String,
        check: String,
        statements: Vec<String>,
    },
}

/// What to ask the database before applying a [`SchemaObject`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// Catalog lookup for a table or view.
    Table { table: String },
    /// Catalog lookup for a column on a table.
    Column { table: String, column: String },
    /// Catalog lookup for an index.
    Index { table: String, index: String },
    /// `SELECT COUNT(*)` query; a non-zero count means present.
    RowCount { sql: String },
}

impl SchemaObject {
    /// Short human-readable label used in logs.
    pub fn describe(&self) -> String {
        match self {
            SchemaObject::Table { name, .. } => format!("table {name}"),
            SchemaObject::Column { table, name, .. } => format!("column {table}.{name}"),
            SchemaObject::Index { name, table, .. } => format!("index {name} on {table}"),
            SchemaObject::Seed { table, .. } => format!("seed rows in {table}"),
        }
    }

    /// The existence check for this object.
    pub fn probe(&self) -> Probe {
        match self {
            SchemaObject::Table { name, .. } => Probe::Table {
                table: name.clone(),
            },
            SchemaObject::Column { table, name, .. } => Probe::Column {
                table: table.clone(),
                column: name.clone(),
            },
            SchemaObject::Index { name, table, .. } => Probe::Index {
                table: table.clone(),
                index: name.clone(),
            },
            SchemaObject::Seed { table, check, .. } => Probe::RowCount {
                sql: format!(
                    "SELECT COUNT(*) FROM {} WHERE {}",
                    quote_qualified(table),
                    check
                ),
            },
        }
    }

    /// Statements that create the object when the probe reports it absent.
    pub fn statements(&self) -> Vec<String> {
        match self {
            SchemaObject::Table { name, columns } => vec![format!(
                "CREATE TABLE IF NOT EXISTS {} ({})",
                quote_qualified(name),
                columns.join(", ")
            )],
            SchemaObject::Column {
                table,
                name,
                definition,
            } => vec![format!(
                "ALTER TABLE {} ADD COLUMN {} {}",
                quote_qualified(table),
                quote_ident(name),
                definition
            )],
            SchemaObject::Index {
                name,
                table,
                columns,
                unique,
            } => vec![format!(
                "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
                if *unique { "UNIQUE " } else { "" },
                quote_ident(name),
                quote_qualified(table),
                columns.join(", ")
            )],
            SchemaObject::Seed { statements, .. } => statements.clone(),
        }
    }

    fn validate(&self, id: &UnitId) -> CoreResult<()> {
        let invalid = |reason: String| CoreError::InvalidUnit {
            id: id.to_string(),
            reason,
        };
        match self {
            SchemaObject::Table { name, columns } if columns.is_empty() => {
                Err(invalid(format!("table {name} declares no columns")))
            }
            SchemaObject::Column {
                table, definition, ..
            } if definition.trim().is_empty() => {
                Err(invalid(format!("column on {table} has an empty definition")))
            }
            SchemaObject::Index { name, columns, .. } if columns.is_empty() => {
                Err(invalid(format!("index {name} declares no columns")))
            }
            SchemaObject::Seed {
                table, statements, ..
            } if statements.is_empty() => {
                Err(invalid(format!("seed for {table} has no statements")))
            }
            SchemaObject::Seed { table, check, .. } if check.trim().is_empty() => {
                Err(invalid(format!("seed for {table} has an empty check")))
            }
            _ => Ok(()),
        }
    }
}

/// One step of a migration unit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "StepSpec")]
pub enum Step {
    /// A statement executed unconditionally; must tolerate re-execution.
    Sql(String),
    /// A probe-then-apply schema object.
    Object(SchemaObject),
}

impl Step {
    /// Text that identifies this step for checksumming.
    fn fingerprint(&self) -> String {
        match self {
            Step::Sql(sql) => sql.clone(),
            Step::Object(obj) => {
                let check = match obj.probe() {
                    Probe::Table { table } => format!("table:{table}"),
                    Probe::Column { table, column } => format!("column:{table}.{column}"),
                    Probe::Index { table, index } => format!("index:{table}.{index}"),
                    Probe::RowCount { sql } => format!("row_count:{sql}"),
                };
                format!("{}\u{1f}{}", check, obj.statements().join("\u{1f}"))
            }
        }
    }
}

/// YAML shape of a step: `{sql: ...}`, `{table: ...}`, `{column: ...}`,
/// `{index: ...}` or `{seed: ...}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
enum StepSpec {
    Sql(String),
    Table {
        name: String,
        columns: Vec<String>,
    },
    Column {
        table: String,
        name: String,
        definition: String,
    },
    Index {
        name: String,
        table: String,
        columns: Vec<String>,
        #[serde(default)]
        unique: bool,
    },
    Seed {
        table: String,
        check: String,
        statements: Vec<String>,
    },
}

impl From<StepSpec> for Step {
    fn from(spec: StepSpec) -> Self {
        match spec {
            StepSpec::Sql(sql) => Step::Sql(sql),
            StepSpec::Table { name, columns } => Step::Object(SchemaObject::Table { name, columns }),
            StepSpec::Column {
                table,
                name,
                definition,
            } => Step::Object(SchemaObject::Column {
                table,
                name,
                definition,
            }),
            StepSpec::Index {
                name,
                table,
                columns,
                unique,
            } => Step::Object(SchemaObject::Index {
                name,
                table,
                columns,
                unique,
            }),
            StepSpec::Seed {
                table,
                check,
                statements,
            } => Step::Object(SchemaObject::Seed {
                table,
                check,
                statements,
            }),
        }
    }
}

/// One named, ordered batch of schema changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationUnit {
    /// Stable identifier, also the ledger key.
    pub id: UnitId,
    /// Steps executed in order.
    pub steps: Vec<Step>,
    /// Run all steps inside a single transaction.
    pub transactional: bool,
    /// Where the unit came from (`built-in` or a file path), for diagnostics.
    pub origin: String,
}

impl MigrationUnit {
    /// Start an empty transactional unit.
    pub fn new(id: UnitId) -> Self {
        Self {
            id,
            steps: Vec::new(),
            transactional: true,
            origin: "built-in".to_string(),
        }
    }

    /// Append a raw SQL step.
    pub fn sql(mut self, sql: impl Into<String>) -> Self {
        self.steps.push(Step::Sql(sql.into()));
        self
    }

    /// Append a table object.
    pub fn table(mut self, name: &str, columns: &[&str]) -> Self {
        self.steps.push(Step::Object(SchemaObject::Table {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }));
        self
    }

    /// Append an additive column object.
    pub fn column(mut self, table: &str, name: &str, definition: &str) -> Self {
        self.steps.push(Step::Object(SchemaObject::Column {
            table: table.to_string(),
            name: name.to_string(),
            definition: definition.to_string(),
        }));
        self
    }

    /// Append an index object.
    pub fn index(mut self, name: &str, table: &str, columns: &[&str], unique: bool) -> Self {
        self.steps.push(Step::Object(SchemaObject::Index {
            name: name.to_string(),
            table: table.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            unique,
        }));
        self
    }

    /// Append a guarded seed object.
    pub fn seed(mut self, table: &str, check: &str, statements: &[&str]) -> Self {
        self.steps.push(Step::Object(SchemaObject::Seed {
            table: table.to_string(),
            check: check.to_string(),
            statements: statements.iter().map(|s| s.to_string()).collect(),
        }));
        self
    }

    /// Run steps outside a transaction (each step must be idempotent).
    pub fn without_transaction(mut self) -> Self {
        self.transactional = false;
        self
    }

    /// Record where the unit was loaded from.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// SHA-256 over the unit's step text and transaction mode.
    ///
    /// The ledger is keyed by [`UnitId`]; the checksum is only used to report
    /// drift between what was applied and what is supplied now.
    pub fn checksum(&self) -> String {
        let mut parts: Vec<String> = self.steps.iter().map(Step::fingerprint).collect();
        if !self.transactional {
            parts.push("no-transaction".to_string());
        }
        compute_statements_checksum(&parts)
    }

    /// Check that the unit has steps and each step is well formed.
    pub fn validate(&self) -> CoreResult<()> {
        if self.steps.is_empty() {
            return Err(CoreError::EmptyUnit {
                id: self.id.to_string(),
            });
        }
        for step in &self.steps {
            match step {
                Step::Sql(sql) if sql.trim().is_empty() => {
                    return Err(CoreError::InvalidUnit {
                        id: self.id.to_string(),
                        reason: "empty SQL step".to_string(),
                    });
                }
                Step::Sql(_) => {}
                Step::Object(obj) => obj.validate(&self.id)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "unit_test.rs"]
mod tests;
