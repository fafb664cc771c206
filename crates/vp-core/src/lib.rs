//! vp-core - Core library for vetphysio-schema
//!
//! This crate provides the shared types used by the schema bootstrapper:
//! configuration parsing, the migration unit model, SQL statement splitting
//! and quoting, checksums, and discovery of unit files on disk.

pub mod checksum;
pub mod config;
pub mod discovery;
pub mod error;
pub(crate) mod serde_helpers;
pub mod sql_utils;
pub mod unit;
pub mod unit_id;

pub use checksum::compute_statements_checksum;
pub use config::{Config, DatabaseConfig, DriftPolicy, MigrationsConfig};
pub use discovery::{discover_units, merge_units};
pub use error::{CoreError, CoreResult};
pub use unit::{MigrationUnit, Probe, SchemaObject, Step};
pub use unit_id::UnitId;
