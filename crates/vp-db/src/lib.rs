//! vp-db - Database abstraction layer for vetphysio-schema
//!
//! This crate provides the `Database` and `Catalog` traits the schema
//! bootstrapper runs against, and their DuckDB implementation.

pub mod duckdb;
pub mod error;
pub(crate) mod row_helpers;
pub(crate) mod timeout;
pub mod traits;

pub use self::duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use traits::{Catalog, Database};
