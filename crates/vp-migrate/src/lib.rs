//! Schema bootstrapper for the practice database.
//!
//! Brings a database from an unknown or partially initialized state to the
//! latest known schema in one call, and can be re-run safely:
//!
//! - units run strictly in the supplied order and halt on the first failure
//! - each unit runs in its own transaction unless it opts out
//! - applied units are recorded in a ledger table and skipped afterwards
//! - schema objects are probed before creation, so a lost ledger does not
//!   lead to duplicate columns or seed rows
//! - a lock row keeps two runners from bootstrapping at the same time

pub mod bootstrap;
pub mod error;
pub(crate) mod executor;
pub mod ledger;
pub mod lock;
pub mod schema;
pub mod status;

pub use bootstrap::{bootstrap, BootstrapOptions, BootstrapResult, UnitFailure};
pub use error::{MigrateError, MigrateResult};
pub use ledger::{AppliedMigrationRecord, Ledger, Outcome};
pub use lock::RunLock;
pub use schema::builtin_units;
pub use status::{status, StatusReport, UnitState, UnitStatus};
