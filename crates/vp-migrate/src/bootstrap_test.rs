use super::*;
use crate::status::{status, UnitState};
use std::time::Duration;
use vp_core::UnitId;
use vp_db::{Catalog, DuckDbBackend};

fn db() -> DuckDbBackend {
    DuckDbBackend::in_memory().unwrap()
}

fn id(s: &str) -> UnitId {
    UnitId::parse(s).unwrap()
}

fn options() -> BootstrapOptions {
    BootstrapOptions {
        holder: "test-runner".to_string(),
        ..BootstrapOptions::default()
    }
}

fn count(db: &DuckDbBackend, sql: &str) -> i64 {
    db.query_scalar(sql).unwrap()
}

fn u1() -> MigrationUnit {
    MigrationUnit::new(id("u1_create_owners")).table(
        "owners",
        &["id INTEGER PRIMARY KEY", "firstname VARCHAR", "lastname VARCHAR"],
    )
}

fn u2() -> MigrationUnit {
    MigrationUnit::new(id("u2_add_owner_phone")).column("owners", "phone", "VARCHAR")
}

fn u3() -> MigrationUnit {
    MigrationUnit::new(id("u3_seed_admin_roles"))
        .table("admin_roles", &["id INTEGER PRIMARY KEY", "name VARCHAR UNIQUE"])
        .seed(
            "admin_roles",
            "1 = 1",
            &["INSERT INTO admin_roles VALUES (1, 'super_admin'), (2, 'admin'), \
               (3, 'therapist'), (4, 'reception')"],
        )
}

fn scenario() -> Vec<MigrationUnit> {
    vec![u1(), u2(), u3()]
}

// ── Idempotence ─────────────────────────────────────────────────────

#[test]
fn test_first_run_applies_then_second_run_skips() {
    let db = db();
    let units = scenario();

    let first = bootstrap(&db, &units, &options()).unwrap();
    assert_eq!((first.units_applied, first.units_skipped), (3, 0));
    assert!(first.is_success());

    let second = bootstrap(&db, &units, &options()).unwrap();
    assert_eq!((second.units_applied, second.units_skipped), (0, 3));
    assert!(second.drifted.is_empty());

    assert_eq!(count(&db, "SELECT COUNT(*) FROM admin_roles"), 4);
    assert_eq!(
        count(
            &db,
            "SELECT COUNT(*) FROM information_schema.columns WHERE table_name = 'owners'"
        ),
        4
    );
}

#[test]
fn test_ledger_dropped_existence_checks_prevent_duplicates() {
    let db = db();
    let units = scenario();
    bootstrap(&db, &units, &options()).unwrap();
    db.execute("INSERT INTO owners VALUES (1, 'Ada', 'Hughes', '555-0100')")
        .unwrap();

    db.execute("DROP TABLE applied_migrations").unwrap();
    let rerun = bootstrap(&db, &units, &options()).unwrap();

    assert!(rerun.is_success());
    assert_eq!(rerun.units_applied, 3);
    assert_eq!(
        count(
            &db,
            "SELECT COUNT(*) FROM information_schema.columns \
             WHERE table_name = 'owners' AND column_name = 'phone'"
        ),
        1
    );
    assert_eq!(count(&db, "SELECT COUNT(*) FROM admin_roles"), 4);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM owners"), 1);
}

#[test]
fn test_additive_column_on_populated_table_twice() {
    let db = db();
    db.execute("CREATE TABLE owners (id INTEGER, firstname VARCHAR)")
        .unwrap();
    db.execute("INSERT INTO owners VALUES (1, 'Ada'), (2, 'Grace')")
        .unwrap();

    let units = vec![u2()];
    assert_eq!(bootstrap(&db, &units, &options()).unwrap().units_applied, 1);
    db.execute("DROP TABLE applied_migrations").unwrap();
    assert!(bootstrap(&db, &units, &options()).unwrap().is_success());

    assert_eq!(count(&db, "SELECT COUNT(*) FROM owners"), 2);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM owners WHERE phone IS NULL"), 2);
}

// ── Skip by id and drift ────────────────────────────────────────────

#[test]
fn test_changed_text_not_reexecuted_and_drift_reported() {
    let db = db();
    bootstrap(&db, &[u1()], &options()).unwrap();

    let changed = MigrationUnit::new(id("u1_create_owners"))
        .sql("CREATE TABLE should_not_exist (id INTEGER)");
    let result = bootstrap(&db, &[changed], &options()).unwrap();

    assert_eq!((result.units_applied, result.units_skipped), (0, 1));
    assert_eq!(result.drifted, vec![id("u1_create_owners")]);
    assert!(!db.table_exists("should_not_exist").unwrap());
}

#[test]
fn test_drift_ignored() {
    let db = db();
    bootstrap(&db, &[u1()], &options()).unwrap();

    let changed = MigrationUnit::new(id("u1_create_owners")).sql("SELECT 1");
    let opts = BootstrapOptions {
        drift_policy: DriftPolicy::Ignore,
        ..options()
    };
    let result = bootstrap(&db, &[changed], &opts).unwrap();
    assert!(result.drifted.is_empty());
    assert_eq!(result.units_skipped, 1);
}

#[test]
fn test_drift_fails_before_running_anything() {
    let db = db();
    bootstrap(&db, &[u1()], &options()).unwrap();

    let changed = MigrationUnit::new(id("u1_create_owners")).sql("SELECT 1");
    let opts = BootstrapOptions {
        drift_policy: DriftPolicy::Fail,
        ..options()
    };
    let err = bootstrap(&db, &[changed, u2()], &opts).unwrap_err();
    assert!(matches!(err, MigrateError::ChecksumDrift { ref units } if units == &["u1_create_owners"]));
    assert!(!db.column_exists("owners", "phone").unwrap());

    // The lock is released on the error path too.
    assert!(bootstrap(&db, &[u1(), u2()], &options()).is_ok());
}

// ── Atomic halt ─────────────────────────────────────────────────────

#[test]
fn test_failure_rolls_back_unit_and_halts() {
    let db = db();
    let broken = MigrationUnit::new(id("u2_broken"))
        .sql("CREATE TABLE partial (id INTEGER)")
        .sql("INSERT INTO nowhere VALUES (1)");
    let later = MigrationUnit::new(id("u3_later")).sql("CREATE TABLE later (id INTEGER)");

    let result = bootstrap(&db, &[u1(), broken, later], &options()).unwrap();

    assert!(!result.is_success());
    assert_eq!(result.units_applied, 1);
    assert_eq!(result.failed_unit, Some(id("u2_broken")));
    let failure = result.failure.unwrap();
    assert_eq!(failure.unit, id("u2_broken"));
    assert_eq!(failure.statement, "INSERT INTO nowhere VALUES (1)");
    assert!(failure.cause.contains("nowhere"), "{}", failure.cause);

    assert!(db.table_exists("owners").unwrap());
    assert!(!db.table_exists("partial").unwrap());
    assert!(!db.table_exists("later").unwrap());
}

#[test]
fn test_failed_attempt_recorded_and_retried() {
    let db = db();
    let broken = MigrationUnit::new(id("u1_flaky")).sql("INSERT INTO missing VALUES (1)");
    let result = bootstrap(&db, &[broken], &options()).unwrap();
    assert!(!result.is_success());

    let report = status(&db, &[u1()], &options()).unwrap();
    assert_eq!(report.orphaned, vec!["u1_flaky".to_string()]);

    let flaky = MigrationUnit::new(id("u1_flaky")).sql("CREATE TABLE missing (id INTEGER)");
    let report = status(&db, std::slice::from_ref(&flaky), &options()).unwrap();
    assert_eq!(report.units[0].state, UnitState::Failed);
    assert!(report.units[0].last_error.is_some());

    let retry = bootstrap(&db, &[flaky.clone()], &options()).unwrap();
    assert_eq!(retry.units_applied, 1);
    let report = status(&db, &[flaky], &options()).unwrap();
    assert_eq!(report.units[0].state, UnitState::Applied);
}

#[test]
fn test_failing_existence_check_is_a_statement_failure() {
    let db = db();
    let seed = MigrationUnit::new(id("u1_seed")).seed(
        "no_such_table",
        "1 = 1",
        &["INSERT INTO no_such_table VALUES (1)"],
    );
    let result = bootstrap(&db, &[seed], &options()).unwrap();
    let failure = result.failure.unwrap();
    assert!(failure.statement.starts_with("SELECT COUNT(*)"));
}

#[test]
fn test_non_transactional_unit_keeps_earlier_steps() {
    let db = db();
    let unit = MigrationUnit::new(id("u1_loose"))
        .sql("CREATE TABLE IF NOT EXISTS kept (id INTEGER)")
        .sql("INSERT INTO nowhere VALUES (1)")
        .without_transaction();
    let result = bootstrap(&db, &[unit], &options()).unwrap();
    assert!(!result.is_success());
    assert!(db.table_exists("kept").unwrap());
}

// ── Seeds ───────────────────────────────────────────────────────────

#[test]
fn test_seed_inserted_once_across_reruns() {
    let db = db();
    for _ in 0..3 {
        bootstrap(&db, &[u3()], &options()).unwrap();
        db.execute("DELETE FROM applied_migrations").unwrap();
    }
    assert_eq!(count(&db, "SELECT COUNT(*) FROM admin_roles"), 4);
}

// ── Fatal conditions ────────────────────────────────────────────────

#[test]
fn test_out_of_order_units_rejected() {
    let db = db();
    let err = bootstrap(&db, &[u2(), u1()], &options()).unwrap_err();
    assert!(matches!(
        err,
        MigrateError::OutOfOrder { ref previous, ref next }
            if previous == "u2_add_owner_phone" && next == "u1_create_owners"
    ));
    assert!(!db.table_exists("applied_migrations").unwrap());
}

#[test]
fn test_duplicate_ids_rejected() {
    let db = db();
    let err = bootstrap(&db, &[u1(), u1()], &options()).unwrap_err();
    assert!(matches!(err, MigrateError::OutOfOrder { .. }));
}

#[test]
fn test_incompatible_ledger_is_fatal() {
    let db = db();
    db.execute("CREATE TABLE applied_migrations (version INTEGER)")
        .unwrap();
    let err = bootstrap(&db, &scenario(), &options()).unwrap_err();
    assert!(matches!(err, MigrateError::LedgerCorruption { .. }));
    assert!(!db.table_exists("owners").unwrap());
}

#[test]
fn test_held_lock_blocks_run() {
    let db = db();
    RunLock::new("bootstrap_lock", "someone-else")
        .acquire(&db)
        .unwrap();

    let err = bootstrap(&db, &scenario(), &options()).unwrap_err();
    assert!(matches!(err, MigrateError::LockHeld { ref holder, .. } if holder == "someone-else"));
    assert!(!db.table_exists("owners").unwrap());
}

#[test]
fn test_lock_released_after_success_and_halt() {
    let db = db();
    let lock = RunLock::new("bootstrap_lock", "observer");

    bootstrap(&db, &[u1()], &options()).unwrap();
    assert_eq!(lock.current_holder(&db).unwrap(), None);

    let broken = MigrationUnit::new(id("u2_broken")).sql("SELECT * FROM nowhere");
    let result = bootstrap(&db, &[u1(), broken], &options()).unwrap();
    assert!(!result.is_success());
    assert_eq!(lock.current_holder(&db).unwrap(), None);
}

#[test]
fn test_custom_table_names() {
    let db = db();
    let opts = BootstrapOptions {
        ledger_table: "ops.schema_ledger".to_string(),
        lock_table: "locks.bootstrap_lock".to_string(),
        ..options()
    };
    let result = bootstrap(&db, &[u1()], &opts).unwrap();
    assert!(result.is_success(), "{:?}", result.failure);
    assert!(db.table_exists("ops.schema_ledger").unwrap());
    assert!(db.table_exists("locks.bootstrap_lock").unwrap());
    assert!(!db.table_exists("applied_migrations").unwrap());
    assert!(!db.table_exists("bootstrap_lock").unwrap());

    let lock = RunLock::new("locks.bootstrap_lock", "observer");
    assert_eq!(lock.current_holder(&db).unwrap(), None);
}

// ── Timeouts ────────────────────────────────────────────────────────

#[test]
fn test_statement_timeout_halts_run() {
    let db = db().with_statement_timeout(Some(Duration::from_millis(200)));
    let slow = MigrationUnit::new(id("u2_slow")).sql(
        "CREATE TABLE slow AS SELECT COUNT(*) AS n \
         FROM range(1000000000) a(x), range(1000000000) b(y) WHERE (a.x * 31 + b.y) % 1000003 = 7",
    );

    let result = bootstrap(&db, &[u1(), slow, u2()], &options()).unwrap();
    assert_eq!(result.units_applied, 1);
    assert_eq!(result.failed_unit, Some(id("u2_slow")));
    assert!(result.failure.unwrap().cause.contains("[D005]"));
    assert!(!db.table_exists("slow").unwrap());
    assert!(!db.column_exists("owners", "phone").unwrap());
}

// ── Status ──────────────────────────────────────────────────────────

#[test]
fn test_status_without_ledger_is_all_pending() {
    let db = db();
    let report = status(&db, &scenario(), &options()).unwrap();
    assert_eq!(report.count(UnitState::Pending), 3);
    assert!(report.orphaned.is_empty());
    assert!(!db.table_exists("applied_migrations").unwrap());
}

#[test]
fn test_status_reports_applied_pending_and_drifted() {
    let db = db();
    bootstrap(&db, &[u1(), u2()], &options()).unwrap();

    let changed_u2 = MigrationUnit::new(id("u2_add_owner_phone")).column(
        "owners",
        "phone",
        "VARCHAR NOT NULL",
    );
    let report = status(&db, &[u1(), changed_u2, u3()], &options()).unwrap();
    let states: Vec<UnitState> = report.units.iter().map(|u| u.state).collect();
    assert_eq!(
        states,
        vec![UnitState::Applied, UnitState::Drifted, UnitState::Pending]
    );
    assert!(report.units[0].applied_at.is_some());
    assert!(report.units[2].applied_at.is_none());
}
