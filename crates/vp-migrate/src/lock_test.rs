use super::*;
use vp_db::DuckDbBackend;

fn db() -> DuckDbBackend {
    DuckDbBackend::in_memory().unwrap()
}

#[test]
fn test_acquire_and_release() {
    let db = db();
    let lock = RunLock::new("bootstrap_lock", "runner-a");
    lock.acquire(&db).unwrap();
    assert_eq!(
        lock.current_holder(&db).unwrap().map(|(h, _)| h),
        Some("runner-a".to_string())
    );
    assert!(lock.release(&db).unwrap());
    assert_eq!(lock.current_holder(&db).unwrap(), None);
}

#[test]
fn test_second_holder_is_refused() {
    let db = db();
    RunLock::new("bootstrap_lock", "runner-a")
        .acquire(&db)
        .unwrap();

    let err = RunLock::new("bootstrap_lock", "runner-b")
        .acquire(&db)
        .unwrap_err();
    match err {
        MigrateError::LockHeld {
            holder,
            acquired_at,
        } => {
            assert_eq!(holder, "runner-a");
            assert!(!acquired_at.is_empty());
        }
        other => panic!("expected LockHeld, got {other:?}"),
    }
}

#[test]
fn test_release_by_other_holder_keeps_lock() {
    let db = db();
    RunLock::new("bootstrap_lock", "runner-a")
        .acquire(&db)
        .unwrap();
    assert!(!RunLock::new("bootstrap_lock", "runner-b")
        .release(&db)
        .unwrap());
    assert!(RunLock::new("bootstrap_lock", "runner-b")
        .acquire(&db)
        .is_err());
}

#[test]
fn test_force_release() {
    let db = db();
    let lock = RunLock::new("bootstrap_lock", "crashed");
    assert_eq!(lock.force_release(&db).unwrap(), None);

    lock.acquire(&db).unwrap();
    let other = RunLock::new("bootstrap_lock", "operator");
    assert_eq!(
        other.force_release(&db).unwrap(),
        Some("crashed".to_string())
    );
    other.acquire(&db).unwrap();
}

#[test]
fn test_schema_qualified_lock_table() {
    let db = db();
    let lock = RunLock::new("ops.bootstrap_lock", "runner-a");
    lock.acquire(&db).unwrap();
    assert_eq!(
        lock.current_holder(&db).unwrap().map(|(h, _)| h),
        Some("runner-a".to_string())
    );
    assert!(RunLock::new("ops.bootstrap_lock", "runner-b")
        .acquire(&db)
        .is_err());
    assert!(lock.release(&db).unwrap());

    // A second acquire reuses the existing schema.
    lock.acquire(&db).unwrap();
    assert!(lock.release(&db).unwrap());
}

#[test]
fn test_default_holder_is_unique() {
    let a = RunLock::default_holder();
    let b = RunLock::default_holder();
    assert!(a.starts_with(&format!("pid-{}-", std::process::id())));
    assert_ne!(a, b);
}
