//! Busy-database behavior, using a second connection that holds an
//! exclusive lock on the test file.

mod common;

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use common::create_test_db;
use rusqlite::Connection;
use sqlgrid_core::{GridError, Operation, RetryPolicy};

fn lock_exclusively(path: &Path) -> Connection {
    let locker = Connection::open(path).expect("Failed to open locking connection");
    locker
        .execute_batch("BEGIN EXCLUSIVE")
        .expect("Failed to take exclusive lock");
    locker
}

#[test]
fn test_busy_database_exhausts_attempts() {
    let (_temp_dir, db_path, mut db) = create_test_db();
    db.set_retry_policy(RetryPolicy::new(Duration::from_millis(10)).with_max_attempts(3));
    let _locker = lock_exclusively(&db_path);

    let err = db.select("SELECT * FROM people").unwrap_err();

    match &err {
        GridError::RetryExhausted { op, attempts, .. } => {
            assert_eq!(*op, Operation::Select);
            assert_eq!(*attempts, 3);
        }
        other => panic!("expected RetryExhausted, got {other:?}"),
    }
    assert_eq!(err.code(), 300);
}

#[test]
fn test_busy_database_times_out() {
    let (_temp_dir, db_path, mut db) = create_test_db();
    db.set_retry_policy(
        RetryPolicy::new(Duration::from_millis(20)).with_timeout(Duration::from_millis(100)),
    );
    let _locker = lock_exclusively(&db_path);

    let started = Instant::now();
    let err = db
        .insert("INSERT INTO people (name) VALUES ('blocked')")
        .unwrap_err();

    assert!(matches!(
        err,
        GridError::RetryExhausted {
            op: Operation::Insert,
            ..
        }
    ));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_lock_released_during_retry() {
    let (_temp_dir, db_path, mut db) = create_test_db();
    db.set_retry_policy(
        RetryPolicy::new(Duration::from_millis(20)).with_timeout(Duration::from_secs(10)),
    );
    let locker = lock_exclusively(&db_path);

    let releaser = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        locker
            .execute_batch("COMMIT")
            .expect("Failed to release lock");
    });

    let id = db
        .insert("INSERT INTO people (name) VALUES ('patient')")
        .expect("Insert should succeed once the lock is released");
    releaser.join().expect("Releasing thread panicked");

    assert_eq!(
        db.entry_id("SELECT id FROM people WHERE name = 'patient'", "id")
            .expect("Failed to read id"),
        id
    );
}

#[test]
fn test_cancel_stops_unbounded_retry() {
    let (_temp_dir, db_path, mut db) = create_test_db();
    db.set_retry_policy(RetryPolicy::unbounded());
    let _locker = lock_exclusively(&db_path);

    let cancel = db.cancel_flag();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        cancel.cancel();
    });

    let started = Instant::now();
    let err = db
        .delete_entry("DELETE FROM people")
        .unwrap_err();
    canceller.join().expect("Cancelling thread panicked");

    assert!(matches!(
        err,
        GridError::Cancelled {
            op: Operation::DeleteEntry
        }
    ));
    assert_eq!(err.code(), 301);
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[test]
fn test_no_retry_reports_busy_source() {
    let (_temp_dir, db_path, mut db) = create_test_db();
    db.set_retry_policy(RetryPolicy::no_retry());
    let _locker = lock_exclusively(&db_path);

    let err = db.update("UPDATE people SET age = 1").unwrap_err();

    match err {
        GridError::RetryExhausted {
            attempts, source, ..
        } => {
            assert_eq!(attempts, 1);
            assert!(source.is_busy());
        }
        other => panic!("expected RetryExhausted, got {other:?}"),
    }
}
