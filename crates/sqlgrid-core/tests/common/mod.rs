use std::path::PathBuf;

use sqlgrid_core::Database;
use tempfile::TempDir;

pub const PEOPLE_SCHEMA: &str = "CREATE TABLE people (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    age INTEGER
);";

/// Helper function to create a fresh database with the people table
pub fn create_test_db() -> (TempDir, PathBuf, Database) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let mut db = Database::new();
    assert!(db
        .open(&db_path, PEOPLE_SCHEMA)
        .expect("Failed to create test database"));
    (temp_dir, db_path, db)
}
