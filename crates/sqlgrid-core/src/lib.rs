//! Core library for sqlgrid.
//!
//! This crate wraps an SQLite connection in a small handle that opens and
//! closes a database file and runs SELECT, INSERT, UPDATE and DELETE
//! statements, returning query results as grids of strings.
//!
//! When another connection holds a lock, statements are retried under a
//! [`RetryPolicy`] that is bounded in attempts and time and can be stopped
//! from another thread through a [`CancelFlag`].
//!
//! # Quick Start
//!
//! ```rust
//! use sqlgrid_core::Database;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let dir = tempfile::TempDir::new()?;
//! # let path = dir.path().join("people.db");
//! let mut db = Database::new();
//!
//! // A non-empty creation query creates the file and sets up the schema
//! db.open(&path, "CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT)")?;
//!
//! let id = db.insert("INSERT INTO people (name) VALUES ('Ada')")?;
//! let grid = db.select("SELECT id, name FROM people")?;
//!
//! assert_eq!(grid.columns(), ["id", "name"]);
//! assert_eq!(grid.get(0, 0), Some(id.to_string().as_str()));
//! assert_eq!(grid.get(0, 1), Some("Ada"));
//!
//! db.close()?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod db;
pub mod error;
pub mod grid;
pub mod retry;

// Re-export commonly used types
pub use builder::{default_database_path, DatabaseBuilder};
pub use db::Database;
pub use error::{GridError, Operation, Result};
pub use grid::ResultGrid;
pub use retry::{CancelFlag, RetryPolicy};
