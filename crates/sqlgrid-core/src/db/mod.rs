//! Database handle and SQLite connection management.
//!
//! A [`Database`] starts closed. [`Database::open`] attaches a connection to
//! a database file and the statement methods in [`queries`] run against it
//! until [`Database::close`] releases it. Every statement is prepared,
//! stepped under the handle's [`RetryPolicy`], and finalized before the
//! method returns.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::Connection;

use crate::{
    builder::DatabaseBuilder,
    error::{GridError, Operation, Result},
    retry::{CancelFlag, RetryPolicy},
};

pub mod lifecycle;
pub mod queries;

/// Handle owning at most one open SQLite connection.
pub struct Database {
    connection: Option<Connection>,
    path: Option<PathBuf>,
    retry_policy: RetryPolicy,
    cancel_flag: CancelFlag,
    engine_busy_timeout: Duration,
    foreign_keys: bool,
}

impl Database {
    /// Creates a closed handle with the default configuration.
    pub fn new() -> Self {
        DatabaseBuilder::new().build()
    }

    pub(crate) fn from_builder(
        retry_policy: RetryPolicy,
        cancel_flag: CancelFlag,
        engine_busy_timeout: Duration,
        foreign_keys: bool,
    ) -> Self {
        Self {
            connection: None,
            path: None,
            retry_policy,
            cancel_flag,
            engine_busy_timeout,
            foreign_keys,
        }
    }

    /// Whether a connection is currently attached.
    pub fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    /// Path of the open database file.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry_policy
    }

    /// Replaces the busy-retry policy for subsequent statements.
    pub fn set_retry_policy(&mut self, policy: RetryPolicy) {
        self.retry_policy = policy;
    }

    /// A clone of the handle's cancellation flag. Raising it from another
    /// thread stops a statement that is waiting on a busy database.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel_flag.clone()
    }

    fn connection(&self, op: Operation) -> Result<&Connection> {
        self.connection.as_ref().ok_or(GridError::NotOpen { op })
    }

    fn with_retry<T, F>(&self, op: Operation, attempt: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        self.retry_policy.run(op, &self.cancel_flag, attempt)
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .field("retry_policy", &self.retry_policy)
            .finish_non_exhaustive()
    }
}
