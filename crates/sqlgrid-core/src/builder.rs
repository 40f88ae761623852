//! Builder for creating and configuring Database handles.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{
    db::Database,
    error::Result,
    retry::{CancelFlag, RetryPolicy},
};

/// Builder for creating and configuring [`Database`] handles.
#[derive(Debug, Clone, Default)]
pub struct DatabaseBuilder {
    retry_policy: RetryPolicy,
    cancel_flag: Option<CancelFlag>,
    engine_busy_timeout: Duration,
    foreign_keys: bool,
}

impl DatabaseBuilder {
    /// Creates a new builder with default settings: the default
    /// [`RetryPolicy`], the engine's own busy handler disabled and foreign
    /// key enforcement left off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the busy-retry policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Shares an existing cancellation flag with the handle, e.g. one that a
    /// signal handler raises.
    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel_flag = Some(flag);
        self
    }

    /// Lets the engine wait up to `timeout` on a locked database before it
    /// reports busy. Zero disables the engine's handler so that only the
    /// retry policy decides.
    pub fn with_engine_busy_timeout(mut self, timeout: Duration) -> Self {
        self.engine_busy_timeout = timeout;
        self
    }

    /// Enables `PRAGMA foreign_keys` on every connection the handle opens.
    pub fn with_foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    /// Builds a closed handle.
    pub fn build(self) -> Database {
        Database::from_builder(
            self.retry_policy,
            self.cancel_flag.unwrap_or_default(),
            self.engine_busy_timeout,
            self.foreign_keys,
        )
    }

    /// Builds a handle and opens `path` with it.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Database::open`].
    pub fn open<P: AsRef<Path>>(self, path: P, create_query: &str) -> Result<Database> {
        let mut db = self.build();
        db.open(path, create_query)?;
        Ok(db)
    }
}

/// Returns the default database path following the XDG Base Directory
/// specification: `$XDG_DATA_HOME/sqlgrid/sqlgrid.db`. The parent
/// directory is created if needed.
///
/// # Errors
///
/// Returns an I/O error if the data directory cannot be created.
pub fn default_database_path() -> io::Result<PathBuf> {
    xdg::BaseDirectories::with_prefix("sqlgrid").place_data_file("sqlgrid.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let db = DatabaseBuilder::new().build();
        assert!(!db.is_open());
        assert!(db.path().is_none());
        assert_eq!(db.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn test_builder_shares_cancel_flag() {
        let flag = CancelFlag::new();
        let db = DatabaseBuilder::new()
            .with_cancel_flag(flag.clone())
            .with_retry_policy(RetryPolicy::no_retry())
            .build();

        flag.cancel();
        assert!(db.cancel_flag().is_cancelled());
        assert_eq!(db.retry_policy(), RetryPolicy::no_retry());
    }
}
