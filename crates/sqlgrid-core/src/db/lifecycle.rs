//! Opening and closing the database file.

use std::fs;
use std::path::Path;

use log::{debug, warn};
use rusqlite::{Connection, OpenFlags};

use crate::error::{GridError, Operation, Result};

const ENABLE_FOREIGN_KEYS_SQL: &str = "PRAGMA foreign_keys = ON";

impl super::Database {
    /// Opens the database file at `path`.
    ///
    /// With an empty `create_query` the file must already exist. With a
    /// non-empty one the file must not exist yet: it is created and the query
    /// (one or more statements) runs once to set up the schema. If that query
    /// fails, the new file is removed again.
    ///
    /// Returns `Ok(false)` without touching the current connection when the
    /// handle is already open, `Ok(true)` once a connection is attached.
    ///
    /// # Errors
    ///
    /// - [`GridError::FileDoesNotExist`] / [`GridError::FileAlreadyExists`]
    ///   when the file's presence does not match `create_query`
    /// - [`GridError::CouldNotOpen`] if the engine cannot open the file
    /// - [`GridError::PrepareFailed`] / [`GridError::StepFailed`] if the
    ///   creation query fails
    pub fn open<P: AsRef<Path>>(&mut self, path: P, create_query: &str) -> Result<bool> {
        let path = path.as_ref();
        if self.is_open() {
            debug!(
                "open(): already open at {:?}, ignoring {}",
                self.path,
                path.display()
            );
            return Ok(false);
        }

        let create_query = create_query.trim();
        let creating = !create_query.is_empty();
        let exists = path.exists();
        if !creating && !exists {
            return Err(GridError::FileDoesNotExist {
                path: path.to_path_buf(),
            });
        }
        if creating && exists {
            return Err(GridError::FileAlreadyExists {
                path: path.to_path_buf(),
            });
        }

        let flags = if creating {
            OpenFlags::default()
        } else {
            OpenFlags::default().difference(OpenFlags::SQLITE_OPEN_CREATE)
        };
        let connection = match self.configure(path, flags) {
            Ok(connection) => connection,
            Err(err) => {
                if creating {
                    discard_file(path);
                }
                return Err(err);
            }
        };

        if creating {
            debug!("open(): creating {} with schema query", path.display());
            if let Err(err) = self.run_batch(&connection, create_query, Operation::Open) {
                drop(connection);
                discard_file(path);
                return Err(err);
            }
        }

        debug!("open(): attached {}", path.display());
        self.connection = Some(connection);
        self.path = Some(path.to_path_buf());
        Ok(true)
    }

    /// Closes the connection if one is attached.
    ///
    /// Returns `Ok(false)` when the handle was not open.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::CouldNotClose`] if the engine refuses to close;
    /// the connection then stays attached.
    pub fn close(&mut self) -> Result<bool> {
        let Some(connection) = self.connection.take() else {
            return Ok(false);
        };

        match connection.close() {
            Ok(()) => {
                if let Some(path) = self.path.take() {
                    debug!("close(): released {}", path.display());
                }
                Ok(true)
            }
            Err((connection, source)) => {
                self.connection = Some(connection);
                Err(GridError::CouldNotClose { source })
            }
        }
    }

    /// Opens a connection and applies the handle's connection settings.
    fn configure(&self, path: &Path, flags: OpenFlags) -> Result<Connection> {
        let could_not_open = |source: rusqlite::Error| GridError::CouldNotOpen {
            path: path.to_path_buf(),
            source,
        };

        let connection = Connection::open_with_flags(path, flags).map_err(could_not_open)?;
        connection
            .busy_timeout(self.engine_busy_timeout)
            .map_err(could_not_open)?;
        if self.foreign_keys {
            connection
                .execute_batch(ENABLE_FOREIGN_KEYS_SQL)
                .map_err(could_not_open)?;
        }
        Ok(connection)
    }
}

fn discard_file(path: &Path) {
    if !path.exists() {
        return;
    }
    if let Err(err) = fs::remove_file(path) {
        warn!("open(): could not remove {}: {err}", path.display());
    }
}
