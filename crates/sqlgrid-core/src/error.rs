//! Error types for database handle operations.
//!
//! Every failure carries a numeric code from a small fixed catalog, exposed
//! through [`GridError::code`]:
//!
//! | Code | Variant                            |
//! |------|------------------------------------|
//! | 100  | [`GridError::NotOpen`]             |
//! | 101  | [`GridError::CouldNotOpen`]        |
//! | 102  | [`GridError::CouldNotClose`]       |
//! | 103  | [`GridError::FileDoesNotExist`]    |
//! | 104  | [`GridError::FileAlreadyExists`]   |
//! | 200  | [`GridError::PrepareFailed`]       |
//! | 201  | [`GridError::StepFailed`]          |
//! | 202  | [`GridError::IdColumnMismatch`]    |
//! | 203  | [`GridError::InvalidId`]           |
//! | 300  | [`GridError::RetryExhausted`]      |
//! | 301  | [`GridError::Cancelled`]           |

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use rusqlite::ErrorCode;
use thiserror::Error;

/// Operation of the [`Database`](crate::Database) handle that produced an
/// error. Displays as the prefix used in error messages, e.g. `select()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Open,
    Close,
    Select,
    Insert,
    Update,
    DeleteEntry,
    EntryId,
    ExecuteBatch,
}

impl Operation {
    /// Name of the handle method, without parentheses.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::DeleteEntry => "delete_entry",
            Self::EntryId => "entry_id",
            Self::ExecuteBatch => "execute_batch",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}()", self.name())
    }
}

/// Error type for all database handle operations.
#[derive(Error, Debug)]
pub enum GridError {
    /// A statement was issued on a handle without an open connection
    #[error("sqlgrid: {op}: database is not open")]
    NotOpen { op: Operation },
    /// The engine refused to open the database file
    #[error("sqlgrid: open(): could not open database '{}'", .path.display())]
    CouldNotOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    /// The engine refused to close the connection; the handle stays open
    #[error("sqlgrid: close(): could not close database")]
    CouldNotClose {
        #[source]
        source: rusqlite::Error,
    },
    /// Opening without a creation query requires an existing file
    #[error("sqlgrid: open(): file does not exist: '{}'", .path.display())]
    FileDoesNotExist { path: PathBuf },
    /// Opening with a creation query requires the file to be absent
    #[error("sqlgrid: open(): file already exists: '{}'", .path.display())]
    FileAlreadyExists { path: PathBuf },
    /// The engine could not compile the statement
    #[error("sqlgrid: {op}: failed to prepare statement")]
    PrepareFailed {
        op: Operation,
        #[source]
        source: rusqlite::Error,
    },
    /// The engine failed while running the statement
    #[error("sqlgrid: {op}: failed to step statement")]
    StepFailed {
        op: Operation,
        #[source]
        source: rusqlite::Error,
    },
    /// The id query's first column does not have the requested name
    #[error("sqlgrid: entry_id(): first column is not '{expected}' (columns: {found})")]
    IdColumnMismatch { expected: String, found: String },
    /// The id column holds something other than an integer
    #[error("sqlgrid: entry_id(): value '{value}' in column '{column}' is not an integer")]
    InvalidId { column: String, value: String },
    /// The database stayed busy past the retry policy's bounds
    #[error("sqlgrid: {op}: database still busy after {attempts} attempt(s) in {elapsed:?}")]
    RetryExhausted {
        op: Operation,
        attempts: u32,
        elapsed: Duration,
        source: Box<GridError>,
    },
    /// The cancellation flag was raised while waiting on a busy database
    #[error("sqlgrid: {op}: cancelled while waiting on a busy database")]
    Cancelled { op: Operation },
}

impl GridError {
    /// Numeric code of this error in the fixed catalog.
    pub const fn code(&self) -> u16 {
        match self {
            Self::NotOpen { .. } => 100,
            Self::CouldNotOpen { .. } => 101,
            Self::CouldNotClose { .. } => 102,
            Self::FileDoesNotExist { .. } => 103,
            Self::FileAlreadyExists { .. } => 104,
            Self::PrepareFailed { .. } => 200,
            Self::StepFailed { .. } => 201,
            Self::IdColumnMismatch { .. } => 202,
            Self::InvalidId { .. } => 203,
            Self::RetryExhausted { .. } => 300,
            Self::Cancelled { .. } => 301,
        }
    }

    /// Whether the engine reported the database as busy or locked, i.e.
    /// whether running the statement again may succeed.
    pub fn is_busy(&self) -> bool {
        match self {
            Self::PrepareFailed { source, .. } | Self::StepFailed { source, .. } => {
                is_busy_error(source)
            }
            _ => false,
        }
    }

    /// Operation that failed, when the error is tied to one.
    pub const fn operation(&self) -> Option<Operation> {
        match self {
            Self::NotOpen { op }
            | Self::PrepareFailed { op, .. }
            | Self::StepFailed { op, .. }
            | Self::RetryExhausted { op, .. }
            | Self::Cancelled { op } => Some(*op),
            Self::CouldNotOpen { .. }
            | Self::FileDoesNotExist { .. }
            | Self::FileAlreadyExists { .. } => Some(Operation::Open),
            Self::CouldNotClose { .. } => Some(Operation::Close),
            Self::IdColumnMismatch { .. } | Self::InvalidId { .. } => Some(Operation::EntryId),
        }
    }
}

fn is_busy_error(error: &rusqlite::Error) -> bool {
    matches!(
        error.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}

/// Extension trait mapping engine results into [`GridError`] with the
/// failing operation attached.
pub trait SqlResultExt<T> {
    /// Map an engine error raised while compiling a statement.
    fn prepare_context(self, op: Operation) -> Result<T>;

    /// Map an engine error raised while running a statement.
    fn step_context(self, op: Operation) -> Result<T>;
}

impl<T> SqlResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn prepare_context(self, op: Operation) -> Result<T> {
        self.map_err(|source| GridError::PrepareFailed { op, source })
    }

    fn step_context(self, op: Operation) -> Result<T> {
        self.map_err(|source| GridError::StepFailed { op, source })
    }
}

/// Result type alias for database handle operations
pub type Result<T> = std::result::Result<T, GridError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn busy() -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            Some("database is locked".to_string()),
        )
    }

    #[test]
    fn test_messages_carry_prefix_and_operation() {
        let err = GridError::NotOpen {
            op: Operation::Select,
        };
        assert_eq!(err.to_string(), "sqlgrid: select(): database is not open");

        let err = GridError::FileDoesNotExist {
            path: PathBuf::from("/tmp/missing.db"),
        };
        assert_eq!(
            err.to_string(),
            "sqlgrid: open(): file does not exist: '/tmp/missing.db'"
        );
    }

    #[test]
    fn test_codes() {
        assert_eq!(GridError::NotOpen { op: Operation::Insert }.code(), 100);
        assert_eq!(
            GridError::FileAlreadyExists {
                path: PathBuf::from("x")
            }
            .code(),
            104
        );
        assert_eq!(
            GridError::IdColumnMismatch {
                expected: "id".to_string(),
                found: "name".to_string()
            }
            .code(),
            202
        );
        assert_eq!(GridError::Cancelled { op: Operation::Update }.code(), 301);
    }

    #[test]
    fn test_busy_detection() {
        let err: Result<()> = Err(busy()).step_context(Operation::Select);
        let err = err.unwrap_err();
        assert!(err.is_busy());
        assert_eq!(err.code(), 201);

        let err: Result<()> = Err(rusqlite::Error::InvalidQuery).prepare_context(Operation::Select);
        assert!(!err.unwrap_err().is_busy());

        assert!(!GridError::NotOpen { op: Operation::Select }.is_busy());
    }

    #[test]
    fn test_operation_names() {
        assert_eq!(Operation::DeleteEntry.to_string(), "delete_entry()");
        assert_eq!(
            GridError::InvalidId {
                column: "id".to_string(),
                value: "abc".to_string()
            }
            .operation(),
            Some(Operation::EntryId)
        );
    }
}
