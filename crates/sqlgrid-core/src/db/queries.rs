//! Statement execution: select, insert, update, delete and id lookup.

use log::debug;
use rusqlite::{
    fallible_iterator::FallibleIterator, types::ValueRef, Batch, Connection, Statement,
};

use crate::{
    error::{GridError, Operation, Result, SqlResultExt},
    grid::{render_value, ResultGrid},
};

impl super::Database {
    /// Runs a query and returns its rows as strings, with the column names
    /// in row 0. A query of only whitespace and comments gives an empty grid.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::NotOpen`] on a closed handle, otherwise
    /// [`GridError::PrepareFailed`] / [`GridError::StepFailed`] for engine
    /// failures and the retry errors for a database that stays busy.
    pub fn select(&self, query: &str) -> Result<ResultGrid> {
        let op = Operation::Select;
        let connection = self.connection(op)?;
        debug!("{op}: {query}");

        self.with_retry(op, || {
            let Some(mut statement) = prepare(connection, query, op)? else {
                return Ok(ResultGrid::default());
            };
            let columns: Vec<String> = statement
                .column_names()
                .into_iter()
                .map(String::from)
                .collect();
            let column_count = columns.len();

            let mut rows = statement.query([]).step_context(op)?;
            let mut data = Vec::new();
            while let Some(row) = rows.next().step_context(op)? {
                let mut values = Vec::with_capacity(column_count);
                for index in 0..column_count {
                    values.push(render_value(row.get_ref(index).step_context(op)?));
                }
                data.push(values);
            }
            Ok(ResultGrid::from_parts(columns, data))
        })
    }

    /// Runs an INSERT and returns the row id of the last inserted row. Rows
    /// produced by a `RETURNING` clause are stepped through and discarded.
    /// An empty query inserts nothing and returns `0`.
    ///
    /// # Errors
    ///
    /// Same as [`select`](Self::select).
    pub fn insert(&self, query: &str) -> Result<i64> {
        let op = Operation::Insert;
        let connection = self.connection(op)?;
        debug!("{op}: {query}");

        self.with_retry(op, || {
            let Some(mut statement) = prepare(connection, query, op)? else {
                return Ok(0);
            };
            step_to_done(&mut statement, op)?;
            Ok(connection.last_insert_rowid())
        })
    }

    /// Runs an UPDATE and returns the number of rows it changed. Rows from a
    /// `RETURNING` clause are discarded.
    ///
    /// # Errors
    ///
    /// Same as [`select`](Self::select).
    pub fn update(&self, query: &str) -> Result<usize> {
        self.execute_counted(Operation::Update, query)
    }

    /// Runs a DELETE and returns the number of rows it removed.
    ///
    /// # Errors
    ///
    /// Same as [`select`](Self::select).
    pub fn delete_entry(&self, query: &str) -> Result<usize> {
        self.execute_counted(Operation::DeleteEntry, query)
    }

    /// Runs a query whose first column holds ids and returns the integer in
    /// its first row, or `0` when the query yields no rows.
    ///
    /// # Errors
    ///
    /// Besides the errors of [`select`](Self::select):
    /// - [`GridError::IdColumnMismatch`] if the first result column is not
    ///   named `id_column`
    /// - [`GridError::InvalidId`] if the value is not an integer
    pub fn entry_id(&self, query: &str, id_column: &str) -> Result<i64> {
        let op = Operation::EntryId;
        let connection = self.connection(op)?;
        debug!("{op}: {query} (column {id_column})");

        let value = self.with_retry(op, || {
            let Some(mut statement) = prepare(connection, query, op)? else {
                return Ok(None);
            };
            let columns = statement.column_names();
            if columns.first() != Some(&id_column) {
                return Err(GridError::IdColumnMismatch {
                    expected: id_column.to_string(),
                    found: columns.join(", "),
                });
            }

            let mut rows = statement.query([]).step_context(op)?;
            match rows.next().step_context(op)? {
                Some(row) => match row.get_ref(0).step_context(op)? {
                    ValueRef::Integer(id) => Ok(Some(Ok(id))),
                    other => Ok(Some(Err(render_value(other)))),
                },
                None => Ok(None),
            }
        })?;

        match value {
            None => Ok(0),
            Some(Ok(id)) => Ok(id),
            Some(Err(text)) => text.trim().parse().map_err(|_| GridError::InvalidId {
                column: id_column.to_string(),
                value: text,
            }),
        }
    }

    /// Runs one or more statements separated by semicolons, discarding any
    /// rows they return. Each statement is retried on its own while the
    /// database is busy.
    ///
    /// # Errors
    ///
    /// Same as [`select`](Self::select).
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let op = Operation::ExecuteBatch;
        let connection = self.connection(op)?;
        debug!("{op}: {sql}");
        self.run_batch(connection, sql, op)
    }

    pub(super) fn run_batch(&self, connection: &Connection, sql: &str, op: Operation) -> Result<()> {
        let mut batch = Batch::new(connection, sql);
        while let Some(mut statement) = self.with_retry(op, || batch.next().prepare_context(op))? {
            self.with_retry(op, || step_to_done(&mut statement, op))?;
        }
        Ok(())
    }

    fn execute_counted(&self, op: Operation, query: &str) -> Result<usize> {
        let connection = self.connection(op)?;
        debug!("{op}: {query}");

        self.with_retry(op, || {
            let Some(mut statement) = prepare(connection, query, op)? else {
                return Ok(0);
            };
            step_to_done(&mut statement, op)?;
            Ok(connection.changes() as usize)
        })
    }
}

/// Compiles a single statement. Returns `None` when `query` holds nothing
/// but whitespace and comments.
fn prepare<'conn>(
    connection: &'conn Connection,
    query: &str,
    op: Operation,
) -> Result<Option<Statement<'conn>>> {
    if Batch::new(connection, query).next().prepare_context(op)?.is_none() {
        return Ok(None);
    }
    connection.prepare(query).prepare_context(op).map(Some)
}

/// Steps a statement until the engine reports it done, discarding any rows.
fn step_to_done(statement: &mut Statement<'_>, op: Operation) -> Result<()> {
    let mut rows = statement.raw_query();
    while rows.next().step_context(op)?.is_some() {}
    Ok(())
}
