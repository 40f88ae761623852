use std::path::PathBuf;
use std::time::Duration;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use sqlgrid_core::RetryPolicy;

/// Run SQL statements against a SQLite database file
///
/// Each command opens the database, runs one statement and closes it again.
/// Query results are printed as a table with the column names in the first
/// row. While another process holds a lock, statements are retried until the
/// retry bounds are reached or Ctrl-C is pressed.
#[derive(Parser)]
#[command(version, about, name = "sg")]
pub struct Args {
    /// Path to the SQLite database file. Defaults to
    /// $XDG_DATA_HOME/sqlgrid/sqlgrid.db
    #[arg(long, global = true)]
    pub database_file: Option<PathBuf>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Milliseconds to wait between attempts while the database is busy
    #[arg(long, global = true, default_value_t = 1000)]
    pub retry_interval_ms: u64,

    /// Maximum number of attempts while the database is busy
    #[arg(long, global = true)]
    pub max_attempts: Option<u32>,

    /// Seconds to keep retrying a busy database; 0 retries until cancelled
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Commands,
}

impl Args {
    /// Busy-retry policy described by the retry flags.
    pub fn retry_policy(&self) -> RetryPolicy {
        let mut policy = RetryPolicy::new(Duration::from_millis(self.retry_interval_ms));
        if let Some(max_attempts) = self.max_attempts {
            policy = policy.with_max_attempts(max_attempts);
        }
        if self.timeout_secs > 0 {
            policy = policy.with_timeout(Duration::from_secs(self.timeout_secs));
        }
        policy
    }
}

/// How command results are printed
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Markdown table rendered for the terminal
    Table,
    /// JSON document on a single line
    Json,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Create a new database file and run a schema query in it
    Create(CreateArgs),
    /// Run a query and print its rows
    #[command(alias = "s")]
    Select {
        /// SQL query
        query: String,
    },
    /// Run an INSERT and print the id of the last inserted row
    #[command(alias = "i")]
    Insert {
        /// SQL statement
        query: String,
    },
    /// Run an UPDATE and print the number of changed rows
    #[command(alias = "u")]
    Update {
        /// SQL statement
        query: String,
    },
    /// Run a DELETE and print the number of removed rows
    #[command(alias = "d")]
    Delete {
        /// SQL statement
        query: String,
    },
    /// Print the integer id found in the first row of a query, or 0
    Id {
        /// SQL query
        query: String,
        /// Name of the result column holding the id
        #[arg(short, long, default_value = "id")]
        column: String,
    },
}

/// Schema source for `create`
#[derive(ClapArgs)]
#[group(required = true, multiple = false)]
pub struct CreateArgs {
    /// Schema SQL; may contain several statements
    #[arg(long)]
    pub schema: Option<String>,

    /// File to read the schema SQL from
    #[arg(long)]
    pub schema_file: Option<PathBuf>,
}
