//! sqlgrid CLI Application
//!
//! Command-line interface for running SQL statements against a SQLite file
//! and printing the results as string grids.

mod args;
mod cli;
mod renderer;

use anyhow::{Context, Result};
use args::Args;
use clap::Parser;
use cli::Cli;
use log::info;
use renderer::TerminalRenderer;
use sqlgrid_core::{default_database_path, CancelFlag, DatabaseBuilder};
use tokio::{signal, task};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let retry_policy = args.retry_policy();
    let Args {
        database_file,
        no_color,
        format,
        command,
        ..
    } = args;

    let database_file = match database_file {
        Some(path) => path,
        None => default_database_path().context("Failed to resolve default database path")?,
    };

    let cancel = CancelFlag::new();
    let db = DatabaseBuilder::new()
        .with_retry_policy(retry_policy)
        .with_cancel_flag(cancel.clone())
        .build();
    let cli = Cli::new(db, TerminalRenderer::new(!no_color), format);

    info!("sqlgrid started on {}", database_file.display());

    let mut work = task::spawn_blocking(move || cli.run(&database_file, command));
    tokio::select! {
        joined = &mut work => return joined.context("Command task failed")?,
        Ok(()) = signal::ctrl_c() => {
            info!("Received Ctrl-C, cancelling busy retries...");
            cancel.cancel();
        }
    }

    work.await.context("Command task failed")?
}
