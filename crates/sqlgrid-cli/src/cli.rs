//! Command handlers for the sg binary.
//!
//! Every command runs synchronously against a [`Database`] handle and is
//! meant to be driven from a blocking task. Results are printed either as
//! markdown rendered for the terminal or as single-line JSON.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use serde_json::json;
use sqlgrid_core::{Database, GridError};

use crate::{
    args::{Commands, CreateArgs, OutputFormat},
    renderer::TerminalRenderer,
};

/// CLI handler owning the database handle for one command.
pub struct Cli {
    db: Database,
    renderer: TerminalRenderer,
    format: OutputFormat,
}

impl Cli {
    pub fn new(db: Database, renderer: TerminalRenderer, format: OutputFormat) -> Self {
        Self {
            db,
            renderer,
            format,
        }
    }

    /// Runs `command` against the database at `path`. Statement commands
    /// open the existing file and close it again afterwards.
    pub fn run(mut self, path: &Path, command: Commands) -> Result<()> {
        match command {
            Commands::Create(args) => self.create(path, args),
            Commands::Select { query } => self.with_open(path, |cli| cli.select(&query)),
            Commands::Insert { query } => self.with_open(path, |cli| {
                let id = cli.db.insert(&query).map_err(coded)?;
                cli.emit(&json!({ "id": id }), &format!("Inserted row **{id}**\n"));
                Ok(())
            }),
            Commands::Update { query } => self.with_open(path, |cli| {
                let changed = cli.db.update(&query).map_err(coded)?;
                cli.emit(
                    &json!({ "changed": changed }),
                    &format!("Updated **{changed}** row(s)\n"),
                );
                Ok(())
            }),
            Commands::Delete { query } => self.with_open(path, |cli| {
                let removed = cli.db.delete_entry(&query).map_err(coded)?;
                cli.emit(
                    &json!({ "removed": removed }),
                    &format!("Deleted **{removed}** row(s)\n"),
                );
                Ok(())
            }),
            Commands::Id { query, column } => self.with_open(path, |cli| {
                let id = cli.db.entry_id(&query, &column).map_err(coded)?;
                cli.emit(&json!({ "id": id }), &format!("{id}\n"));
                Ok(())
            }),
        }
    }

    /// Opens the existing file, runs `f` and closes the file again, also
    /// when `f` fails.
    fn with_open<F>(&mut self, path: &Path, f: F) -> Result<()>
    where
        F: FnOnce(&Self) -> Result<()>,
    {
        self.db.open(path, "").map_err(coded)?;
        let result = f(self);
        let closed = self.db.close().map_err(coded);
        result?;
        closed?;
        Ok(())
    }

    fn create(&mut self, path: &Path, args: CreateArgs) -> Result<()> {
        let schema = match (args.schema, args.schema_file) {
            (Some(schema), _) => schema,
            (None, Some(schema_file)) => fs::read_to_string(&schema_file).with_context(|| {
                format!("Failed to read schema file {}", schema_file.display())
            })?,
            (None, None) => anyhow::bail!("Either --schema or --schema-file is required"),
        };
        if schema.trim().is_empty() {
            anyhow::bail!("Schema must not be empty");
        }

        self.db.open(path, &schema).map_err(coded)?;
        self.db.close().map_err(coded)?;

        let path = path.display().to_string();
        self.emit(
            &json!({ "created": path }),
            &format!("Created database at `{path}`\n"),
        );
        Ok(())
    }

    fn select(&self, query: &str) -> Result<()> {
        let grid = self.db.select(query).map_err(coded)?;
        debug!("select returned {} row(s)", grid.row_count());
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string(&grid)?),
            OutputFormat::Table => self.renderer.render(&grid.to_string()),
        }
        Ok(())
    }

    fn emit(&self, value: &serde_json::Value, markdown: &str) {
        match self.format {
            OutputFormat::Json => println!("{value}"),
            OutputFormat::Table => self.renderer.render(markdown),
        }
    }
}

/// Attaches the error's catalog code as context.
fn coded(err: GridError) -> anyhow::Error {
    let code = err.code();
    anyhow::Error::new(err).context(format!("Command failed with code {code}"))
}
