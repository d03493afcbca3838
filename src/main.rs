//! Command-line front end for sqlite-as-json.
//!
//! ```bash
//! sqlite-as-json --db app.db --schema schema.json create-tables
//! sqlite-as-json --db app.db --schema schema.json insert users '{"email": "a@b.com"}'
//! sqlite-as-json --db app.db --schema schema.json search users '{"email": "a@b.com"}'
//! sqlite-as-json --db app.db --schema schema.json update users <id> '{"email": "c@d.com"}'
//! sqlite-as-json --db app.db --schema schema.json delete users <id>
//! ```

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::json;
use sqlite_as_json::{Combinator, ConnectionConfig, JsonDb, Payload, ThreadingMode, load_schema};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sqlite-as-json", version)]
#[command(about = "Run CRUD operations on JSON-declared SQLite tables")]
struct Cli {
    /// SQLite database file
    #[arg(long)]
    db: PathBuf,

    /// JSON file with the table definitions
    #[arg(long)]
    schema: PathBuf,

    /// Let SQLite lock internally as well
    #[arg(long)]
    serialized: bool,

    /// Do not enforce FOREIGN KEY clauses
    #[arg(long)]
    no_foreign_keys: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Drop and recreate every declared table
    CreateTables,
    /// Insert one record
    Insert { table: String, data: String },
    /// Print matching records as JSON
    Search {
        table: String,
        /// JSON object of field/value pairs; all rows when omitted
        filter: Option<String>,
        /// AND or OR
        #[arg(long, default_value = "AND")]
        combinator: Combinator,
    },
    /// Update the record with the given id
    Update {
        table: String,
        id: String,
        data: String,
    },
    /// Delete the record with the given id
    Delete { table: String, id: String },
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let schema = load_schema(&cli.schema)
        .with_context(|| format!("Failed to load schema '{}'", cli.schema.display()))?;
    let threading = if cli.serialized {
        ThreadingMode::Serialized
    } else {
        ThreadingMode::MultiThread
    };
    let config = ConnectionConfig::file(&cli.db)
        .threading(threading)
        .foreign_keys(!cli.no_foreign_keys);

    let db = JsonDb::with_schema(config, schema)
        .with_context(|| format!("Failed to open database '{}'", cli.db.display()))?;

    match cli.command {
        Command::CreateTables => {
            let status = db.create_table()?;
            print_json(&json!({ "Success": status.to_string() }))?;
        }
        Command::Insert { table, data } => {
            let inserted = db.insert_data(&table, &parse_object(&data)?)?;
            print_json(&json!({
                "Success": "Data Inserted",
                "id": inserted.id,
                "timestamp": inserted.timestamp,
            }))?;
        }
        Command::Search {
            table,
            filter,
            combinator,
        } => {
            let filter = match filter {
                Some(raw) => parse_object(&raw)?,
                None => Payload::new(),
            };
            let records = db.search_data(&table, &filter, combinator)?;
            print_json(&serde_json::Value::Array(
                records.into_iter().map(serde_json::Value::Object).collect(),
            ))?;
        }
        Command::Update { table, id, data } => {
            let status = db.update_data(&table, &id, &parse_object(&data)?)?;
            print_json(&json!({ "Success": status.to_string() }))?;
        }
        Command::Delete { table, id } => {
            let status = db.delete_data(&table, &id)?;
            print_json(&json!({ "Success": status.to_string() }))?;
        }
    }

    db.close()?;
    Ok(())
}

fn parse_object(raw: &str) -> Result<Payload> {
    let value: serde_json::Value =
        serde_json::from_str(raw).with_context(|| format!("Invalid JSON: {}", raw))?;
    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => bail!("Expected a JSON object, got {}", other),
    }
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
