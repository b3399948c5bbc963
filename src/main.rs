//! Command-line interface for grist-sync
//!
//! # Usage Examples
//!
//! ## Fetch
//! ```bash
//! # Print every row of Table1 as one JSON object per line
//! grist-sync fetch --doc <doc-id> --table Table1
//!
//! # Only rows with ColorRef = 1
//! grist-sync fetch --doc <doc-id> --table Table1 --filter ColorRef=1
//! ```
//!
//! ## Sync
//! ```bash
//! # Preview the changes a sync would make
//! grist-sync sync --doc <doc-id> --job fruit.yaml --source fruit.csv --dry-run
//!
//! # Apply them, 100 rows per request
//! grist-sync sync --doc <doc-id> --job fruit.yaml --source fruit.jsonl --chunk-size 100
//! ```
//!
//! ## Delete
//! ```bash
//! grist-sync delete --doc <doc-id> --table Table1 --ids 5,6,7
//! ```
//!
//! The API key is taken from `--api-key`, then `GRIST_API_KEY`, then
//! `~/.grist-api-key`. `GRIST_LOGLEVEL` (or `RUST_LOG`) sets the log level.

use anyhow::Context;
use clap::{Parser, Subcommand};
use grist_sync::job::SyncJob;
use grist_sync::source::read_source;
use grist_sync::{
    delete_records, fetch_table, init_logging, parse_filter, Filters, GristClient, GristConfig,
    GristOpts, RowId,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "grist-sync")]
#[command(about = "A tool for syncing external tabular data into Grist document tables")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the rows of a table as JSON lines
    Fetch {
        /// Table id
        #[arg(long)]
        table: String,

        /// Only rows where COLUMN equals VALUE (repeatable)
        #[arg(long = "filter", value_name = "COLUMN=VALUE")]
        filters: Vec<String>,

        #[command(flatten)]
        grist: GristOpts,
    },
    /// Sync a CSV or JSONL file into a table as described by a job file
    Sync {
        /// Job file (YAML)
        #[arg(long, value_name = "PATH")]
        job: PathBuf,

        /// Source file (.csv, .jsonl or .ndjson)
        #[arg(long, value_name = "PATH")]
        source: PathBuf,

        #[command(flatten)]
        grist: GristOpts,
    },
    /// Delete rows by id
    Delete {
        /// Table id
        #[arg(long)]
        table: String,

        /// Row ids, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<RowId>,

        #[command(flatten)]
        grist: GristOpts,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            table,
            filters,
            grist,
        } => {
            let filters = filters
                .iter()
                .map(|f| parse_filter(f))
                .collect::<anyhow::Result<Filters>>()?;
            let client = connect(&grist)?;
            let filters = (!filters.is_empty()).then_some(filters);
            let rows = fetch_table(&client, &table, filters.as_ref())
                .await
                .with_context(|| format!("Failed to fetch table {table}"))?;
            for row in &rows {
                println!("{}", json_types::record_to_json(row));
            }
        }
        Commands::Sync { job, source, grist } => {
            let sync_job = SyncJob::from_file(&job)
                .with_context(|| format!("Failed to load sync job from {job:?}"))?;
            let rows = read_source(&source, &sync_job.source_types())?;
            let client = connect(&grist)?;
            let summary = sync_job
                .run(&client, &rows, grist.chunk_size())
                .await
                .with_context(|| format!("Failed to sync table {}", sync_job.table))?;
            println!(
                "{}: {} records ({} filtered out), {} updated, {} added",
                sync_job.table,
                summary.data_count,
                summary.filtered_out,
                summary.updates,
                summary.adds
            );
            if grist.dry_run {
                println!("Dry run: no changes were sent");
            }
        }
        Commands::Delete { table, ids, grist } => {
            let client = connect(&grist)?;
            delete_records(&client, &table, &ids, grist.chunk_size())
                .await
                .with_context(|| format!("Failed to delete rows from {table}"))?;
        }
    }

    Ok(())
}

fn connect(opts: &GristOpts) -> anyhow::Result<GristClient> {
    let client = GristClient::new(GristConfig::from(opts))
        .with_context(|| format!("Failed to set up client for {}", opts.server))?;
    Ok(client)
}
