mod error;
mod telemetry;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use ehf_core::app::{StatusUpdater, UpdateReport};
use ehf_core::cache::Session;
use ehf_core::config::{AppConfig, LookupMode, parse_base_url};
use ehf_core::domain::{EntityId, Status, StatusBoard};
use ehf_core::impls::HttpStatusSource;
use ehf_core::ports::SystemClock;
use ehf_core::table::Table;
use serde::Serialize;
use tracing::info;

use crate::error::CliError;

#[derive(Parser, Debug)]
#[command(
    name = "ehf",
    about = "Look up EHF status for organization numbers and sort tabular output",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the EHF status of one or more organization numbers
    Status(StatusArgs),
    /// Sort a CSV table as if a column header was clicked
    Sort(SortArgs),
}

#[derive(Args, Debug)]
struct StatusArgs {
    /// Organization numbers to look up
    #[arg(required = true)]
    ids: Vec<String>,
    /// Use one bulk request instead of individual lookups
    #[arg(long)]
    batch: bool,
    /// Override the maximum number of lookups in flight
    #[arg(long)]
    concurrency: Option<usize>,
    /// Override the configured backend base url
    #[arg(long)]
    base_url: Option<String>,
    /// Print the full report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct SortArgs {
    /// CSV file whose first row holds the headers
    file: PathBuf,
    /// Zero-based column index to sort by
    #[arg(long)]
    column: usize,
    /// Number of header clicks (even counts end descending)
    #[arg(long, default_value_t = 1)]
    clicks: usize,
}

#[derive(Debug, Serialize)]
struct StatusLine<'a> {
    id: &'a EntityId,
    status: Status,
    label: &'static str,
    glyph: &'a str,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("ehf error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();
    match cli.command {
        Command::Status(args) => run_status(args).await,
        Command::Sort(args) => run_sort(args),
    }
}

async fn run_status(args: StatusArgs) -> Result<(), CliError> {
    let mut config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    if let Some(raw) = args.base_url {
        config.source.base_url = parse_base_url(&raw)?;
    }
    if let Some(limit) = args.concurrency {
        config.updater.concurrency = limit;
    }
    if args.batch {
        config.updater.mode = LookupMode::Batch;
    }

    let ids = args
        .ids
        .into_iter()
        .map(EntityId::new)
        .collect::<Result<Vec<_>, _>>()?;

    let source = HttpStatusSource::new(
        config.source.base_url.clone(),
        &config.source.bulk_path,
        config.source.timeout,
    )?;
    let session = Session::in_memory(&SystemClock);
    let updater = StatusUpdater::new(
        Arc::new(source),
        session.cache().clone(),
        config.updater.update_mode(),
    )?;

    info!(
        session = %session.id(),
        ids = ids.len(),
        mode = ?config.updater.update_mode(),
        "resolving statuses"
    );
    let mut board = StatusBoard::from_ids(ids);
    let report = updater.update(&mut board).await;

    if args.json {
        print_json(&report)?;
    } else {
        print_board(&board);
    }

    session.end();
    Ok(())
}

fn print_board(board: &StatusBoard) {
    for element in board.elements() {
        let status = board.status_of(element.entity_id());
        println!(
            "{}\t{}\t{}",
            element.entity_id(),
            status.label(),
            element.content()
        );
    }
}

fn print_json(report: &UpdateReport) -> Result<(), CliError> {
    let lines: Vec<StatusLine<'_>> = report
        .resolutions
        .iter()
        .map(|(id, resolution)| StatusLine {
            id,
            status: resolution.status,
            label: resolution.status.label(),
            glyph: resolution.status.glyph(),
        })
        .collect();
    let out = serde_json::json!({
        "statuses": lines,
        "report": report,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn run_sort(args: SortArgs) -> Result<(), CliError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(&args.file)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let rows = reader
        .records()
        .map(|record| record.map(|r| r.iter().map(str::to_string).collect::<Vec<_>>()))
        .collect::<Result<Vec<_>, _>>()?;

    let table_id = args
        .file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "table".to_string());
    let mut table = Table::new(table_id, headers, rows);

    for _ in 0..args.clicks {
        table.sort_by_column(args.column)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(io::stdout());
    writer.write_record(table.headers().iter().map(|h| h.text()))?;
    for row in table.rows() {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}
