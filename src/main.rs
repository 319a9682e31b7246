use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use loket_summary_lib::commands;
use loket_summary_lib::excel;
use loket_summary_lib::server;
use loket_summary_lib::types::{SummaryTable, SUMMARY_COLUMNS};
use loket_summary_lib::{AppConfig, OfficeOrder, SummaryOptions};

#[derive(Parser)]
#[command(name = "loket-summary", version)]
#[command(about = "Per-office summary of unpaid guarantee claims from DATA CONTROL workbooks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the upload web service (default)
    Serve {
        /// Address to bind (overrides LOKET_HOST)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides LOKET_PORT / PORT)
        #[arg(long)]
        port: Option<u16>,
        /// Directory for saved uploads
        #[arg(long)]
        upload_dir: Option<PathBuf>,
        /// Directory for the generated summary workbook
        #[arg(long)]
        result_dir: Option<PathBuf>,
    },

    /// Summarise a workbook from the command line
    Summarize {
        /// Path to the .xlsx/.xls file containing a DATA CONTROL sheet
        file: PathBuf,
        /// Only count rows whose GL Status is "active"
        #[arg(long)]
        active_only: bool,
        /// Sort offices by name
        #[arg(long)]
        sort: bool,
        /// Write the summary workbook here instead of printing
        #[arg(long)]
        out: Option<PathBuf>,
        /// Print JSON instead of a text table
        #[arg(long, conflicts_with = "out")]
        json: bool,
    },
}

fn print_table(table: &SummaryTable) {
    let width = table
        .rows()
        .map(|r| r.office.chars().count())
        .chain(std::iter::once(SUMMARY_COLUMNS[0].len()))
        .max()
        .unwrap_or(0);
    let mut line = format!("{:<width$}", SUMMARY_COLUMNS[0], width = width);
    for header in &SUMMARY_COLUMNS[1..] {
        line.push_str(&format!("  {}", header));
    }
    println!("{}", line);
    for row in table.rows() {
        let mut line = format!("{:<width$}", row.office, width = width);
        for (header, value) in SUMMARY_COLUMNS[1..].iter().zip(row.counts()) {
            line.push_str(&format!("  {:>w$}", value, w = header.len()));
        }
        println!("{}", line);
    }
}

fn summarize_command(
    file: PathBuf,
    active_only: bool,
    sort: bool,
    out: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let config = AppConfig::from_env();
    let order = if sort {
        OfficeOrder::Sorted
    } else {
        OfficeOrder::FirstSeen
    };
    let options = SummaryOptions::default()
        .with_active_ledger(active_only)
        .with_order(order);

    let table = commands::summarize_file(&file, &options, config.max_upload_bytes)
        .with_context(|| format!("summarising {}", file.display()))?;

    if let Some(out) = out {
        excel::export_summary_to_excel(&table, &out)?;
        info!("Wrote {}", out.display());
    } else if json {
        println!("{}", serde_json::to_string_pretty(&table)?);
    } else {
        print_table(&table);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    loket_summary_lib::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        None => server::serve(AppConfig::from_env()).await,
        Some(Commands::Serve {
            host,
            port,
            upload_dir,
            result_dir,
        }) => {
            let mut config = AppConfig::from_env();
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(dir) = upload_dir {
                config.upload_dir = dir;
            }
            if let Some(dir) = result_dir {
                config.result_dir = dir;
            }
            server::serve(config).await
        }
        Some(Commands::Summarize {
            file,
            active_only,
            sort,
            out,
            json,
        }) => tokio::task::spawn_blocking(move || {
            summarize_command(file, active_only, sort, out, json)
        })
        .await?,
    }
}
