mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "courtload")]
#[command(about = "Load NBA stats into a local SQLite warehouse")]
struct Cli {
    /// Output format: table, markdown or json
    #[arg(long, default_value = "table", global = true)]
    output: String,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load seasons from the stats API
    Load(Box<commands::load::LoadArgs>),
    /// Scrape seasons from the reference site
    Scrape(commands::scrape::ScrapeArgs),
    /// Show warehouse tables and per-season row counts
    Status(commands::status::StatusArgs),
    /// Write every warehouse table to Parquet or CSV files
    Export(commands::export::ExportArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let directive = if cli.verbose {
        "courtload=debug,statsnba_api=debug"
    } else {
        "courtload=info,statsnba_api=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive)),
        )
        .with_target(false)
        .init();

    let format = OutputFormat::parse(&cli.output);

    match &cli.command {
        Commands::Load(args) => commands::load::run(args.as_ref(), &format).await?,
        Commands::Scrape(args) => commands::scrape::run(args, &format).await?,
        Commands::Status(args) => commands::status::run(args, &format)?,
        Commands::Export(args) => commands::export::run(args, &format)?,
    }

    Ok(())
}
