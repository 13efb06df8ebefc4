//! The `scrape` subcommand: reference-site pages into the SQLite warehouse.

use anyhow::Result;
use chrono::Duration;
use clap::Args;
use courtload_lib::db::DEFAULT_LOCK_TTL_HOURS;
use courtload_lib::{run_scrape, LoadConfig};

use super::{ExportOpts, SeasonArgs};
use crate::output::{self, OutputFormat};

/// Arguments for the `scrape` subcommand.
#[derive(Args)]
pub struct ScrapeArgs {
    #[command(flatten)]
    pub seasons: SeasonArgs,

    /// Hours after which another loader's partition lock counts as abandoned
    #[arg(long, default_value_t = DEFAULT_LOCK_TTL_HOURS)]
    pub lock_ttl_hours: i64,

    /// Override the reference site base URL
    #[arg(long)]
    pub base_url: Option<String>,

    #[command(flatten)]
    pub export: ExportOpts,
}

pub async fn run(args: &ScrapeArgs, format: &OutputFormat) -> Result<()> {
    let mut config = LoadConfig::new(
        args.seasons.seasons()?,
        args.seasons.season_type()?,
        &args.seasons.db,
    );
    config.lock_ttl = Duration::hours(args.lock_ttl_hours);
    config.base_url = args.base_url.clone();
    config.export = args.export.target()?;

    eprintln!(
        "Scraping {} season(s) into {}",
        config.seasons.len(),
        config.db_path.display()
    );
    let report = run_scrape(&config).await?;
    output::print_run_report(&report, format);
    Ok(())
}
