//! The `load` subcommand: stats API into the SQLite warehouse.

use anyhow::Result;
use chrono::Duration;
use clap::Args;
use courtload_lib::db::DEFAULT_LOCK_TTL_HOURS;
use courtload_lib::runner::concurrency_from_env;
use courtload_lib::{run_load, LoadConfig, PlanOptions};

use super::{ExportOpts, SeasonArgs};
use crate::output::{self, OutputFormat};

/// Arguments for the `load` subcommand.
#[derive(Args)]
pub struct LoadArgs {
    #[command(flatten)]
    pub seasons: SeasonArgs,

    /// Concurrent API calls (defaults to NBA_API_CONCURRENT_REQUESTS or 3)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Cap every derived id list (teams, dates, games, players) for smoke runs
    #[arg(long)]
    pub limit: Option<usize>,

    /// Leave out the lineup endpoints
    #[arg(long)]
    pub skip_lineups: bool,

    /// Write once per season instead of after every phase
    #[arg(long)]
    pub no_flush: bool,

    /// Hours after which another loader's partition lock counts as abandoned
    #[arg(long, default_value_t = DEFAULT_LOCK_TTL_HOURS)]
    pub lock_ttl_hours: i64,

    /// Override the stats API base URL
    #[arg(long)]
    pub base_url: Option<String>,

    #[command(flatten)]
    pub export: ExportOpts,
}

impl LoadArgs {
    fn config(&self) -> Result<LoadConfig> {
        let mut config = LoadConfig::new(
            self.seasons.seasons()?,
            self.seasons.season_type()?,
            &self.seasons.db,
        );
        config.concurrency = self.concurrency.unwrap_or_else(concurrency_from_env).max(1);
        config.plan = PlanOptions {
            limit: self.limit,
            skip_lineups: self.skip_lineups,
        };
        config.flush_per_phase = !self.no_flush;
        config.lock_ttl = Duration::hours(self.lock_ttl_hours);
        config.base_url = self.base_url.clone();
        config.export = self.export.target()?;
        Ok(config)
    }
}

pub async fn run(args: &LoadArgs, format: &OutputFormat) -> Result<()> {
    let config = args.config()?;
    eprintln!(
        "Loading {} season(s) into {} (concurrency {})",
        config.seasons.len(),
        config.db_path.display(),
        config.concurrency
    );
    let report = run_load(&config).await?;
    output::print_run_report(&report, format);
    Ok(())
}
