//! CLI subcommand implementations.

pub mod export;
pub mod load;
pub mod scrape;
pub mod status;

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Args;
use courtload_lib::{resolve_seasons, ExportFormat, ExportTarget, Season, SeasonType};

/// Season selection and warehouse location, shared by `load` and `scrape`.
#[derive(Args)]
pub struct SeasonArgs {
    /// Season year, the year the season ends in (2026 for 2025-26)
    #[arg(long, env = "NBA_SEASON", default_value = "2026")]
    pub season: Season,

    /// First season of an inclusive range
    #[arg(long)]
    pub start_season: Option<Season>,

    /// Last season of an inclusive range
    #[arg(long)]
    pub end_season: Option<Season>,

    /// Regular Season, Playoffs, Pre Season or All Star
    #[arg(long, default_value = "Regular Season")]
    pub season_type: String,

    /// SQLite warehouse path
    #[arg(long, env = "NBA_DB", default_value = "warehouse.db")]
    pub db: PathBuf,
}

impl SeasonArgs {
    pub fn seasons(&self) -> Result<Vec<Season>> {
        Ok(resolve_seasons(self.season, self.start_season, self.end_season)?)
    }

    pub fn season_type(&self) -> Result<SeasonType> {
        self.season_type
            .parse()
            .map_err(|e| anyhow!("--season-type: {}", e))
    }
}

/// Optional export after a run.
#[derive(Args)]
pub struct ExportOpts {
    /// Export every table here after the run (omit to skip)
    #[arg(long, env = "NBA_EXPORT_DIR")]
    pub export_dir: Option<PathBuf>,

    /// Key prefix under the export directory
    #[arg(long, env = "NBA_EXPORT_PREFIX", default_value = "nba")]
    pub export_prefix: String,

    /// parquet or csv
    #[arg(long, default_value = "parquet")]
    pub export_format: String,
}

impl ExportOpts {
    pub fn target(&self) -> Result<Option<ExportTarget>> {
        let Some(dir) = &self.export_dir else {
            return Ok(None);
        };
        let format: ExportFormat = self.export_format.parse()?;
        Ok(Some(ExportTarget {
            dir: dir.clone(),
            prefix: self.export_prefix.clone(),
            format,
        }))
    }
}
