//! The `export` subcommand: every warehouse table to one file each.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use courtload_lib::{export_all, Db, ExportFormat};

use crate::output::{self, OutputFormat};

/// Arguments for the `export` subcommand.
#[derive(Args)]
pub struct ExportArgs {
    /// SQLite warehouse path
    #[arg(long, env = "NBA_DB", default_value = "warehouse.db")]
    pub db: PathBuf,

    /// Target directory
    #[arg(long, env = "NBA_EXPORT_DIR")]
    pub dir: PathBuf,

    /// Key prefix under the target directory
    #[arg(long, env = "NBA_EXPORT_PREFIX", default_value = "nba")]
    pub prefix: String,

    /// parquet or csv
    #[arg(long, default_value = "parquet")]
    pub format: String,
}

pub fn run(args: &ExportArgs, format: &OutputFormat) -> Result<()> {
    if !args.db.exists() {
        bail!("no warehouse at {}", args.db.display());
    }
    let file_format: ExportFormat = args.format.parse()?;
    let db = Db::open(&args.db)?;
    db.init()?;
    let written = export_all(&db, &args.dir, &args.prefix, file_format)?;
    eprintln!("Exported {} table(s)", written.len());
    output::print_exported(&written, format);
    db.close()?;
    Ok(())
}
