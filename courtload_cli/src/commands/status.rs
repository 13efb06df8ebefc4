//! The `status` subcommand: what the warehouse holds.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use courtload_lib::Db;

use crate::output::{self, OutputFormat};

/// Arguments for the `status` subcommand.
#[derive(Args)]
pub struct StatusArgs {
    /// SQLite warehouse path
    #[arg(long, env = "NBA_DB", default_value = "warehouse.db")]
    pub db: PathBuf,
}

pub fn run(args: &StatusArgs, format: &OutputFormat) -> Result<()> {
    if !args.db.exists() {
        bail!("no warehouse at {}", args.db.display());
    }
    let db = Db::open(&args.db)?;
    db.init()?;
    let stats = db.table_stats()?;
    if stats.is_empty() {
        eprintln!("{} holds no tables yet", args.db.display());
    }
    output::print_table_stats(&stats, format);
    db.close()?;
    Ok(())
}
