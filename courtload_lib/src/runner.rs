//! The season loop: lock the partition, fetch, write, release, next season.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Duration;

use crate::bbref::ScrapeClient;
use crate::client::RateLimitedClient;
use crate::db::{Db, DEFAULT_LOCK_TTL_HOURS};
use crate::error::LoadError;
use crate::export::{export_all, ExportFormat, ExportedFile};
use crate::orchestrator::{FetchOrchestrator, TableSource, Tables, DEFAULT_CONCURRENCY};
use crate::plan::{nba_phases, PlanOptions};
use crate::retry::RetryPolicy;
use crate::season::{Season, SeasonContext, SeasonType};
use crate::tracker::TrackerSummary;

/// Where and how to export once every season is written.
#[derive(Clone, Debug)]
pub struct ExportTarget {
    pub dir: PathBuf,
    pub prefix: String,
    pub format: ExportFormat,
}

#[derive(Clone, Debug)]
pub struct LoadConfig {
    pub seasons: Vec<Season>,
    pub season_type: SeasonType,
    pub db_path: PathBuf,
    pub concurrency: usize,
    pub plan: PlanOptions,
    /// Write each phase's tables as soon as the phase drains, instead of
    /// once at the end of the season.
    pub flush_per_phase: bool,
    pub lock_ttl: Duration,
    /// Name recorded on partition locks taken by this run.
    pub owner: String,
    /// Upstream base URL override, for pointing a run at a local stub.
    pub base_url: Option<String>,
    pub export: Option<ExportTarget>,
}

impl LoadConfig {
    pub fn new(seasons: Vec<Season>, season_type: SeasonType, db_path: impl Into<PathBuf>) -> Self {
        Self {
            seasons,
            season_type,
            db_path: db_path.into(),
            concurrency: concurrency_from_env(),
            plan: PlanOptions::default(),
            flush_per_phase: true,
            lock_ttl: Duration::hours(DEFAULT_LOCK_TTL_HOURS),
            owner: default_owner(),
            base_url: None,
            export: None,
        }
    }
}

/// `NBA_API_CONCURRENT_REQUESTS`, or the default of 3.
pub fn concurrency_from_env() -> usize {
    std::env::var("NBA_API_CONCURRENT_REQUESTS")
        .ok()
        .and_then(|val| val.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_CONCURRENCY)
}

pub fn default_owner() -> String {
    format!("courtload-{}", std::process::id())
}

/// What one season's load produced.
#[derive(Debug, Clone)]
pub struct SeasonReport {
    pub context: SeasonContext,
    /// Row counts per dataset, empty datasets included.
    pub tables: Vec<(String, usize)>,
    /// Request counters for this season alone.
    pub requests: Option<TrackerSummary>,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub seasons: Vec<SeasonReport>,
    pub exported: Vec<ExportedFile>,
}

/// Loads every configured season from the stats API into the warehouse
/// at `config.db_path`, then exports if asked to.
pub async fn run_load(config: &LoadConfig) -> Result<RunReport, LoadError> {
    let policy = RetryPolicy::nba_from_env();
    let client = match &config.base_url {
        Some(url) => RateLimitedClient::with_base_url(url, policy)?,
        None => RateLimitedClient::new(policy)?,
    };
    let mut db = open(config)?;
    let result = run_load_with(config, Arc::new(client), &mut db).await;
    finish(db, config, result)
}

/// The season loop over any [`TableSource`] and an open warehouse.
///
/// Upstream failures are absorbed per task, so the loop always moves on to
/// the next season. Store errors, a held partition lock included, end the
/// run.
pub async fn run_load_with<S: TableSource>(
    config: &LoadConfig,
    source: Arc<S>,
    db: &mut Db,
) -> Result<Vec<SeasonReport>, LoadError> {
    let orchestrator = FetchOrchestrator::new(source, config.concurrency);
    let mut reports = Vec::with_capacity(config.seasons.len());

    for season in &config.seasons {
        let context = SeasonContext::new(*season, config.season_type);
        let before = orchestrator.source().request_tracker().map(|t| t.summary());

        lock(db, &context, config)?;
        let result = fetch_and_write(&orchestrator, db, context, config).await;
        unlock(db, &context, config);
        let tables = result?;

        let requests = match (orchestrator.source().request_tracker(), before) {
            (Some(tracker), Some(before)) => {
                let delta = tracker.summary().since(&before);
                delta.log(&context.to_string());
                Some(delta)
            }
            _ => None,
        };
        reports.push(report(context, &tables, requests));
    }
    Ok(reports)
}

async fn fetch_and_write<S: TableSource>(
    orchestrator: &FetchOrchestrator<S>,
    db: &mut Db,
    context: SeasonContext,
    config: &LoadConfig,
) -> Result<Tables, LoadError> {
    tracing::info!("Loading {}", context);
    let phases = nba_phases(context, config.plan);
    let tables = if config.flush_per_phase {
        orchestrator
            .run_with_flush(context, phases, |out| {
                tracing::info!("[{}] flushing phase {}", context, out.phase);
                db.write_tables_for_season(out.tables, &context).map(|_| ())
            })
            .await?
    } else {
        let tables = orchestrator.run(context, phases).await;
        db.write_tables_for_season(&tables, &context)?;
        tables
    };
    db.mark_loaded(&context)?;
    Ok(tables)
}

/// Scrapes every configured season from the reference site into the
/// warehouse. A season whose pages fail after retries is skipped with a
/// warning and nothing of it is written.
pub async fn run_scrape(config: &LoadConfig) -> Result<RunReport, LoadError> {
    let policy = RetryPolicy::bbref_from_env();
    let client = match &config.base_url {
        Some(url) => ScrapeClient::with_base_url(url, policy)?,
        None => ScrapeClient::new(policy)?,
    };
    let mut db = open(config)?;
    let result = run_scrape_with(config, &client, &mut db).await;
    finish(db, config, result)
}

pub async fn run_scrape_with(
    config: &LoadConfig,
    client: &ScrapeClient,
    db: &mut Db,
) -> Result<Vec<SeasonReport>, LoadError> {
    let mut reports = Vec::with_capacity(config.seasons.len());
    for season in &config.seasons {
        let context = SeasonContext::new(*season, config.season_type);
        let before = client.tracker().summary();

        lock(db, &context, config)?;
        let result = scrape_and_write(client, db, context).await;
        unlock(db, &context, config);

        let delta = client.tracker().summary().since(&before);
        delta.log(&context.to_string());
        match result? {
            Some(tables) => reports.push(report(context, &tables, Some(delta))),
            None => reports.push(report(context, &Tables::new(), Some(delta))),
        }
    }
    Ok(reports)
}

async fn scrape_and_write(
    client: &ScrapeClient,
    db: &mut Db,
    context: SeasonContext,
) -> Result<Option<Tables>, LoadError> {
    tracing::info!("Scraping {}", context);
    let tables = match client.scrape_season(context).await {
        Ok(tables) => tables,
        Err(e) => {
            tracing::warn!("{} scrape failed, skipping season: {}", context, e);
            return Ok(None);
        }
    };
    db.write_tables_for_season(&tables, &context)?;
    db.mark_loaded(&context)?;
    Ok(Some(tables))
}

fn open(config: &LoadConfig) -> Result<Db, LoadError> {
    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("could not create {}: {}", parent.display(), e);
            }
        }
    }
    let db = Db::open(&config.db_path)?;
    db.init()?;
    Ok(db)
}

/// Exports on success, then closes the store whatever happened.
fn finish(
    db: Db,
    config: &LoadConfig,
    result: Result<Vec<SeasonReport>, LoadError>,
) -> Result<RunReport, LoadError> {
    let run = result.and_then(|seasons| {
        let exported = match &config.export {
            Some(target) => {
                tracing::info!("Exporting to {} ({})", target.dir.display(), target.format);
                export_all(&db, &target.dir, &target.prefix, target.format)?
            }
            None => Vec::new(),
        };
        Ok(RunReport { seasons, exported })
    });
    let closed = db.close();
    let run = run?;
    closed?;
    Ok(run)
}

fn lock(db: &Db, context: &SeasonContext, config: &LoadConfig) -> Result<(), LoadError> {
    db.acquire_lock(context, &config.owner, config.lock_ttl)?;
    Ok(())
}

fn unlock(db: &Db, context: &SeasonContext, config: &LoadConfig) {
    if let Err(e) = db.release_lock(context, &config.owner) {
        tracing::warn!("failed to release lock on {}: {}", context, e);
    }
}

fn report(context: SeasonContext, tables: &Tables, requests: Option<TrackerSummary>) -> SeasonReport {
    SeasonReport {
        context,
        tables: tables.iter().map(|(k, v)| (k.clone(), v.len())).collect(),
        requests,
    }
}
