//! Library layer for courtload: a paced, retrying stats API client, phased
//! fetch orchestration, and an idempotent SQLite warehouse.
//!
//! Wraps the `statsnba_api` crate with pacing and backoff, turns its result
//! sets into column-normalized tables, and writes them per season partition.
//! A scrape source for the reference site and a file exporter sit alongside.

pub mod bbref;
pub mod client;
pub mod db;
pub mod error;
pub mod export;
pub mod html;
pub mod normalize;
pub mod orchestrator;
pub mod plan;
pub mod retry;
pub mod runner;
pub mod season;
pub mod table;
pub mod tracker;

pub use statsnba_api;
pub use statsnba_api::types;

pub use bbref::{ScrapeClient, ScrapeError};
pub use client::{ClientError, RateLimitedClient};
pub use db::{Db, DbError, TableStats, WriteOutcome};
pub use error::LoadError;
pub use export::{export_all, ExportError, ExportFormat, ExportedFile};
pub use normalize::TableNormalizer;
pub use orchestrator::{FetchOrchestrator, FetchPhase, FetchTask, PhaseOutput, TableSource, Tables};
pub use plan::{nba_phases, PlanOptions};
pub use retry::{RetryPolicy, Retryable};
pub use runner::{run_load, run_load_with, run_scrape, ExportTarget, LoadConfig, RunReport, SeasonReport};
pub use season::{resolve_seasons, Season, SeasonContext, SeasonError, SeasonType};
pub use table::RawTable;
pub use tracker::{RequestTracker, TrackerSummary};
