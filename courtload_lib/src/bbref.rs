//! Scrape source for the reference site's schedule, season totals and
//! roster pages.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::html::locate_table;
use crate::normalize::TableNormalizer;
use crate::orchestrator::Tables;
use crate::retry::{with_retry, RetryPolicy, Retryable};
use crate::season::SeasonContext;
use crate::table::RawTable;
use crate::tracker::RequestTracker;

pub const DEFAULT_BASE_URL: &str = "https://www.basketball-reference.com";

pub const GAMES: &str = "games";
pub const PLAYER_SEASON_TOTALS: &str = "player_season_totals";
pub const ROSTER: &str = "roster";

/// Tag column naming the team a roster row was scraped for.
pub const TEAM_ABBREV_COLUMN: &str = "team_abbrev";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36";

/// Pause after the warm-up request, before the first real page.
const WARMUP_DELAY: Duration = Duration::from_secs(1);

/// Month suffixes of the per-month schedule pages, in season order.
pub const SCHEDULE_MONTHS: [&str; 9] = [
    "october", "november", "december", "january", "february", "march", "april", "may", "june",
];

/// Franchise codes as the site spells them.
pub const TEAM_ABBREVIATIONS: [&str; 30] = [
    "ATL", "BOS", "BRK", "CHO", "CHI", "CLE", "DAL", "DEN", "DET", "GSW", "HOU", "IND", "LAC",
    "LAL", "MEM", "MIA", "MIL", "MIN", "NOP", "NYK", "OKC", "ORL", "PHI", "PHO", "POR", "SAC",
    "SAS", "TOR", "UTA", "WAS",
];

const RETRY_STATUS_CODES: [u16; 5] = [429, 500, 502, 503, 504];

#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status}")]
    HttpStatus {
        status: StatusCode,
        retry_after: Option<String>,
    },
    #[error("page not found: {url}")]
    NotFound { url: String },
}

impl Retryable for ScrapeError {
    fn is_retryable(&self) -> bool {
        match self {
            // Resets and connections closed mid-response are transient too.
            ScrapeError::Http(e) => {
                e.is_timeout() || e.is_connect() || e.is_request() || e.is_body()
            }
            ScrapeError::HttpStatus { status, .. } => RETRY_STATUS_CODES.contains(&status.as_u16()),
            ScrapeError::NotFound { .. } => false,
        }
    }

    fn retry_after(&self) -> Option<&str> {
        match self {
            ScrapeError::HttpStatus { retry_after, .. } => retry_after.as_deref(),
            _ => None,
        }
    }
}

/// HTML client for the reference site.
///
/// All pages go through the shared pacing and retry loop, with a random
/// extra delay on top of the fixed one. The first page of a session is
/// preceded by a best-effort visit to the home page so the site's cookies
/// are set.
pub struct ScrapeClient {
    base_url: String,
    http: reqwest::Client,
    policy: RetryPolicy,
    tracker: RequestTracker,
    warmed: OnceCell<()>,
}

impl ScrapeClient {
    pub fn new(policy: RetryPolicy) -> Result<Self, ScrapeError> {
        Self::with_base_url(DEFAULT_BASE_URL, policy)
    }

    pub fn with_base_url(base_url: &str, policy: RetryPolicy) -> Result<Self, ScrapeError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("en-US,en;q=0.9"),
        );
        if let Ok(referer) = reqwest::header::HeaderValue::from_str(&format!("{}/", base_url)) {
            headers.insert(reqwest::header::REFERER, referer);
        }
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .cookie_store(true)
            .timeout(policy.timeout)
            .build()?;
        Ok(Self {
            base_url,
            http,
            policy,
            tracker: RequestTracker::new(),
            warmed: OnceCell::new(),
        })
    }

    pub fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }

    async fn warm_up(&self) {
        self.warmed
            .get_or_init(|| async {
                let url = format!("{}/", self.base_url);
                match self.http.get(&url).send().await {
                    Ok(resp) => tracing::debug!("warm-up {} -> {}", url, resp.status()),
                    Err(e) => tracing::debug!("warm-up {} failed: {}", url, e),
                }
                tokio::time::sleep(WARMUP_DELAY).await;
            })
            .await;
    }

    /// Fetches `path` (relative to the base URL) and returns the body.
    /// A 404 is [`ScrapeError::NotFound`] and is never retried.
    pub async fn fetch_html(&self, path: &str) -> Result<String, ScrapeError> {
        self.warm_up().await;
        let url = format!("{}{}", self.base_url, path);
        with_retry(&self.policy, &self.tracker, &url, || self.get_once(&url)).await
    }

    async fn get_once(&self, url: &str) -> Result<String, ScrapeError> {
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ScrapeError::NotFound {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            let retry_after = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            return Err(ScrapeError::HttpStatus { status, retry_after });
        }
        Ok(resp.text().await?)
    }

    /// Fetches a page and locates the first of `ids` present on it. `None`
    /// when the page is missing or has none of the tables.
    async fn page_table(
        &self,
        path: &str,
        dataset: &str,
        ids: &[&str],
    ) -> Result<Option<RawTable>, ScrapeError> {
        let html = match self.fetch_html(path).await {
            Ok(html) => html,
            Err(ScrapeError::NotFound { url }) => {
                tracing::debug!("{} not found (404), skipping", url);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        Ok(ids.iter().find_map(|id| locate_table(&html, dataset, Some(id))))
    }

    /// Every game of the season from the monthly schedule pages, falling
    /// back to the single season page when no month exists.
    pub async fn games(&self, normalizer: &TableNormalizer) -> Result<RawTable, ScrapeError> {
        let year = normalizer.context().season.year();
        tracing::info!("Loading games for season {}...", year);

        let mut frames = Vec::new();
        for month in SCHEDULE_MONTHS {
            let path = format!("/leagues/NBA_{}_games-{}.html", year, month);
            match self.page_table(&path, GAMES, &["schedule"]).await {
                Ok(Some(table)) if !table.is_empty() => {
                    tracing::info!("  {}: {} games", month, table.len());
                    frames.push(normalizer.normalize(table));
                }
                Ok(_) => tracing::debug!("No games for month={}, skipping", month),
                Err(e) => tracing::warn!("schedule {} failed, continuing without it: {}", month, e),
            }
        }

        if frames.is_empty() {
            tracing::info!("No monthly schedule pages found, trying main schedule page...");
            let path = format!("/leagues/NBA_{}_games.html", year);
            return match self.page_table(&path, GAMES, &["schedule"]).await? {
                Some(table) if !table.is_empty() => {
                    tracing::info!("  main: {} games", table.len());
                    Ok(normalizer.normalize(table))
                }
                _ => Ok(RawTable::empty(GAMES)),
            };
        }

        let mut out = RawTable::concat(GAMES, frames);
        let key: &[&str] = if out.has_column("visitor_neutral") {
            &["date", "visitor_neutral", "home_neutral"]
        } else {
            &["date"]
        };
        if key.iter().all(|c| out.has_column(c)) {
            let removed = out.dedupe_by(key);
            if removed > 0 {
                tracing::debug!("Dropped {} duplicate game rows", removed);
            }
        }
        tracing::info!("Games total: {} rows", out.len());
        Ok(out)
    }

    /// Season totals, one row per player and team stint.
    pub async fn player_season_totals(
        &self,
        normalizer: &TableNormalizer,
    ) -> Result<RawTable, ScrapeError> {
        let year = normalizer.context().season.year();
        tracing::info!("Loading player season totals for season {}...", year);
        let path = format!("/leagues/NBA_{}_totals.html", year);
        match self
            .page_table(&path, PLAYER_SEASON_TOTALS, &["totals_stats", "totals"])
            .await?
        {
            Some(table) if !table.is_empty() => {
                tracing::info!("  {}: {} rows", PLAYER_SEASON_TOTALS, table.len());
                Ok(normalizer.normalize(table))
            }
            _ => {
                tracing::warn!("No player totals returned");
                Ok(RawTable::empty(PLAYER_SEASON_TOTALS))
            }
        }
    }

    /// Rosters of every franchise, tagged with the franchise code. A team
    /// whose page fails is left out.
    pub async fn rosters(&self, normalizer: &TableNormalizer) -> Result<RawTable, ScrapeError> {
        let year = normalizer.context().season.year();
        let total = TEAM_ABBREVIATIONS.len();
        tracing::info!("Loading rosters for season {} ({} teams)...", year, total);

        let mut frames = Vec::new();
        for (i, abbrev) in TEAM_ABBREVIATIONS.iter().enumerate() {
            let path = format!("/teams/{}/{}.html", abbrev, year);
            match self.page_table(&path, ROSTER, &["roster"]).await {
                Ok(Some(table)) if !table.is_empty() => {
                    let mut table = normalizer.normalize(table);
                    table.set_column(TEAM_ABBREV_COLUMN, Value::from(*abbrev));
                    tracing::info!("  {}: {} players ({}/{})", abbrev, table.len(), i + 1, total);
                    frames.push(table);
                }
                Ok(_) => tracing::debug!("  {}: no roster", abbrev),
                Err(e) => tracing::warn!("roster {} failed, continuing without it: {}", abbrev, e),
            }
        }
        if frames.is_empty() {
            tracing::warn!("No roster data returned");
        }
        let out = RawTable::concat(ROSTER, frames);
        tracing::info!("  roster total: {} rows", out.len());
        Ok(out)
    }

    /// Scrapes all three tables for one season.
    pub async fn scrape_season(&self, context: SeasonContext) -> Result<Tables, ScrapeError> {
        let normalizer = TableNormalizer::new(context);
        let mut tables = Tables::new();
        tables.insert(GAMES.to_string(), self.games(&normalizer).await?);
        tables.insert(
            PLAYER_SEASON_TOTALS.to_string(),
            self.player_season_totals(&normalizer).await?,
        );
        tables.insert(ROSTER.to_string(), self.rosters(&normalizer).await?);
        tracing::info!(
            "Raw fetch complete: games={}, player_season_totals={}, roster={}",
            tables[GAMES].len(),
            tables[PLAYER_SEASON_TOTALS].len(),
            tables[ROSTER].len()
        );
        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_terminal() {
        let nf = ScrapeError::NotFound { url: "x".into() };
        assert!(!nf.is_retryable());
        assert_eq!(nf.retry_after(), None);
    }

    #[test]
    fn throttling_statuses_retry() {
        let err = ScrapeError::HttpStatus {
            status: StatusCode::TOO_MANY_REQUESTS,
            retry_after: Some("5".into()),
        };
        assert!(err.is_retryable());
        assert_eq!(err.retry_after(), Some("5"));

        let forbidden = ScrapeError::HttpStatus {
            status: StatusCode::FORBIDDEN,
            retry_after: None,
        };
        assert!(!forbidden.is_retryable());
    }

    #[test]
    fn thirty_distinct_franchises() {
        let mut codes = TEAM_ABBREVIATIONS.to_vec();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), 30);
    }
}
