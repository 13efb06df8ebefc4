//! Seasons, season labels and `--season` / `--start-season` / `--end-season` resolution.

use std::fmt;
use std::str::FromStr;

pub use statsnba_api::types::SeasonType;

/// Earliest season the stats API has data for (1946-47).
const FIRST_SEASON: u16 = 1947;
const LAST_SEASON: u16 = 2100;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SeasonError {
    #[error("invalid season {0:?}: expected a year such as 2026")]
    Invalid(String),
    #[error("season {0} is outside 1947..=2100")]
    OutOfRange(u16),
    #[error("start-season ({start}) must be <= end-season ({end})")]
    InvertedRange { start: u16, end: u16 },
}

/// One competition year, identified by the year it ends in (2026 is 2025-26).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Season(u16);

impl Season {
    pub fn new(year: u16) -> Result<Self, SeasonError> {
        if !(FIRST_SEASON..=LAST_SEASON).contains(&year) {
            return Err(SeasonError::OutOfRange(year));
        }
        Ok(Self(year))
    }

    pub fn year(&self) -> u16 {
        self.0
    }

    /// The API's label for the season: 2026 becomes `2025-26`.
    pub fn label(&self) -> String {
        format!("{}-{:02}", self.0 - 1, self.0 % 100)
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Season {
    type Err = SeasonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let year: u16 = s
            .trim()
            .parse()
            .map_err(|_| SeasonError::Invalid(s.to_string()))?;
        Season::new(year)
    }
}

/// The season being loaded together with its competition phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SeasonContext {
    pub season: Season,
    pub season_type: SeasonType,
}

impl SeasonContext {
    pub fn new(season: Season, season_type: SeasonType) -> Self {
        Self {
            season,
            season_type,
        }
    }

    pub fn season_id(&self) -> String {
        self.season.to_string()
    }

    pub fn season_label(&self) -> String {
        self.season.label()
    }
}

impl fmt::Display for SeasonContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.season.label(), self.season_type)
    }
}

/// Resolves season arguments into an ordered, inclusive list of seasons.
///
/// With neither bound set the single `season` is returned. With one bound
/// set the other defaults to `season`.
pub fn resolve_seasons(
    season: Season,
    start: Option<Season>,
    end: Option<Season>,
) -> Result<Vec<Season>, SeasonError> {
    if start.is_none() && end.is_none() {
        return Ok(vec![season]);
    }
    let start = start.unwrap_or(season);
    let end = end.unwrap_or(season);
    if start > end {
        return Err(SeasonError::InvertedRange {
            start: start.year(),
            end: end.year(),
        });
    }
    (start.year()..=end.year()).map(Season::new).collect()
}
