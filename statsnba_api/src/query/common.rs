//! Shared query infrastructure: the [`Query`] trait and parameter validation.

use chrono::NaiveDate;
use url::Url;

use crate::types::Endpoint;
use crate::Error;

/// League identifier for the NBA.
pub const LEAGUE_ID_NBA: &str = "00";

/// Trait implemented by every endpoint parameter struct. Parameters are
/// validated when the struct is built, so serialization cannot fail.
/// Queries are shared across tasks, so implementors must be thread-safe.
pub trait Query: Send + Sync {
    /// The endpoint these parameters belong to.
    fn endpoint(&self) -> Endpoint;

    /// The flat, string-keyed wire parameters, in a stable order.
    fn to_query_pairs(&self) -> Vec<(&'static str, String)>;

    /// Appends this query's parameters to the given URL, returning the modified URL.
    fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in self.to_query_pairs() {
                pairs.append_pair(key, &value);
            }
        }
        url
    }
}

/// Season labels look like `2025-26`, with the second part following the first.
pub(crate) fn validate_season_label(label: &str) -> Result<String, Error> {
    let invalid = |reason: &str| Error::InvalidParam {
        name: "Season",
        reason: format!("{} ({:?})", reason, label),
    };
    let (start, end) = label
        .split_once('-')
        .ok_or_else(|| invalid("expected YYYY-YY"))?;
    if start.len() != 4 || end.len() != 2 {
        return Err(invalid("expected YYYY-YY"));
    }
    let start: u32 = start.parse().map_err(|_| invalid("non-numeric year"))?;
    let end: u32 = end.parse().map_err(|_| invalid("non-numeric year"))?;
    if (start + 1) % 100 != end {
        return Err(invalid("years are not consecutive"));
    }
    Ok(label.to_string())
}

/// Team, player and person ids are positive integers on the wire.
pub(crate) fn validate_numeric_id(name: &'static str, value: &str) -> Result<String, Error> {
    let value = value.trim();
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidParam {
            name,
            reason: format!("expected a numeric id, got {:?}", value),
        });
    }
    Ok(value.to_string())
}

/// Game ids are ten-digit strings (`0022500001`). Numeric ids that lost their
/// leading zeros on the way through a JSON number are padded back.
pub(crate) fn validate_game_id(value: &str) -> Result<String, Error> {
    let value = validate_numeric_id("GameID", value)?;
    if value.len() > 10 {
        return Err(Error::InvalidParam {
            name: "GameID",
            reason: format!("expected at most 10 digits, got {:?}", value),
        });
    }
    Ok(format!("{:0>10}", value))
}

/// Formats a calendar date the way the scoreboard expects it (`MM/DD/YYYY`).
pub(crate) fn format_game_date(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}
