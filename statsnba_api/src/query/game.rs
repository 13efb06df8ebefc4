//! Per-game queries: scoreboard, box scores, play-by-play and shot charts.

use chrono::NaiveDate;

use crate::types::{Endpoint, SeasonType};
use crate::Error;

use super::common::{
    format_game_date, validate_game_id, validate_numeric_id, validate_season_label, Query,
    LEAGUE_ID_NBA,
};

/// Parameters for `scoreboardv2`: all games on one calendar date.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreboardParams {
    game_date: NaiveDate,
    day_offset: i32,
}

impl ScoreboardParams {
    pub fn new(game_date: NaiveDate) -> Self {
        Self {
            game_date,
            day_offset: 0,
        }
    }
}

impl Query for ScoreboardParams {
    fn endpoint(&self) -> Endpoint {
        Endpoint::Scoreboard
    }

    fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("LeagueID", LEAGUE_ID_NBA.to_string()),
            ("GameDate", format_game_date(self.game_date)),
            ("DayOffset", self.day_offset.to_string()),
        ]
    }
}

/// Parameters shared by the three box score endpoints. The endpoint is picked
/// by the constructor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoxScoreParams {
    endpoint: Endpoint,
    game_id: String,
}

impl BoxScoreParams {
    pub fn summary(game_id: &str) -> Result<Self, Error> {
        Self::build(Endpoint::BoxScoreSummary, game_id)
    }

    pub fn advanced(game_id: &str) -> Result<Self, Error> {
        Self::build(Endpoint::BoxScoreAdvanced, game_id)
    }

    pub fn traditional(game_id: &str) -> Result<Self, Error> {
        Self::build(Endpoint::BoxScoreTraditional, game_id)
    }

    fn build(endpoint: Endpoint, game_id: &str) -> Result<Self, Error> {
        Ok(Self {
            endpoint,
            game_id: validate_game_id(game_id)?,
        })
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }
}

impl Query for BoxScoreParams {
    fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("GameID", self.game_id.clone()),
            ("StartPeriod", "0".to_string()),
            ("EndPeriod", "14".to_string()),
            ("StartRange", "0".to_string()),
            ("EndRange", "2147483647".to_string()),
            ("RangeType", "0".to_string()),
        ]
    }
}

/// Parameters for `playbyplayv2`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayByPlayParams {
    game_id: String,
}

impl PlayByPlayParams {
    pub fn new(game_id: &str) -> Result<Self, Error> {
        Ok(Self {
            game_id: validate_game_id(game_id)?,
        })
    }
}

impl Query for PlayByPlayParams {
    fn endpoint(&self) -> Endpoint {
        Endpoint::PlayByPlay
    }

    fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("GameID", self.game_id.clone()),
            ("StartPeriod", "0".to_string()),
            ("EndPeriod", "14".to_string()),
        ]
    }
}

/// Parameters for `shotchartdetail`: one team's shots in one game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShotChartParams {
    season: String,
    season_type: SeasonType,
    game_id: String,
    team_id: String,
}

impl ShotChartParams {
    pub fn new(
        season_label: &str,
        season_type: SeasonType,
        game_id: &str,
        team_id: &str,
    ) -> Result<Self, Error> {
        Ok(Self {
            season: validate_season_label(season_label)?,
            season_type,
            game_id: validate_game_id(game_id)?,
            team_id: validate_numeric_id("TeamID", team_id)?,
        })
    }
}

impl Query for ShotChartParams {
    fn endpoint(&self) -> Endpoint {
        Endpoint::ShotChart
    }

    fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("LeagueID", LEAGUE_ID_NBA.to_string()),
            ("Season", self.season.clone()),
            ("SeasonType", self.season_type.to_string()),
            ("GameID", self.game_id.clone()),
            ("TeamID", self.team_id.clone()),
        ]
    }
}
