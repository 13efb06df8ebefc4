//! League-wide queries: game logs, player index and reference tables.

use crate::types::{Endpoint, PlayerOrTeam, SeasonType};
use crate::Error;

use super::common::{validate_season_label, Query, LEAGUE_ID_NBA};

/// Parameters for `leaguegamelog`: every game of a season, per team or per player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeagueGameLogParams {
    season: String,
    season_type: SeasonType,
    player_or_team: PlayerOrTeam,
}

impl LeagueGameLogParams {
    pub fn new(
        season_label: &str,
        season_type: SeasonType,
        player_or_team: PlayerOrTeam,
    ) -> Result<Self, Error> {
        Ok(Self {
            season: validate_season_label(season_label)?,
            season_type,
            player_or_team,
        })
    }
}

impl Query for LeagueGameLogParams {
    fn endpoint(&self) -> Endpoint {
        Endpoint::LeagueGameLog
    }

    fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Counter", "1000".to_string()),
            ("Direction", "DESC".to_string()),
            ("LeagueID", LEAGUE_ID_NBA.to_string()),
            ("PlayerOrTeam", self.player_or_team.as_str().to_string()),
            ("Season", self.season.clone()),
            ("SeasonType", self.season_type.to_string()),
            ("Sorter", "DATE".to_string()),
        ]
    }
}

/// Parameters for `commonallplayers`: the player index for one season.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommonAllPlayersParams {
    season: String,
    only_current_season: bool,
}

impl CommonAllPlayersParams {
    pub fn new(season_label: &str) -> Result<Self, Error> {
        Ok(Self {
            season: validate_season_label(season_label)?,
            only_current_season: true,
        })
    }

    pub fn with_only_current_season(mut self, only_current_season: bool) -> Self {
        self.only_current_season = only_current_season;
        self
    }
}

impl Query for CommonAllPlayersParams {
    fn endpoint(&self) -> Endpoint {
        Endpoint::CommonAllPlayers
    }

    fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("LeagueID", LEAGUE_ID_NBA.to_string()),
            ("Season", self.season.clone()),
            (
                "IsOnlyCurrentSeason",
                if self.only_current_season { "1" } else { "0" }.to_string(),
            ),
        ]
    }
}

/// Parameters for `commonteamyears`: every franchise and its active years.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommonTeamYearsParams;

impl Query for CommonTeamYearsParams {
    fn endpoint(&self) -> Endpoint {
        Endpoint::CommonTeamYears
    }

    fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![("LeagueID", LEAGUE_ID_NBA.to_string())]
    }
}

/// Parameters for `drafthistory`: the full draft history of the league.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DraftHistoryParams;

impl Query for DraftHistoryParams {
    fn endpoint(&self) -> Endpoint {
        Endpoint::DraftHistory
    }

    fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![("LeagueID", LEAGUE_ID_NBA.to_string())]
    }
}

/// Parameters for `commonplayoffseries`: playoff series for one season.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommonPlayoffSeriesParams {
    season: String,
}

impl CommonPlayoffSeriesParams {
    pub fn new(season_label: &str) -> Result<Self, Error> {
        Ok(Self {
            season: validate_season_label(season_label)?,
        })
    }
}

impl Query for CommonPlayoffSeriesParams {
    fn endpoint(&self) -> Endpoint {
        Endpoint::CommonPlayoffSeries
    }

    fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("LeagueID", LEAGUE_ID_NBA.to_string()),
            ("Season", self.season.clone()),
        ]
    }
}
