use crate::types::{Endpoint, SeasonType};
use crate::Error;

use super::common::{validate_numeric_id, validate_season_label, Query, LEAGUE_ID_NBA};

/// Parameters for `leaguedashlineups`: five-man lineup totals league-wide.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeagueDashLineupsParams {
    season: String,
    season_type: SeasonType,
}

impl LeagueDashLineupsParams {
    pub fn new(season_label: &str, season_type: SeasonType) -> Result<Self, Error> {
        Ok(Self {
            season: validate_season_label(season_label)?,
            season_type,
        })
    }
}

impl Query for LeagueDashLineupsParams {
    fn endpoint(&self) -> Endpoint {
        Endpoint::LeagueDashLineups
    }

    fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("LeagueID", LEAGUE_ID_NBA.to_string()),
            ("Season", self.season.clone()),
            ("SeasonType", self.season_type.to_string()),
            ("GroupQuantity", "5".to_string()),
            ("PerMode", "Totals".to_string()),
            ("MeasureType", "Base".to_string()),
        ]
    }
}

/// Parameters for `teamdashlineups`: one team's five-man lineups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TeamDashLineupsParams {
    season: String,
    season_type: SeasonType,
    team_id: String,
}

impl TeamDashLineupsParams {
    pub fn new(season_label: &str, season_type: SeasonType, team_id: &str) -> Result<Self, Error> {
        Ok(Self {
            season: validate_season_label(season_label)?,
            season_type,
            team_id: validate_numeric_id("TeamID", team_id)?,
        })
    }
}

impl Query for TeamDashLineupsParams {
    fn endpoint(&self) -> Endpoint {
        Endpoint::TeamDashLineups
    }

    fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("LeagueID", LEAGUE_ID_NBA.to_string()),
            ("Season", self.season.clone()),
            ("SeasonType", self.season_type.to_string()),
            ("TeamID", self.team_id.clone()),
            ("GroupQuantity", "5".to_string()),
        ]
    }
}
