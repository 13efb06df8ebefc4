use crate::types::Endpoint;
use crate::Error;

use super::common::{validate_numeric_id, validate_season_label, Query, LEAGUE_ID_NBA};

/// Parameters for `commonteamroster`: one team's roster in one season.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommonTeamRosterParams {
    season: String,
    team_id: String,
}

impl CommonTeamRosterParams {
    pub fn new(season_label: &str, team_id: &str) -> Result<Self, Error> {
        Ok(Self {
            season: validate_season_label(season_label)?,
            team_id: validate_numeric_id("TeamID", team_id)?,
        })
    }
}

impl Query for CommonTeamRosterParams {
    fn endpoint(&self) -> Endpoint {
        Endpoint::CommonTeamRoster
    }

    fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("LeagueID", LEAGUE_ID_NBA.to_string()),
            ("Season", self.season.clone()),
            ("TeamID", self.team_id.clone()),
        ]
    }
}

/// Parameters for `commonplayerinfo`: biographical data for one player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommonPlayerInfoParams {
    player_id: String,
}

impl CommonPlayerInfoParams {
    pub fn new(player_id: &str) -> Result<Self, Error> {
        Ok(Self {
            player_id: validate_numeric_id("PlayerID", player_id)?,
        })
    }
}

impl Query for CommonPlayerInfoParams {
    fn endpoint(&self) -> Endpoint {
        Endpoint::CommonPlayerInfo
    }

    fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("LeagueID", LEAGUE_ID_NBA.to_string()),
            ("PlayerID", self.player_id.clone()),
        ]
    }
}
