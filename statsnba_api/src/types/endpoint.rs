use std::fmt;

/// Stats API endpoint paths, relative to the `/stats` base.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    LeagueGameLog,
    CommonAllPlayers,
    CommonTeamRoster,
    Scoreboard,
    CommonTeamYears,
    DraftHistory,
    CommonPlayoffSeries,
    LeagueDashLineups,
    TeamDashLineups,
    BoxScoreSummary,
    BoxScoreAdvanced,
    BoxScoreTraditional,
    PlayByPlay,
    ShotChart,
    CommonPlayerInfo,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::LeagueGameLog => "leaguegamelog",
            Endpoint::CommonAllPlayers => "commonallplayers",
            Endpoint::CommonTeamRoster => "commonteamroster",
            Endpoint::Scoreboard => "scoreboardv2",
            Endpoint::CommonTeamYears => "commonteamyears",
            Endpoint::DraftHistory => "drafthistory",
            Endpoint::CommonPlayoffSeries => "commonplayoffseries",
            Endpoint::LeagueDashLineups => "leaguedashlineups",
            Endpoint::TeamDashLineups => "teamdashlineups",
            Endpoint::BoxScoreSummary => "boxscoresummaryv2",
            Endpoint::BoxScoreAdvanced => "boxscoreadvancedv2",
            Endpoint::BoxScoreTraditional => "boxscoretraditionalv2",
            Endpoint::PlayByPlay => "playbyplayv2",
            Endpoint::ShotChart => "shotchartdetail",
            Endpoint::CommonPlayerInfo => "commonplayerinfo",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names of the result sets selected out of multi-table responses.
///
/// Endpoints not listed here are read positionally (index 0).
pub struct ResultSetName;

impl ResultSetName {
    pub const COMMON_ALL_PLAYERS: &'static str = "CommonAllPlayers";
    pub const COMMON_TEAM_ROSTER: &'static str = "CommonTeamRoster";
    pub const GAME_HEADER: &'static str = "GameHeader";
    pub const GAME_SUMMARY: &'static str = "GameSummary";
    pub const COMMON_PLAYER_INFO: &'static str = "CommonPlayerInfo";
}
