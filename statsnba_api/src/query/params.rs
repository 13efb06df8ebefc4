//! [`Params`]: one typed value per endpoint, usable wherever any query is.

use crate::types::Endpoint;

use super::{
    BoxScoreParams, CommonAllPlayersParams, CommonPlayerInfoParams, CommonPlayoffSeriesParams,
    CommonTeamRosterParams, CommonTeamYearsParams, DraftHistoryParams, LeagueDashLineupsParams,
    LeagueGameLogParams, PlayByPlayParams, Query, ScoreboardParams, ShotChartParams,
    TeamDashLineupsParams,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Params {
    LeagueGameLog(LeagueGameLogParams),
    CommonAllPlayers(CommonAllPlayersParams),
    CommonTeamRoster(CommonTeamRosterParams),
    Scoreboard(ScoreboardParams),
    CommonTeamYears(CommonTeamYearsParams),
    DraftHistory(DraftHistoryParams),
    CommonPlayoffSeries(CommonPlayoffSeriesParams),
    LeagueDashLineups(LeagueDashLineupsParams),
    TeamDashLineups(TeamDashLineupsParams),
    BoxScore(BoxScoreParams),
    PlayByPlay(PlayByPlayParams),
    ShotChart(ShotChartParams),
    CommonPlayerInfo(CommonPlayerInfoParams),
}

impl Params {
    fn as_query(&self) -> &dyn Query {
        match self {
            Params::LeagueGameLog(p) => p,
            Params::CommonAllPlayers(p) => p,
            Params::CommonTeamRoster(p) => p,
            Params::Scoreboard(p) => p,
            Params::CommonTeamYears(p) => p,
            Params::DraftHistory(p) => p,
            Params::CommonPlayoffSeries(p) => p,
            Params::LeagueDashLineups(p) => p,
            Params::TeamDashLineups(p) => p,
            Params::BoxScore(p) => p,
            Params::PlayByPlay(p) => p,
            Params::ShotChart(p) => p,
            Params::CommonPlayerInfo(p) => p,
        }
    }
}

impl Query for Params {
    fn endpoint(&self) -> Endpoint {
        self.as_query().endpoint()
    }

    fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        self.as_query().to_query_pairs()
    }
}

macro_rules! impl_from_params {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Params {
                fn from(p: $ty) -> Self {
                    Params::$variant(p)
                }
            }
        )*
    };
}

impl_from_params! {
    LeagueGameLog => LeagueGameLogParams,
    CommonAllPlayers => CommonAllPlayersParams,
    CommonTeamRoster => CommonTeamRosterParams,
    Scoreboard => ScoreboardParams,
    CommonTeamYears => CommonTeamYearsParams,
    DraftHistory => DraftHistoryParams,
    CommonPlayoffSeries => CommonPlayoffSeriesParams,
    LeagueDashLineups => LeagueDashLineupsParams,
    TeamDashLineups => TeamDashLineupsParams,
    BoxScore => BoxScoreParams,
    PlayByPlay => PlayByPlayParams,
    ShotChart => ShotChartParams,
    CommonPlayerInfo => CommonPlayerInfoParams,
}
