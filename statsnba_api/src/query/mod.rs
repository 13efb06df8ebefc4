mod common;
pub use self::common::{Query, LEAGUE_ID_NBA};

mod game;
pub use self::game::{BoxScoreParams, PlayByPlayParams, ScoreboardParams, ShotChartParams};

mod league;
pub use self::league::{
    CommonAllPlayersParams, CommonPlayoffSeriesParams, CommonTeamYearsParams, DraftHistoryParams,
    LeagueGameLogParams,
};

mod lineups;
pub use self::lineups::{LeagueDashLineupsParams, TeamDashLineupsParams};

mod team;
pub use self::team::{CommonPlayerInfoParams, CommonTeamRosterParams};

mod params;
pub use self::params::Params;
