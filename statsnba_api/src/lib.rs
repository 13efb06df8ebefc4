mod client;
mod errors;
mod query;
pub mod types;
mod user_agent;
pub use self::client::{Client, DEFAULT_BASE_URL};
pub use self::errors::{Error, RETRY_STATUS_CODES};
pub use self::query::{
    BoxScoreParams, CommonAllPlayersParams, CommonPlayerInfoParams, CommonPlayoffSeriesParams,
    CommonTeamRosterParams, CommonTeamYearsParams, DraftHistoryParams, LeagueDashLineupsParams,
    LeagueGameLogParams, Params, PlayByPlayParams, Query, ScoreboardParams, ShotChartParams,
    TeamDashLineupsParams, LEAGUE_ID_NBA,
};
