use chrono::NaiveDate;
use statsnba_api::types::{Endpoint, PlayerOrTeam, SeasonType};
use statsnba_api::{
    BoxScoreParams, CommonAllPlayersParams, CommonPlayerInfoParams, CommonTeamRosterParams,
    Error, LeagueGameLogParams, Params, Query, ScoreboardParams, ShotChartParams,
    TeamDashLineupsParams,
};
use url::Url;

fn pairs(q: &dyn Query) -> Vec<(String, String)> {
    q.to_query_pairs()
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

fn get(q: &dyn Query, key: &str) -> Option<String> {
    pairs(q).into_iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

#[test]
fn league_game_log_pairs() {
    let q = LeagueGameLogParams::new("2025-26", SeasonType::RegularSeason, PlayerOrTeam::Team)
        .unwrap();
    assert_eq!(q.endpoint(), Endpoint::LeagueGameLog);
    assert_eq!(get(&q, "Season").as_deref(), Some("2025-26"));
    assert_eq!(get(&q, "SeasonType").as_deref(), Some("Regular Season"));
    assert_eq!(get(&q, "PlayerOrTeam").as_deref(), Some("T"));
    assert_eq!(get(&q, "LeagueID").as_deref(), Some("00"));
    assert_eq!(get(&q, "Counter").as_deref(), Some("1000"));
}

#[test]
fn invalid_season_label_fails_at_construction() {
    let err = LeagueGameLogParams::new("2026", SeasonType::RegularSeason, PlayerOrTeam::Team)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidParam { name: "Season", .. }));
    assert!(CommonAllPlayersParams::new("2025/26").is_err());
}

#[test]
fn invalid_ids_fail_at_construction() {
    assert!(CommonTeamRosterParams::new("2025-26", "BOS").is_err());
    assert!(CommonPlayerInfoParams::new("").is_err());
    assert!(BoxScoreParams::summary("game-1").is_err());
    assert!(ShotChartParams::new("2025-26", SeasonType::Playoffs, "0042500101", "x").is_err());
    assert!(TeamDashLineupsParams::new("2025-26", SeasonType::Playoffs, "1.5").is_err());
}

#[test]
fn box_score_constructors_pick_endpoint() {
    assert_eq!(
        BoxScoreParams::summary("0022500001").unwrap().endpoint(),
        Endpoint::BoxScoreSummary
    );
    assert_eq!(
        BoxScoreParams::advanced("0022500001").unwrap().endpoint(),
        Endpoint::BoxScoreAdvanced
    );
    assert_eq!(
        BoxScoreParams::traditional("22500001").unwrap().game_id(),
        "0022500001"
    );
}

#[test]
fn scoreboard_formats_date() {
    let q = ScoreboardParams::new(NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
    assert_eq!(get(&q, "GameDate").as_deref(), Some("01/05/2026"));
    assert_eq!(get(&q, "DayOffset").as_deref(), Some("0"));
}

#[test]
fn params_enum_delegates() {
    let p: Params = CommonTeamRosterParams::new("2025-26", "1610612738")
        .unwrap()
        .into();
    assert_eq!(p.endpoint(), Endpoint::CommonTeamRoster);
    assert_eq!(get(&p, "TeamID").as_deref(), Some("1610612738"));
}

#[test]
fn add_to_url_encodes_pairs() {
    let q = LeagueGameLogParams::new("2025-26", SeasonType::PreSeason, PlayerOrTeam::Player)
        .unwrap();
    let url = q.add_to_url(&Url::parse("https://stats.nba.com/stats/leaguegamelog").unwrap());
    let query = url.query().unwrap();
    assert!(query.contains("SeasonType=Pre+Season"));
    assert!(query.contains("PlayerOrTeam=P"));
}
