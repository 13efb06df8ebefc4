use std::time::Duration;

use statsnba_api::types::{PlayerOrTeam, ResultSelector, ResultSet, ResultSetName, SeasonType};
use statsnba_api::{BoxScoreParams, Client, Error, LeagueGameLogParams};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
}

fn client_for(server: &MockServer) -> Client {
    Client::with_base_url(&server.uri(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn get_league_game_log_success() {
    let mock_server = MockServer::start().await;
    let body = load_fixture("leaguegamelog_team.json");

    Mock::given(method("GET"))
        .and(path("/leaguegamelog"))
        .and(query_param("PlayerOrTeam", "T"))
        .and(query_param("Season", "2025-26"))
        .and(query_param("SeasonType", "Regular Season"))
        .respond_with(ResponseTemplate::new(200).set_body_string(&body))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let params =
        LeagueGameLogParams::new("2025-26", SeasonType::RegularSeason, PlayerOrTeam::Team).unwrap();
    let payload = client.get_json(&params).await.unwrap();

    let rs = ResultSet::select(&payload, &ResultSelector::default()).unwrap();
    assert_eq!(rs.rows.len(), 4);
    assert_eq!(rs.headers[2], "TEAM_ABBREVIATION");
}

#[tokio::test]
async fn named_result_set_from_box_score() {
    let mock_server = MockServer::start().await;
    let body = load_fixture("boxscoresummary.json");

    Mock::given(method("GET"))
        .and(path("/boxscoresummaryv2"))
        .and(query_param("GameID", "0022500001"))
        .respond_with(ResponseTemplate::new(200).set_body_string(&body))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let params = BoxScoreParams::summary("0022500001").unwrap();
    let payload = client.get_json(&params).await.unwrap();

    let rs = ResultSet::select(&payload, &ResultSelector::Name(ResultSetName::GAME_SUMMARY)).unwrap();
    assert_eq!(rs.rows.len(), 1);
    assert!(rs.headers.contains(&"HOME_TEAM_ID".to_string()));
}

#[tokio::test]
async fn server_error_carries_status_and_retry_after() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/leaguegamelog"))
        .respond_with(
            ResponseTemplate::new(503)
                .insert_header("Retry-After", "12")
                .set_body_string("Service Unavailable"),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let params =
        LeagueGameLogParams::new("2025-26", SeasonType::Playoffs, PlayerOrTeam::Player).unwrap();
    let err = client.get_json(&params).await.unwrap_err();

    match &err {
        Error::HttpStatus { status, body, .. } => {
            assert_eq!(*status, 503);
            assert_eq!(body, "Service Unavailable");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.retry_after(), Some("12"));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn not_found_is_not_retryable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/boxscoresummaryv2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let params = BoxScoreParams::summary("0022500001").unwrap();
    let err = client.get_json(&params).await.unwrap_err();
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn malformed_json_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/leaguegamelog"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not valid json}"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let params =
        LeagueGameLogParams::new("2025-26", SeasonType::RegularSeason, PlayerOrTeam::Team).unwrap();
    let err = client.get_json(&params).await.unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn slow_response_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/leaguegamelog"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("{}")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let client = Client::with_base_url(&mock_server.uri(), Duration::from_millis(50)).unwrap();
    let params =
        LeagueGameLogParams::new("2025-26", SeasonType::RegularSeason, PlayerOrTeam::Team).unwrap();
    let err = client.get_json(&params).await.unwrap_err();
    assert!(matches!(err, Error::Timeout));
    assert!(err.is_retryable());
}

fn assert_send<T: Send>(_: &T) {}

#[test]
fn request_future_can_move_between_threads() {
    let client = Client::with_base_url("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
    let params = statsnba_api::Params::from(BoxScoreParams::summary("0022500001").unwrap());
    let fut = client.get_json(&params);
    assert_send(&fut);
}
