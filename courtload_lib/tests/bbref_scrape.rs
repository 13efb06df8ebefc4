use courtload_lib::bbref::{GAMES, PLAYER_SEASON_TOTALS, ROSTER};
use courtload_lib::runner::run_scrape_with;
use courtload_lib::{Db, LoadConfig, RetryPolicy, ScrapeClient, Season, SeasonContext, SeasonType};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ctx() -> SeasonContext {
    SeasonContext::new(Season::new(2026).unwrap(), SeasonType::RegularSeason)
}

fn schedule_page(rows: &[(&str, &str, i64, &str, i64)]) -> String {
    let body: String = rows
        .iter()
        .map(|(date, visitor, vpts, home, hpts)| {
            format!(
                "<tr><th>{date}</th><td>7:30p</td><td>{visitor}</td><td>{vpts}</td><td>{home}</td><td>{hpts}</td></tr>"
            )
        })
        .collect();
    format!(
        r#"<html><body><table id="schedule">
<thead><tr><th>Date</th><th>Start (ET)</th><th>Visitor/Neutral</th><th>PTS</th><th>Home/Neutral</th><th>PTS</th></tr></thead>
<tbody>{body}</tbody></table></body></html>"#
    )
}

const TOTALS_PAGE: &str = r#"<html><body><div id="all_totals_stats"><!--
<table id="totals_stats">
<thead><tr><th>Rk</th><th>Player</th><th>Team</th><th>PTS</th></tr></thead>
<tbody>
<tr><th>1</th><td>Jayson Tatum</td><td>BOS</td><td>2,041</td></tr>
<tr class="thead"><th>Rk</th><th>Player</th><th>Team</th><th>PTS</th></tr>
<tr><th>2</th><td>Jalen Brunson</td><td>NYK</td><td>1,990</td></tr>
</tbody></table>
--></div></body></html>"#;

const ROSTER_PAGE: &str = r#"<html><body><table id="roster">
<thead><tr><th>No.</th><th>Player</th><th>Pos</th></tr></thead>
<tbody><tr><th>0</th><td>Jayson Tatum</td><td>F</td></tr>
<tr><th>7</th><td>Jaylen Brown</td><td>G</td></tr></tbody></table></body></html>"#;

async fn page(server: &MockServer, at: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

async fn site() -> MockServer {
    let server = MockServer::start().await;
    page(&server, "/", 200, "<html></html>").await;
    page(
        &server,
        "/leagues/NBA_2026_games-october.html",
        200,
        &schedule_page(&[
            ("Tue, Oct 21, 2025", "New York Knicks", 109, "Boston Celtics", 117),
            ("Wed, Oct 22, 2025", "Golden State Warriors", 119, "Los Angeles Lakers", 109),
        ]),
    )
    .await;
    page(
        &server,
        "/leagues/NBA_2026_games-november.html",
        200,
        &schedule_page(&[
            ("Wed, Oct 22, 2025", "Golden State Warriors", 119, "Los Angeles Lakers", 109),
            ("Sat, Nov 1, 2025", "Boston Celtics", 101, "New York Knicks", 99),
        ]),
    )
    .await;
    page(&server, "/teams/BOS/2026.html", 200, ROSTER_PAGE).await;
    server
}

fn client(server: &MockServer) -> ScrapeClient {
    ScrapeClient::with_base_url(&server.uri(), RetryPolicy::immediate(1)).unwrap()
}

#[tokio::test]
async fn monthly_pages_merge_and_dedupe() {
    let server = site().await;
    let client = client(&server);
    let games = client
        .games(&courtload_lib::TableNormalizer::new(ctx()))
        .await
        .unwrap();

    assert_eq!(games.len(), 3, "overlapping month row dropped");
    assert_eq!(
        games.columns[..6],
        ["date", "start_et", "visitor_neutral", "pts", "home_neutral", "pts_1"]
    );
    assert_eq!(games.rows[2][2], json!("Boston Celtics"));
    assert_eq!(games.rows[0][6], json!("2026"));
}

#[tokio::test]
async fn season_page_fallback_when_no_months_exist() {
    let server = MockServer::start().await;
    page(&server, "/", 200, "").await;
    page(
        &server,
        "/leagues/NBA_2026_games.html",
        200,
        &schedule_page(&[("Tue, Oct 21, 2025", "New York Knicks", 109, "Boston Celtics", 117)]),
    )
    .await;

    let games = client(&server)
        .games(&courtload_lib::TableNormalizer::new(ctx()))
        .await
        .unwrap();
    assert_eq!(games.len(), 1);
}

#[tokio::test]
async fn totals_found_in_comment_after_retry() {
    let server = MockServer::start().await;
    page(&server, "/", 200, "").await;
    Mock::given(method("GET"))
        .and(path("/leagues/NBA_2026_totals.html"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    page(&server, "/leagues/NBA_2026_totals.html", 200, TOTALS_PAGE).await;

    let client = client(&server);
    let totals = client
        .player_season_totals(&courtload_lib::TableNormalizer::new(ctx()))
        .await
        .unwrap();
    assert_eq!(totals.len(), 2);
    assert_eq!(totals.rows[0][3], json!(2041));
    assert_eq!(client.tracker().summary().requests_retried, 1);
}

#[tokio::test]
async fn scrape_lands_in_the_warehouse() {
    let server = site().await;
    let client = client(&server);
    let mut db = Db::open_in_memory().unwrap();
    db.init().unwrap();
    let config = LoadConfig::new(
        vec![Season::new(2026).unwrap()],
        SeasonType::RegularSeason,
        ":memory:",
    );

    let reports = run_scrape_with(&config, &client, &mut db).await.unwrap();
    assert_eq!(reports.len(), 1);

    assert_eq!(db.read_table(GAMES).unwrap().len(), 3);
    assert!(!db.table_exists(PLAYER_SEASON_TOTALS).unwrap(), "404 page writes nothing");
    let roster = db.read_table(ROSTER).unwrap();
    assert_eq!(roster.len(), 2);
    assert!(roster.has_column("team_abbrev"));
    assert!(db.last_loaded(&ctx()).unwrap().is_some());

    let warmups = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == "/")
        .count();
    assert_eq!(warmups, 1);
}

#[tokio::test]
async fn dropped_connections_are_retried() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use courtload_lib::Retryable;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            drop(socket);
        }
    });

    let client =
        ScrapeClient::with_base_url(&format!("http://{}", addr), RetryPolicy::immediate(3))
            .unwrap();
    let err = client.fetch_html("/x.html").await.unwrap_err();

    assert!(err.is_retryable(), "{err:?}");
    let summary = client.tracker().summary();
    assert_eq!(summary.requests_retried, 3);
    assert_eq!(summary.requests_failed, 1);
    // warm-up plus four attempts
    assert_eq!(hits.load(Ordering::SeqCst), 5);
}
