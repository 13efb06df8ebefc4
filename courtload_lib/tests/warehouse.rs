use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use courtload_lib::normalize::TableNormalizer;
use courtload_lib::orchestrator::{FetchTask, TableSource, Tables};
use courtload_lib::plan::{PlanOptions, TEAM_GAME_LOGS};
use courtload_lib::{
    run_load_with, ClientError, Db, DbError, LoadConfig, LoadError, RawTable, Season,
    SeasonContext, SeasonType, WriteOutcome,
};
use serde_json::{json, Value};

fn ctx(year: u16) -> SeasonContext {
    SeasonContext::new(Season::new(year).unwrap(), SeasonType::RegularSeason)
}

fn cols(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn memory_db() -> Db {
    let db = Db::open_in_memory().unwrap();
    db.init().unwrap();
    db
}

fn count(db: &Db, sql: &str) -> i64 {
    db.conn().query_row(sql, [], |row| row.get(0)).unwrap()
}

/// Answers only the team game log; every other dataset comes back empty.
struct GameLogOnly;

#[async_trait]
impl TableSource for GameLogOnly {
    async fn fetch(&self, task: &FetchTask) -> Result<RawTable, ClientError> {
        if task.dataset != TEAM_GAME_LOGS {
            return Ok(RawTable::empty(task.dataset.clone()));
        }
        Ok(RawTable::new(
            TEAM_GAME_LOGS,
            cols(&["TEAM_ID", "TEAM_ABBREVIATION", "GAME_ID", "GAME_DATE", "PTS"]),
            vec![
                vec![json!(1610612738), json!("BOS"), json!("0022500001"), json!("2025-10-21"), json!(117)],
                vec![json!(1610612752), json!("NYK"), json!("0022500001"), json!("2025-10-21"), json!(109)],
            ],
        ))
    }
}

fn config(year: u16) -> LoadConfig {
    let mut config = LoadConfig::new(
        vec![Season::new(year).unwrap()],
        SeasonType::RegularSeason,
        ":memory:",
    );
    config.concurrency = 2;
    config.plan = PlanOptions {
        limit: Some(2),
        skip_lineups: true,
    };
    config
}

#[tokio::test]
async fn rerunning_a_season_leaves_it_unchanged() {
    let mut db = memory_db();
    let config = config(2026);

    run_load_with(&config, Arc::new(GameLogOnly), &mut db).await.unwrap();
    let first = db.read_table(TEAM_GAME_LOGS).unwrap();
    assert_eq!(first.len(), 2);

    let reports = run_load_with(&config, Arc::new(GameLogOnly), &mut db).await.unwrap();
    let second = db.read_table(TEAM_GAME_LOGS).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        count(&db, "SELECT COUNT(1) FROM team_game_logs WHERE season = '2026'"),
        2
    );

    let report = &reports[0];
    let logs = report.tables.iter().find(|(name, _)| name == TEAM_GAME_LOGS).unwrap();
    assert_eq!(logs.1, 2);
    assert!(db.last_loaded(&ctx(2026)).unwrap().is_some());
}

#[tokio::test]
async fn other_seasons_survive_a_reload() {
    let mut db = memory_db();
    run_load_with(&config(2025), Arc::new(GameLogOnly), &mut db).await.unwrap();
    run_load_with(&config(2026), Arc::new(GameLogOnly), &mut db).await.unwrap();
    run_load_with(&config(2026), Arc::new(GameLogOnly), &mut db).await.unwrap();
    assert_eq!(count(&db, "SELECT COUNT(1) FROM team_game_logs"), 4);
}

#[tokio::test]
async fn no_flush_writes_the_same_rows() {
    let mut flushed = memory_db();
    run_load_with(&config(2026), Arc::new(GameLogOnly), &mut flushed).await.unwrap();

    let mut batched = memory_db();
    let mut once = config(2026);
    once.flush_per_phase = false;
    run_load_with(&once, Arc::new(GameLogOnly), &mut batched).await.unwrap();

    assert_eq!(
        flushed.read_table(TEAM_GAME_LOGS).unwrap(),
        batched.read_table(TEAM_GAME_LOGS).unwrap()
    );
}

#[tokio::test]
async fn held_partition_aborts_the_run() {
    let mut db = memory_db();
    db.acquire_lock(&ctx(2026), "other-loader", Duration::hours(6)).unwrap();

    let err = run_load_with(&config(2026), Arc::new(GameLogOnly), &mut db)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LoadError::Store(DbError::PartitionLocked { ref owner, .. }) if owner == "other-loader"
    ));
    assert!(!db.table_exists(TEAM_GAME_LOGS).unwrap());
}

#[tokio::test]
async fn lock_released_after_success() {
    let mut db = memory_db();
    let config = config(2026);
    run_load_with(&config, Arc::new(GameLogOnly), &mut db).await.unwrap();
    assert_eq!(count(&db, "SELECT COUNT(1) FROM _load_locks"), 0);
}

fn season_table(year: u16, columns: &[&str], rows: Vec<Vec<Value>>) -> Tables {
    let table = TableNormalizer::new(ctx(year)).normalize(RawTable::new("t", cols(columns), rows));
    let mut tables = Tables::new();
    tables.insert("t".to_string(), table);
    tables
}

#[test]
fn missing_destination_columns_are_null_filled() {
    let mut db = memory_db();
    db.write_tables_for_season(
        &season_table(2025, &["a", "b", "c"], vec![vec![json!(1), json!(2), json!(3)]]),
        &ctx(2025),
    )
    .unwrap();
    db.write_tables_for_season(
        &season_table(2026, &["a", "b"], vec![vec![json!(4), json!(5)]]),
        &ctx(2026),
    )
    .unwrap();

    let table = db.read_table("t").unwrap();
    assert_eq!(table.columns, cols(&["a", "b", "c", "season", "season_label", "season_type"]));
    assert_eq!(table.len(), 2);
    assert_eq!(table.rows[0][..4], [json!(1), json!(2), json!(3), json!("2025")]);
    assert_eq!(table.rows[1][..4], [json!(4), json!(5), Value::Null, json!("2026")]);
}

#[test]
fn unknown_incoming_columns_are_dropped() {
    let mut db = memory_db();
    db.write_tables_for_season(
        &season_table(2026, &["a", "b", "c"], vec![vec![json!(1), json!(2), json!(3)]]),
        &ctx(2026),
    )
    .unwrap();
    let outcomes = db
        .write_tables_for_season(
            &season_table(2026, &["a", "b", "d"], vec![vec![json!(7), json!(8), json!(9)]]),
            &ctx(2026),
        )
        .unwrap();

    assert_eq!(
        outcomes[0].1,
        WriteOutcome::Upserted {
            deleted: 1,
            inserted: 1,
            dropped_columns: vec!["d".to_string()],
        }
    );
    let table = db.read_table("t").unwrap();
    assert!(!table.has_column("d"));
    assert_eq!(table.rows, vec![vec![
        json!(7),
        json!(8),
        Value::Null,
        json!("2026"),
        json!("2025-26"),
        json!("Regular Season"),
    ]]);
}

#[test]
fn empty_write_never_deletes() {
    let mut db = memory_db();
    db.write_tables_for_season(
        &season_table(2026, &["a"], vec![vec![json!(1)]]),
        &ctx(2026),
    )
    .unwrap();
    let mut empty = Tables::new();
    empty.insert("t".to_string(), RawTable::empty("t"));
    let outcomes = db.write_tables_for_season(&empty, &ctx(2026)).unwrap();

    assert_eq!(outcomes[0].1, WriteOutcome::Skipped);
    assert_eq!(db.read_table("t").unwrap().len(), 1);
}
