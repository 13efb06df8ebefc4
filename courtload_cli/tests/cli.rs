use std::path::Path;
use std::process::{Command, Output};

use courtload_lib::{Db, RawTable};
use serde_json::{json, Value};

fn courtload(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_courtload"))
        .args(args)
        .env_remove("NBA_DB")
        .env_remove("NBA_EXPORT_DIR")
        .env("RUST_LOG", "off")
        .output()
        .expect("binary runs")
}

fn seed(path: &Path) {
    let mut db = Db::open(path).unwrap();
    db.init().unwrap();
    let table = RawTable::new(
        "team_game_logs",
        vec!["team_id".into(), "pts".into(), "season".into(), "season_type".into()],
        vec![
            vec![json!(1610612738), json!(117), json!("2026"), json!("Regular Season")],
            vec![json!(1610612752), json!(109), json!("2026"), json!("Regular Season")],
        ],
    );
    db.upsert_raw_table("team_game_logs", &table, "2026", "Regular Season")
        .unwrap();
    db.close().unwrap();
}

#[test]
fn status_reports_tables_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("warehouse.db");
    seed(&db);

    let out = courtload(&["status", "--db", db.to_str().unwrap(), "--output", "json"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let rows: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(rows[0]["Table"], "team_game_logs");
    assert_eq!(rows[0]["Rows"], 2);
    assert_eq!(rows[0]["Seasons"], "2026:2");
}

#[test]
fn status_without_warehouse_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.db");
    let out = courtload(&["status", "--db", missing.to_str().unwrap()]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("no warehouse"));
}

#[test]
fn export_writes_csv_files() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("warehouse.db");
    seed(&db);
    let target = dir.path().join("out");

    let out = courtload(&[
        "export",
        "--db",
        db.to_str().unwrap(),
        "--dir",
        target.to_str().unwrap(),
        "--format",
        "csv",
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let file = target.join("nba").join("raw").join("team_game_logs.csv");
    let body = std::fs::read_to_string(file).unwrap();
    assert!(body.starts_with("team_id,pts,season,season_type"));
}

#[test]
fn inverted_season_range_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("warehouse.db");
    let out = courtload(&[
        "load",
        "--db",
        db.to_str().unwrap(),
        "--start-season",
        "2026",
        "--end-season",
        "2020",
    ]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("must be <="));
    assert!(!db.exists(), "nothing opened before the arguments check out");
}
